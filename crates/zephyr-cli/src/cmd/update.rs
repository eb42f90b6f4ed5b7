//! `zephyr update`: fetch and re-validate an installed module, or every
//! installed module when no name is given.

use crate::cmd::confirm::TerminalConfirm;
use crate::cmd::install::session_id;
use crate::exit;
use crate::InstallFlags;
use zephyr_core::cache::ModuleCache;
use zephyr_core::transport::Git2Transport;
use zephyr_core::{graph, install, paths};

pub fn update(name: Option<&str>, flags: InstallFlags) -> i32 {
    let role = install::role::current_role(&paths::security_config_path());
    let session_id = session_id();
    let options = install::InstallOptions {
        force: flags.force,
        local: flags.local,
        unsafe_: flags.unsafe_,
        yes: flags.yes,
    };
    let confirm = TerminalConfirm;
    let git = Git2Transport;
    let modules_dir = paths::modules_dir();
    let trusted = paths::trusted_modules_path();

    let names: Vec<String> = match name {
        Some(n) => vec![n.to_string()],
        None => {
            let cache = ModuleCache::new(zephyr_core::cache::DEFAULT_CAPACITY);
            graph::discover(&modules_dir, &cache).into_iter().map(|m| m.name.to_string()).collect()
        }
    };

    if names.is_empty() {
        println!("no modules installed");
        return exit::OK;
    }

    let mut had_failure = false;
    for n in &names {
        match install::update(n, options, role, Some(&confirm), &git, &modules_dir, &trusted, &session_id) {
            Ok(updated) => println!("updated {}", updated.module_name),
            Err(err) => {
                had_failure = true;
                eprintln!("zephyr: update {n} failed: {err}");
            }
        }
    }

    if had_failure { exit::FAILURE } else { exit::OK }
}
