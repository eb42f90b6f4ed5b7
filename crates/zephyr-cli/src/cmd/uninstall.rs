//! `zephyr uninstall`: remove an installed module.

use crate::cmd::confirm::TerminalConfirm;
use crate::cmd::install::session_id;
use crate::exit;
use zephyr_core::{install, paths};

pub fn uninstall(name: &str, force: bool, yes: bool) -> i32 {
    let role = install::role::current_role(&paths::security_config_path());
    let session_id = session_id();
    let confirm = TerminalConfirm;

    match install::uninstall(name, force, yes, Some(&confirm), &paths::modules_dir(), role, &session_id) {
        Ok(()) => {
            println!("uninstalled {name}");
            exit::OK
        }
        Err(err) => {
            eprintln!("zephyr: uninstall failed: {err}");
            exit::from_error(&err)
        }
    }
}
