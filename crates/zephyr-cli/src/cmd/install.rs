//! `zephyr install`: clone, scan, validate and install a module.

use crate::cmd::confirm::TerminalConfirm;
use crate::exit;
use crate::InstallFlags;
use zephyr_core::transport::{Git2Transport, ReqwestTransport};
use zephyr_core::{install, paths};

pub fn install(source: &str, flags: InstallFlags) -> i32 {
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
    let http = ReqwestTransport::new();

    // `--local` forces the ambiguous shorthand/relative forms `source::parse`
    // would otherwise read as a git source to resolve as a local directory.
    let normalized = if flags.local && !source.starts_with("./") && !source.starts_with('/') && !source.starts_with('~') {
        format!("./{source}")
    } else {
        source.to_string()
    };

    match install::install(
        &normalized,
        options,
        role,
        Some(&confirm),
        &git,
        &http,
        &paths::modules_dir(),
        &paths::trusted_modules_path(),
        &session_id,
    ) {
        Ok(installed) => {
            println!("installed {} at {}", installed.module_name, installed.path.display());
            exit::OK
        }
        Err(err) => {
            eprintln!("zephyr: install failed: {err}");
            exit::from_error(&err)
        }
    }
}

/// Process-local session identifier for audit records: `ZEPHYR_SESSION_ID`
/// if set, else the OS process id.
pub fn session_id() -> String {
    std::env::var("ZEPHYR_SESSION_ID").unwrap_or_else(|_| std::process::id().to_string())
}
