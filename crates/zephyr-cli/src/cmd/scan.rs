//! `zephyr scan`: scan a directory, a remote source (cloned into a throwaway
//! staging directory first), or a literal command string.

use crate::exit;
use std::path::Path;
use zephyr_core::install::{Cloned, InstallOptions};
use zephyr_core::transport::{Git2Transport, ReqwestTransport};
use zephyr_core::{deadline::Deadline, paths, scanner, Role};
use zephyr_schema::{InstallSource, ScanResult};

pub fn scan(source: &str, json: bool, pretty: bool) -> i32 {
    let path = Path::new(source);
    if path.is_dir() {
        return scan_directory(path, json, pretty);
    }

    match zephyr_core::parse_install_source(source) {
        Ok(InstallSource::LocalPath(_)) | Err(_) => scan_command(source, json, pretty),
        Ok(_) => scan_remote(source, json, pretty),
    }
}

fn scan_remote(source: &str, json: bool, pretty: bool) -> i32 {
    let git = Git2Transport;
    let http = ReqwestTransport::new();
    match Cloned::acquire(source, InstallOptions::default(), Role::User, &git, &http, Deadline::git_clone_default()) {
        Ok(cloned) => scan_directory(&cloned.staged_path, json, pretty),
        Err(err) => {
            eprintln!("zephyr: failed to fetch {source}: {err}");
            exit::SCAN_IO_OR_TIMEOUT
        }
    }
}

fn scan_directory(path: &Path, json: bool, pretty: bool) -> i32 {
    let deadline = Deadline::scan_default();
    let trusted = paths::trusted_modules_path();
    match scanner::scan_directory(path, deadline, &trusted) {
        Ok(result) => {
            print_result(&result, json, pretty);
            i32::from(result.exit_code_hint)
        }
        Err(err) => {
            eprintln!("zephyr: scan failed: {err}");
            exit::SCAN_IO_OR_TIMEOUT
        }
    }
}

fn scan_command(command: &str, json: bool, pretty: bool) -> i32 {
    let result = scanner::scan_command(command);
    print_result(&result, json, pretty);
    i32::from(result.policy_recommendation.command_mode_exit_code())
}

fn print_result(result: &ScanResult, json: bool, pretty: bool) {
    if json || pretty {
        let text = if pretty { serde_json::to_string_pretty(result) } else { serde_json::to_string(result) };
        match text {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("zephyr: failed to serialize scan result: {err}"),
        }
        return;
    }

    println!(
        "scanned {} file(s), {} line(s) in {}ms — {:?}",
        result.files_scanned, result.lines_scanned, result.duration_ms, result.policy_recommendation
    );
    for finding in &result.findings {
        println!(
            "  [{:?}] {} ({}:{}) {}",
            finding.severity,
            finding.pattern_id,
            finding.file.display(),
            finding.line,
            finding.description
        );
    }
}
