//! Trusted-module relaxations (spec.md §4.4): an allowlist of module
//! directory names exempt from specific pattern ids.

use serde::Deserialize;
use std::collections::HashMap;
use zephyr_schema::{Finding, Severity};

/// Built-in relaxations for modules whose own installers are well-known
/// `curl | sh` distributors.
pub fn builtin() -> HashMap<String, Vec<String>> {
    HashMap::from([(
        "oh-my-zsh".to_string(),
        vec!["rce.curl_pipe_shell".to_string(), "rce.wget_pipe_shell".to_string()],
    )])
}

#[derive(Debug, Deserialize, Default)]
struct TrustedModulesFile {
    #[serde(default)]
    trust: Vec<TrustedEntry>,
}

#[derive(Debug, Deserialize)]
struct TrustedEntry {
    module: String,
    #[serde(default)]
    exempt_patterns: Vec<String>,
}

/// Loads the user's `~/.zephyr/trusted_modules.toml` extension, merging it
/// on top of [`builtin`]. A missing or unparseable file yields just the
/// built-in table (never a hard error: this is a declarative relaxation
/// list, not load-bearing configuration).
#[must_use]
pub fn load(path: &std::path::Path) -> HashMap<String, Vec<String>> {
    let mut table = builtin();
    let Ok(text) = std::fs::read_to_string(path) else {
        return table;
    };
    let Ok(parsed) = toml::from_str::<TrustedModulesFile>(&text) else {
        tracing::warn!(path = %path.display(), "ignoring malformed trusted_modules.toml");
        return table;
    };
    for entry in parsed.trust {
        table.entry(entry.module).or_default().extend(entry.exempt_patterns);
    }
    table
}

/// Applies relaxations for `module_dir_name` to `findings`. A matched
/// critical finding whose pattern id is exempt for this exact module
/// directory name is downgraded to warning. Returns whether any relaxation
/// was applied (`trusted_module_applied`).
pub fn apply(table: &HashMap<String, Vec<String>>, module_dir_name: &str, findings: &mut [Finding]) -> bool {
    let Some(exempt) = table.get(module_dir_name) else {
        return false;
    };
    let mut applied = false;
    for finding in findings.iter_mut() {
        if finding.severity == Severity::Critical && exempt.iter().any(|id| id == &finding.pattern_id) {
            finding.severity = Severity::Warning;
            finding.description = format!("{} (downgraded: {module_dir_name} is a trusted module)", finding.description);
            applied = true;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn finding(pattern_id: &str, severity: Severity) -> Finding {
        Finding {
            severity,
            pattern_id: pattern_id.to_string(),
            description: "d".to_string(),
            file: PathBuf::from("f"),
            line: 1,
            snippet: String::new(),
            bypass_hint: None,
        }
    }

    #[test]
    fn oh_my_zsh_is_exempt_from_curl_pipe_shell() {
        let table = builtin();
        let mut findings = vec![finding("rce.curl_pipe_shell", Severity::Critical)];
        let applied = apply(&table, "oh-my-zsh", &mut findings);
        assert!(applied);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn relaxation_requires_exact_directory_name_match() {
        let table = builtin();
        let mut findings = vec![finding("rce.curl_pipe_shell", Severity::Critical)];
        let applied = apply(&table, "oh-my-zsh-fork", &mut findings);
        assert!(!applied);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn unrelated_pattern_is_not_downgraded() {
        let table = builtin();
        let mut findings = vec![finding("destructive.rm_rf_root", Severity::Critical)];
        let applied = apply(&table, "oh-my-zsh", &mut findings);
        assert!(!applied);
        assert_eq!(findings[0].severity, Severity::Critical);
    }
}
