use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity of a scanner finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// A single pattern match recorded during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub pattern_id: String,
    pub description: String,
    pub file: PathBuf,
    pub line: usize,
    pub snippet: String,
    pub bypass_hint: Option<String>,
}

/// The scanner's overall recommendation to the install pipeline (or CLI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyRecommendation {
    Allow,
    Warn,
    Block,
}

impl PolicyRecommendation {
    /// Computes the recommendation from a set of findings.
    ///
    /// `block` iff any finding is critical; `warn` iff there is no critical
    /// finding but at least one warning; `allow` otherwise. This is a pure
    /// function of severities and must stay in lockstep with
    /// [`PolicyRecommendation::exit_code_hint`].
    #[must_use]
    pub fn from_findings(findings: &[Finding]) -> Self {
        if findings.iter().any(|f| f.severity == Severity::Critical) {
            Self::Block
        } else if findings.iter().any(|f| f.severity == Severity::Warning) {
            Self::Warn
        } else {
            Self::Allow
        }
    }

    /// Exit code for the default (directory/URL) scan mode: `allow`→0,
    /// `warn`→1, `block`→2.
    #[must_use]
    pub fn exit_code_hint(self) -> u8 {
        match self {
            Self::Allow => 0,
            Self::Warn => 1,
            Self::Block => 2,
        }
    }

    /// Exit code for command-mode scans, which documents an intentionally
    /// inverted mapping relative to [`PolicyRecommendation::exit_code_hint`]
    /// so a caller can `if zephyr scan "$cmd"; then …` without extra
    /// negation: `block`→1, `warn`→2, `allow`→0.
    #[must_use]
    pub fn command_mode_exit_code(self) -> u8 {
        match self {
            Self::Block => 1,
            Self::Warn => 2,
            Self::Allow => 0,
        }
    }
}

/// The result of scanning a directory tree or a single command string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub schema_version: String,
    pub files_scanned: usize,
    pub lines_scanned: usize,
    pub duration_ms: u64,
    pub findings: Vec<Finding>,
    pub credential_findings: Vec<Finding>,
    pub reverse_shell_findings: Vec<Finding>,
    pub cicd_findings: Vec<Finding>,
    pub trusted_module_applied: bool,
    pub policy_recommendation: PolicyRecommendation,
    pub exit_code_hint: u8,
}

impl ScanResult {
    /// Current `schema_version` emitted in `scan --json` output.
    pub const SCHEMA_VERSION: &'static str = "1.0";

    /// Sorts `findings` by `(severity desc, file asc, line asc)`, the order
    /// mandated for deterministic scanner output.
    pub fn sort_findings(findings: &mut [Finding]) {
        findings.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.file.cmp(&b.file))
                .then_with(|| a.line.cmp(&b.line))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding {
            severity,
            pattern_id: "test".into(),
            description: String::new(),
            file: PathBuf::from("f"),
            line: 1,
            snippet: String::new(),
            bypass_hint: None,
        }
    }

    #[test]
    fn policy_is_pure_function_of_severities() {
        assert_eq!(
            PolicyRecommendation::from_findings(&[]),
            PolicyRecommendation::Allow
        );
        assert_eq!(
            PolicyRecommendation::from_findings(&[finding(Severity::Info)]),
            PolicyRecommendation::Allow
        );
        assert_eq!(
            PolicyRecommendation::from_findings(&[finding(Severity::Warning)]),
            PolicyRecommendation::Warn
        );
        assert_eq!(
            PolicyRecommendation::from_findings(&[finding(Severity::Warning), finding(Severity::Critical)]),
            PolicyRecommendation::Block
        );
    }

    #[test]
    fn command_mode_mapping_is_inverted() {
        assert_eq!(PolicyRecommendation::Block.exit_code_hint(), 2);
        assert_eq!(PolicyRecommendation::Block.command_mode_exit_code(), 1);
        assert_eq!(PolicyRecommendation::Warn.exit_code_hint(), 1);
        assert_eq!(PolicyRecommendation::Warn.command_mode_exit_code(), 2);
        assert_eq!(PolicyRecommendation::Allow.exit_code_hint(), 0);
        assert_eq!(PolicyRecommendation::Allow.command_mode_exit_code(), 0);
    }
}
