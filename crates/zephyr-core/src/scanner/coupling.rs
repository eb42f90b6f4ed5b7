//! Pattern coupling: some findings escalate to a specific severity when a
//! "partner" pattern also fired somewhere in the same file.

use super::patterns::{DETECTOR_ESCALATIONS, Escalation, TABLE};
use std::collections::HashSet;
use zephyr_schema::Finding;

/// Looks up the escalation partners declared for `pattern_id`, whether it
/// lives in the core regex `TABLE` or is a detector-only id registered in
/// `DETECTOR_ESCALATIONS` (credentials, reverse shell, CI/CD findings have
/// no regex entry in `TABLE`).
fn escalates_with(pattern_id: &str) -> &'static [Escalation] {
    if let Some(pattern) = TABLE.iter().find(|p| p.id == pattern_id) {
        return pattern.escalates_with;
    }
    DETECTOR_ESCALATIONS
        .iter()
        .find(|(id, _)| *id == pattern_id)
        .map_or(&[], |(_, escalations)| *escalations)
}

/// Applies per-file coupling rules to `findings`, which must all come from
/// the same file. Findings whose pattern declares an escalation partner
/// present elsewhere in the same file are raised to that partner's target
/// severity and annotated.
pub fn apply(findings: &mut [Finding]) {
    let present: HashSet<&str> = findings.iter().map(|f| f.pattern_id.as_str()).collect();

    for finding in findings.iter_mut() {
        let escalation = escalates_with(finding.pattern_id.as_str())
            .iter()
            .filter(|e| present.contains(e.partner_id))
            .max_by_key(|e| e.target);
        if let Some(escalation) = escalation {
            if escalation.target > finding.severity {
                finding.description = format!(
                    "{} (escalated: coupled with {} in the same file)",
                    finding.description, escalation.partner_id
                );
                finding.severity = escalation.target;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use zephyr_schema::Severity;

    fn finding(id: &str, severity: Severity) -> Finding {
        Finding {
            severity,
            pattern_id: id.to_string(),
            description: "d".to_string(),
            file: PathBuf::from("f"),
            line: 1,
            snippet: String::new(),
            bypass_hint: None,
        }
    }

    #[test]
    fn curl_http_escalates_when_coupled_with_pipe_bash() {
        let mut findings = vec![
            finding("transport.curl_http", Severity::Warning),
            finding("rce.curl_pipe_shell", Severity::Critical),
        ];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn curl_http_alone_stays_warning() {
        let mut findings = vec![finding("transport.curl_http", Severity::Warning)];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn base64_decode_alone_stays_info() {
        let mut findings = vec![finding("obfuscation.base64_decode", Severity::Info)];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn base64_decode_escalates_to_critical_with_eval() {
        let mut findings = vec![
            finding("obfuscation.base64_decode", Severity::Info),
            finding("obfuscation.eval_generic", Severity::Info),
        ];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn credential_read_escalates_when_rce_fires_elsewhere_in_file() {
        let mut findings = vec![
            finding("credentials.read_access", Severity::Warning),
            finding("rce.wget_pipe_shell", Severity::Critical),
        ];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn credential_read_alone_stays_warning() {
        let mut findings = vec![finding("credentials.read_access", Severity::Warning)];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Warning);
    }
}
