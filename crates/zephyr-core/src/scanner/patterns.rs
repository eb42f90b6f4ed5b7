//! The core pattern table: RCE/download-execute, destructive ops, insecure
//! transport, and obfuscation families. Credentials, reverse shells, and
//! CI/CD manipulation are separate detectors (`scanner::credentials`,
//! `scanner::reverse_shell`, `scanner::cicd`) because they need more
//! context than a single regex match.

use regex::Regex;
use std::sync::LazyLock;
use zephyr_schema::Severity;

/// A coupling rule: if `partner_id` also fired in the same file, this
/// pattern's finding is escalated to `target`.
pub struct Escalation {
    pub partner_id: &'static str,
    pub target: Severity,
}

/// One compiled detection rule.
pub struct Pattern {
    pub id: &'static str,
    pub regex: LazyLock<Regex>,
    pub severity: Severity,
    pub description: &'static str,
    /// Coupling partners that escalate this pattern's severity when also
    /// present in the same file (see `scanner::coupling`).
    pub escalates_with: &'static [Escalation],
}

macro_rules! pattern {
    ($id:expr, $re:expr, $severity:expr, $description:expr $(, escalates_with: $esc:expr)? $(,)?) => {
        Pattern {
            id: $id,
            regex: LazyLock::new(|| Regex::new($re).expect("static pattern regex must compile")),
            severity: $severity,
            description: $description,
            escalates_with: pattern!(@esc $($esc)?),
        }
    };
    (@esc) => { &[] };
    (@esc $esc:expr) => { $esc };
}

/// The full declaration-ordered table of core patterns. Declaration order
/// is the order patterns are matched against each line (spec.md §5).
pub static TABLE: &[Pattern] = &[
    // --- RCE / download-and-execute (critical) ---
    pattern!(
        "rce.curl_pipe_shell",
        r"curl\s+[^|]*\|\s*(bash|sh|zsh)\b",
        Severity::Critical,
        "downloads and pipes remote content directly into a shell"
    ),
    pattern!(
        "rce.wget_pipe_shell",
        r"wget\s+[^|]*\|\s*(bash|sh|zsh)\b",
        Severity::Critical,
        "downloads and pipes remote content directly into a shell"
    ),
    pattern!(
        "rce.eval_curl",
        r#"eval\s*"\$\(curl"#,
        Severity::Critical,
        "evaluates the output of a remote curl fetch"
    ),
    pattern!(
        "rce.process_substitution_curl",
        r"<\(curl[^)]*\)",
        Severity::Critical,
        "sources remote content via process substitution"
    ),

    // --- Destructive ops (critical) ---
    pattern!(
        "destructive.rm_rf_root",
        r"rm\s+-rf?\s+/(\s|$)",
        Severity::Critical,
        "recursively removes the filesystem root"
    ),
    pattern!(
        "destructive.dd_raw_write",
        r"dd\s+if=",
        Severity::Critical,
        "writes raw blocks to a device, can destroy data irrecoverably"
    ),
    pattern!(
        "destructive.fork_bomb",
        r":\(\)\s*\{\s*:\|\:&\s*\};\s*:",
        Severity::Critical,
        "a fork bomb that will exhaust process table resources"
    ),

    // --- Insecure transport (warning; escalated by coupling) ---
    pattern!(
        "transport.curl_http",
        r"curl\s+http://",
        Severity::Warning,
        "fetches content over plaintext HTTP",
        escalates_with: &[
            Escalation { partner_id: "rce.curl_pipe_shell", target: Severity::Critical },
            Escalation { partner_id: "transport.install_sh_execute", target: Severity::Critical },
        ],
    ),
    pattern!(
        "transport.wget_http",
        r"wget\s+http://",
        Severity::Warning,
        "fetches content over plaintext HTTP",
        escalates_with: &[
            Escalation { partner_id: "rce.wget_pipe_shell", target: Severity::Critical },
            Escalation { partner_id: "transport.install_sh_execute", target: Severity::Critical },
        ],
    ),
    pattern!(
        "transport.install_sh_execute",
        r">\s*install\.sh\s*;.*\bsh\s+install\.sh",
        Severity::Info,
        "downloads a script to disk and separately executes it",
    ),

    // --- Obfuscation (critical) ---
    pattern!(
        "obfuscation.base64_pipe_shell",
        r"base64\s+-d\s*\|\s*(bash|sh|zsh)\b",
        Severity::Critical,
        "decodes base64 content and pipes it directly into a shell"
    ),
    pattern!(
        "obfuscation.base64_decode",
        r"base64\s+-d\b",
        Severity::Info,
        "decodes base64 content",
        escalates_with: &[
            Escalation { partner_id: "obfuscation.eval_generic", target: Severity::Critical },
        ],
    ),
    pattern!(
        "obfuscation.eval_generic",
        r"\beval\b",
        Severity::Info,
        "evaluates dynamically constructed content",
    ),
    pattern!(
        "obfuscation.hex_escape_chain",
        r"(?:\\x[0-9a-fA-F]{2}){8,}",
        Severity::Critical,
        "a long chain of hex-escaped bytes, typical of obfuscated payloads"
    ),
];

/// Escalation rules for detectors with no regex entry in `TABLE`
/// (`scanner::credentials`, which matches paths/tokens rather than a single
/// pattern regex) but that still escalate when an RCE or outbound-transport
/// pattern fires elsewhere in the same file (spec.md §4.4.3).
pub static DETECTOR_ESCALATIONS: &[(&str, &[Escalation])] = &[(
    super::credentials::PATTERN_ID,
    &[
        Escalation { partner_id: "rce.curl_pipe_shell", target: Severity::Critical },
        Escalation { partner_id: "rce.wget_pipe_shell", target: Severity::Critical },
        Escalation { partner_id: "rce.eval_curl", target: Severity::Critical },
        Escalation { partner_id: "rce.process_substitution_curl", target: Severity::Critical },
        Escalation { partner_id: "transport.curl_http", target: Severity::Critical },
        Escalation { partner_id: "transport.wget_http", target: Severity::Critical },
        Escalation { partner_id: "transport.install_sh_execute", target: Severity::Critical },
    ],
)];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_compiles() {
        for p in TABLE {
            let _ = &*p.regex;
        }
    }

    #[test]
    fn curl_pipe_bash_matches() {
        let p = TABLE.iter().find(|p| p.id == "rce.curl_pipe_shell").unwrap();
        assert!(p.regex.is_match("curl https://example.com/install.sh | bash"));
    }

    #[test]
    fn fork_bomb_matches_canonical_form() {
        let p = TABLE.iter().find(|p| p.id == "destructive.fork_bomb").unwrap();
        assert!(p.regex.is_match(":(){ :|:& };:"));
    }
}
