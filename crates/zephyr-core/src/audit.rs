//! Append-only NDJSON audit log (spec.md §4.6): one line per mutating
//! operation at `$HOME/.zephyr/audit/operations/<YYYYMMDD>.log`, mode
//! 0600. Writes are best-effort — a failure to persist a record never
//! fails the primary operation, mirroring the teacher's "every mutation
//! gets a history row, but the row is never load-bearing for the mutation
//! itself" discipline.

use std::io::Write;
use zephyr_schema::AuditRecord;

/// Appends `record` as one NDJSON line to today's audit log under
/// `zephyr_home`. Logs (at `tracing::warn!`) and swallows any failure
/// opening or writing the file; callers should never propagate this as an
/// operation failure.
pub fn append(record: &AuditRecord) {
    let path = crate::paths::audit_log_path(chrono::Utc::now().date_naive());
    if let Err(err) = append_inner(&path, record) {
        tracing::warn!(path = %path.display(), error = %err, "failed to write audit record");
    }
}

fn append_inner(path: &std::path::Path, record: &AuditRecord) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut line = serde_json::to_string(record).map_err(std::io::Error::other)?;
    line.push('\n');

    let mut options = std::fs::OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(line.as_bytes())
}

/// Builds the timestamp field (RFC3339, UTC) used by every audit record.
#[must_use]
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use zephyr_schema::AuditAction;

    #[test]
    fn append_writes_one_ndjson_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("20260101.log");
        let record = AuditRecord {
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            session_id: "s1".to_string(),
            actor: "tester".to_string(),
            role: "user".to_string(),
            action: AuditAction::Scan,
            module: None,
            source: None,
            success: true,
            reason: None,
            critical_count: 0,
            warning_count: 0,
        };
        append_inner(&path, &record).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.trim_end().ends_with('}'));
    }

    #[test]
    fn append_is_truly_append_only() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("log.ndjson");
        let record = AuditRecord {
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            session_id: "s1".to_string(),
            actor: "tester".to_string(),
            role: "user".to_string(),
            action: AuditAction::Install,
            module: Some("foo".to_string()),
            source: Some("owner/foo".to_string()),
            success: true,
            reason: None,
            critical_count: 0,
            warning_count: 1,
        };
        append_inner(&path, &record).unwrap();
        append_inner(&path, &record).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
