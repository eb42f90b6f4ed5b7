use serde::{Deserialize, Serialize};

/// The kind of operation an [`AuditRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Install,
    Update,
    Uninstall,
    Scan,
    UnsafeBypass,
}

/// One append-only NDJSON audit line.
///
/// Written best-effort: a failure to persist an [`AuditRecord`] never fails
/// the primary operation it describes (see `zephyr_core::audit`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub session_id: String,
    pub actor: String,
    pub role: String,
    pub action: AuditAction,
    pub module: Option<String>,
    pub source: Option<String>,
    pub success: bool,
    pub reason: Option<String>,
    pub critical_count: usize,
    pub warning_count: usize,
}
