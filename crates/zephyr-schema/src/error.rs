use std::path::PathBuf;

/// Manifest Parser failures. Never fatal to discovery: a module whose
/// manifest fails to parse is dropped with a recoverable warning.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("manifest not found: {0}")]
    FileNotFound(PathBuf),
    #[error("failed to read manifest {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed manifest syntax in {path} at line {line}: {detail}")]
    TomlParseError {
        path: PathBuf,
        line: usize,
        detail: String,
    },
    #[error("invalid manifest schema in {path}: {0}", path = .path.display())]
    InvalidSchema { path: PathBuf, reason: String },
}

/// Module Graph Builder failures. Fatal to the `resolve` call that raised
/// them; always carries the complete set of offending members, never just
/// the first one found.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("missing required dependencies: {}", format_missing(.0))]
    MissingRequiredDep(Vec<MissingDep>),
    #[error("circular dependency among: {}", .0.join(", "))]
    CircularDep(Vec<String>),
}

fn format_missing(deps: &[MissingDep]) -> String {
    deps.iter()
        .map(|d| format!("{} -> {}", d.module, d.dep))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One unresolved required dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDep {
    pub module: String,
    pub dep: String,
}

/// Security Scanner failures. Unlike a policy verdict, these mean no
/// findings can be trusted at all.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("I/O error scanning {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("scan deadline exceeded after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
    #[error("too many files under scan root (limit {limit}, found at least {found})")]
    TooManyFiles { limit: usize, found: usize },
}

/// Reasons the Install Pipeline's policy gate refuses to proceed.
#[derive(thiserror::Error, Debug)]
pub enum PolicyBlock {
    #[error("scan found {critical} critical finding(s); blocking install")]
    CriticalFindings { critical: usize },
    #[error("scan found {warning} warning(s); confirmation required but unavailable")]
    WarningsRequireConfirmation { warning: usize },
    #[error("agent role may not {action}")]
    AgentForbidden { action: String },
}

/// Narrow git transport failures.
#[derive(thiserror::Error, Debug)]
pub enum GitError {
    #[error("clone failed for {url}: {detail}")]
    CloneFailed { url: String, detail: String },
    #[error("fetch failed for {url}: {detail}")]
    FetchFailed { url: String, detail: String },
    #[error("pull failed for {url}: {detail}")]
    PullFailed { url: String, detail: String },
    #[error("reset failed: {detail}")]
    ResetFailed { detail: String },
    #[error("invalid git URL: {0}")]
    InvalidUrl(String),
}

/// Filesystem failures surfaced by install/uninstall.
#[derive(thiserror::Error, Debug)]
pub enum FSError {
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("target already exists: {0}")]
    TargetExists(PathBuf),
    #[error("failed to move {from} to {to}: {detail}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        detail: String,
    },
}

/// Top-level error returned by `zephyr-core` operations, unifying every leaf
/// error family. Library callers match on this value directly; the CLI
/// layer is the only place that further translates it to exit codes.
#[derive(thiserror::Error, Debug)]
pub enum ZephyrError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Policy(#[from] PolicyBlock),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Fs(#[from] FSError),
    #[error("invalid install source: {0}")]
    InvalidSource(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
