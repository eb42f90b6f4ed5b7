//! Shared types and error taxonomy for Zephyr, the shell-module loader.
//!
//! This crate defines the data structures that cross component boundaries:
//! the parsed `Module` record, the dependency graph's error types, scan
//! results and findings, install sources, and audit records. `zephyr-core`
//! and `zephyr-cli` both depend on it; it has no dependency on either.

/// Append-only audit log record shape.
pub mod audit;
/// Error taxonomy shared by every component (§7).
pub mod error;
/// Where an install/update fetches a module from.
pub mod install;
/// The parsed module manifest record.
pub mod module;
/// Scan findings and the policy-recommendation verdict.
pub mod scan;
/// Validated identifiers (module names).
pub mod types;

pub use audit::{AuditAction, AuditRecord};
pub use error::{FSError, GitError, GraphError, MissingDep, ParseError, PolicyBlock, ScanError, ZephyrError};
pub use install::InstallSource;
pub use module::{Hooks, Module, Platforms};
pub use scan::{Finding, PolicyRecommendation, ScanResult, Severity};
pub use types::{InvalidModuleName, ModuleName};
