//! Core engine for Zephyr, the shell-module loader.
//!
//! This crate provides the foundational logic for manifest parsing,
//! dependency graph resolution, shell script emission, security scanning,
//! and the git-backed install pipeline. It is designed to be consumed by a
//! CLI frontend without coupling to any particular terminal or shell.

/// Append-only audit log (spec.md §4.6).
pub mod audit;
/// Process-local module cache keyed by manifest path.
pub mod cache;
/// Cooperative cancellation for long-running scan/git operations.
pub mod deadline;
/// Shell script emission from a resolved module order.
pub mod emitter;
/// Module discovery, platform filtering and dependency resolution.
pub mod graph;
/// Git-backed install/update/uninstall pipeline.
pub mod install;
/// `module.toml` manifest parsing.
pub mod manifest;
/// Zephyr's on-disk directory layout (`~/.zephyr`, `~/.zsh/modules`, …).
pub mod paths;
/// Current-host platform detection and version comparison.
pub mod platform;
/// Security scanner: pattern/credential/reverse-shell/CI-CD detection.
pub mod scanner;
/// Git and HTTP transports backing the install pipeline.
pub mod transport;

pub use install::role::{ConfirmationHook, Role};
pub use install::source::parse as parse_install_source;
pub use install::{install, uninstall, update, InstallOptions, Installed};
pub use transport::{GitTransport, HttpTransport, USER_AGENT};

pub use zephyr_schema::error::ZephyrError;
