//! zephyr - a shell-module loader with a built-in security scanner.
//!
//! Discovers user-authored modules, resolves their dependency graph, and
//! emits sourcing instructions for zsh/bash. Modules fetched from git are
//! cloned into an isolated staging directory and scanned for dangerous
//! patterns before anything is written into the live module tree.

#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cmd;
/// Exit code mapping shared by every subcommand (spec.md §6).
pub mod exit;
/// `tracing` subscriber setup driven by `ZEPHYR_DEBUG`/`ZEPHYR_VERBOSE`.
pub mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shared install/update flags.
#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct InstallFlags {
    /// Replace an existing module directory of the same name.
    #[arg(long)]
    pub force: bool,
    /// Treat `source` as a local directory rather than a remote URL.
    #[arg(long)]
    pub local: bool,
    /// Proceed even if the security scan recommends blocking.
    #[arg(long = "unsafe")]
    pub unsafe_: bool,
    /// Skip interactive confirmation prompts.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Parser)]
#[command(name = "zephyr")]
#[command(author, version, about = "Shell-module loader with a built-in security scanner")]
pub struct Cli {
    /// Enable verbose (info-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    pub debug: bool,
    /// Enable trace-level logging.
    #[arg(long, global = true)]
    pub trace: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
    /// Target shell for emission and platform filtering.
    #[arg(long, global = true, value_enum, default_value_t = ShellArg::Zsh)]
    pub shell: ShellArg,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// `--shell` value, mirrored onto [`zephyr_core::emitter::Shell`] and the
/// platform filter's shell token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ShellArg {
    Zsh,
    Bash,
}

impl ShellArg {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zsh => "zsh",
            Self::Bash => "bash",
        }
    }

    #[must_use]
    pub fn to_emitter_shell(self) -> zephyr_core::emitter::Shell {
        match self {
            Self::Zsh => zephyr_core::emitter::Shell::Zsh,
            Self::Bash => zephyr_core::emitter::Shell::Bash,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover, resolve and emit sourcing instructions (the default).
    Load,
    /// List discovered modules and their platform compatibility.
    List {
        /// Emit machine-readable JSON (compact).
        #[arg(long)]
        json: bool,
        /// Emit machine-readable JSON (pretty-printed).
        #[arg(long)]
        pretty: bool,
        /// Only show modules whose name contains this substring.
        #[arg(long)]
        filter: Option<String>,
        /// Emit the dependency graph instead, in the given format.
        #[arg(long)]
        graph: Option<String>,
    },
    /// Parse and resolve the module graph without emitting anything.
    Validate,
    /// Scaffold a new module directory (out of scope: interface only).
    Init {
        /// Name of the new module.
        name: String,
    },
    /// Scan a directory, URL, or command string for dangerous patterns.
    Scan {
        /// A directory path, or (if it doesn't resolve to one) a literal
        /// command string to scan in command mode.
        source: String,
        /// Emit machine-readable JSON (compact).
        #[arg(long)]
        json: bool,
        /// Emit machine-readable JSON (pretty-printed).
        #[arg(long)]
        pretty: bool,
    },
    /// Clone, scan, validate and install a module.
    Install {
        /// Git URL, `owner/repo` shorthand, or local path.
        source: String,
        #[command(flatten)]
        flags: InstallFlags,
    },
    /// Fetch and re-validate an already-installed module.
    Update {
        /// Module name; omit to update every installed module.
        name: Option<String>,
        #[command(flatten)]
        flags: InstallFlags,
    },
    /// Remove an installed module.
    Uninstall {
        /// Module name.
        name: String,
        /// Remove even if other modules depend on it.
        #[arg(long)]
        force: bool,
        /// Skip the interactive confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Print the index-signing public key (out of scope: interface only).
    ShowSigningKey,
    /// Verify a signed release artifact (out of scope: interface only).
    Verify {
        /// Path to the artifact to verify.
        path: PathBuf,
    },
}
