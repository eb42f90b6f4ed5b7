use crate::types::ModuleName;
use std::path::PathBuf;

/// Platform compatibility constraints for a module.
///
/// Empty collections mean "any". See `zephyr_core::platform` for the
/// matching rules applied against the current host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Platforms {
    pub os: Vec<String>,
    pub arch: Vec<String>,
    pub shell: Option<String>,
    pub min_version: Option<String>,
}

/// Optional lifecycle hook function names, called by name from the emitted
/// shell script (never invoked directly by Zephyr itself).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hooks {
    pub pre_load: Option<String>,
    pub post_load: Option<String>,
}

/// A fully parsed module manifest, anchored to the directory it was
/// discovered in.
///
/// Every field is independently owned: cloning a `Module` produces fully
/// independent storage, with no shared string data between the original and
/// the clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: ModuleName,
    pub version: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
    pub required_deps: Vec<ModuleName>,
    pub optional_deps: Vec<ModuleName>,
    pub platforms: Platforms,
    pub priority: i64,
    pub files: Vec<String>,
    pub hooks: Hooks,
    pub settings: Vec<(String, String)>,
    pub path: PathBuf,
}

impl Module {
    /// Default priority when a module's `[load]` section omits one, or the
    /// value fails to parse as a plain decimal integer.
    pub const DEFAULT_PRIORITY: i64 = 100;

    /// Default version string when a module's `[module]` section omits one.
    pub const DEFAULT_VERSION: &'static str = "0.0.0";
}
