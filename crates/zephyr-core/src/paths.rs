use dirs::home_dir;
use std::path::PathBuf;

/// Returns the directory modules are discovered and installed into, or
/// `None` if the user's home cannot be resolved and `ZSH_MODULES_DIR` is
/// unset.
pub fn try_modules_dir() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("ZSH_MODULES_DIR") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".zsh").join("modules"))
}

/// Returns the canonical modules directory (`~/.zsh/modules`).
///
/// # Panics
///
/// Panics if neither `ZSH_MODULES_DIR` is set nor the user's home directory
/// can be resolved.
pub fn modules_dir() -> PathBuf {
    try_modules_dir().expect("Could not determine modules directory. Set ZSH_MODULES_DIR to override.")
}

/// Returns Zephyr's own config/state home, or `None` if unresolvable.
pub fn try_zephyr_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("ZEPHYR_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".zephyr"))
}

/// Returns the canonical Zephyr home directory (`~/.zephyr`).
///
/// # Panics
///
/// Panics if neither `ZEPHYR_HOME` is set nor the user's home directory can
/// be resolved.
pub fn zephyr_home() -> PathBuf {
    try_zephyr_home().expect("Could not determine home directory. Set ZEPHYR_HOME to override.")
}

/// Audit log directory: `~/.zephyr/audit/operations`
pub fn audit_dir() -> PathBuf {
    zephyr_home().join("audit").join("operations")
}

/// Today's audit log file: `~/.zephyr/audit/operations/<YYYYMMDD>.log`
pub fn audit_log_path(today: chrono::NaiveDate) -> PathBuf {
    audit_dir().join(format!("{}.log", today.format("%Y%m%d")))
}

/// User extension of the trusted-module allowlist:
/// `~/.zephyr/trusted_modules.toml`
pub fn trusted_modules_path() -> PathBuf {
    zephyr_home().join("trusted_modules.toml")
}

/// Role/security policy config: `~/.zephyr/security.toml`
pub fn security_config_path() -> PathBuf {
    zephyr_home().join("security.toml")
}

/// Scratch directory for clone-without-checkout staging.
///
/// Lives alongside `modules_dir()` (as a sibling, not a child) rather than
/// under `zephyr_home()`: the atomic move in the install pipeline's final
/// phase is a same-filesystem rename into `modules_dir()`, which only
/// `rename(2)` guarantees when source and destination share a volume.
pub fn tmp_path() -> PathBuf {
    let modules = modules_dir();
    modules
        .parent()
        .map_or_else(|| modules.join(".zephyr-tmp"), |p| p.join(".zephyr-tmp"))
}
