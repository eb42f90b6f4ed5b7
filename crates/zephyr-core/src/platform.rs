//! Current-host platform detection and the dotted-version comparator used
//! by `Platforms.min_version` matching.

/// The host OS token as Zephyr's manifests name it (`linux`, `darwin`, …).
#[must_use]
pub fn current_os() -> &'static str {
    if cfg!(target_os = "macos") {
        "darwin"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else {
        "unknown"
    }
}

/// The host CPU architecture token (`amd64`, `arm64`, …).
#[must_use]
pub fn current_arch() -> &'static str {
    if cfg!(target_arch = "x86_64") {
        "amd64"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        "unknown"
    }
}

/// Compares two dotted version strings segment by segment, numerically
/// where both segments parse as integers and lexicographically otherwise.
///
/// This is intentionally not semver: `Platforms.min_version` is a loose,
/// shell-version-style string (e.g. a zsh `$ZSH_VERSION`), not a package
/// version, and spec compliance calls for lexicographic dotted compare
/// rather than strict semver parsing.
#[must_use]
pub fn compare_dotted_version(current: &str, min: &str) -> std::cmp::Ordering {
    for (c, m) in current.split('.').zip(min.split('.')) {
        let ord = match (c.parse::<u64>(), m.parse::<u64>()) {
            (Ok(c), Ok(m)) => c.cmp(&m),
            _ => c.cmp(m),
        };
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
    }
    current.split('.').count().cmp(&min.split('.').count())
}

/// Whether `current` is greater than or equal to `min` under
/// [`compare_dotted_version`].
#[must_use]
pub fn version_at_least(current: &str, min: &str) -> bool {
    compare_dotted_version(current, min) != std::cmp::Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_segments_compare_numerically() {
        assert!(!version_at_least("5.9.0", "5.10.0"));
        assert!(version_at_least("5.10.0", "5.9.0"));
        assert!(version_at_least("5.9.0", "5.9.0"));
    }

    #[test]
    fn shorter_version_with_equal_prefix_is_smaller() {
        assert!(!version_at_least("5.9", "5.9.1"));
        assert!(version_at_least("5.9.1", "5.9"));
    }
}
