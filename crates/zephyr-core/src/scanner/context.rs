//! Context-aware downgrades (spec.md §4.4): in well-known build-tooling
//! files, a bare `curl | sh` is one notch less alarming than the same line
//! in an arbitrary shell file, unless credentials are also involved.

const DOWNGRADE_FILENAMES: &[&str] = &["Makefile", "CMakeLists.txt", "build.sh", "Dockerfile", "package.json"];

/// Whether `filename` is a build-tooling file eligible for the downgrade.
#[must_use]
pub fn is_build_tooling_file(filename: &str) -> bool {
    DOWNGRADE_FILENAMES.contains(&filename)
}

/// Downgrades a `curl | sh`-family critical finding by one severity step
/// when it appears in a build-tooling file and the file has no credential
/// findings. Caller passes whether credentials were found in the same
/// file; this function only decides the downgrade, it does not scan.
#[must_use]
pub fn should_downgrade(filename: &str, pattern_id: &str, has_credential_finding: bool) -> bool {
    is_build_tooling_file(filename)
        && matches!(pattern_id, "rce.curl_pipe_shell" | "rce.wget_pipe_shell")
        && !has_credential_finding
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downgrades_curl_pipe_sh_in_dockerfile() {
        assert!(should_downgrade("Dockerfile", "rce.curl_pipe_shell", false));
    }

    #[test]
    fn does_not_downgrade_when_credentials_present() {
        assert!(!should_downgrade("Dockerfile", "rce.curl_pipe_shell", true));
    }

    #[test]
    fn does_not_downgrade_outside_build_tooling_files() {
        assert!(!should_downgrade("init.zsh", "rce.curl_pipe_shell", false));
    }
}
