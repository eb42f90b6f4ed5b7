//! Install source parsing (spec.md §4.5 phase 1, §3): turns a CLI argument
//! string into a typed [`InstallSource`], rejecting anything that isn't
//! recognizably a git URL, GitHub shorthand, local path, or release asset
//! URL.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use zephyr_schema::InstallSource;

static SHORTHAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+/[\w.-]+$").expect("shorthand regex must compile"));

const ARCHIVE_EXTENSIONS: &[&str] = &[".tar.gz", ".tgz", ".zip", ".tar.xz", ".tar.zst"];

/// Parses a raw CLI argument into an [`InstallSource`].
///
/// # Errors
///
/// Returns the offending string (for wrapping in `ZephyrError::InvalidSource`)
/// if it matches none of the recognized shapes.
pub fn parse(raw: &str) -> Result<InstallSource, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(raw.to_string());
    }

    if let Some(path) = trimmed.strip_prefix("file://") {
        return Ok(InstallSource::LocalPath(PathBuf::from(path)));
    }
    if trimmed.starts_with('/') || trimmed.starts_with("./") || trimmed.starts_with("../") || trimmed.starts_with('~') {
        return Ok(InstallSource::LocalPath(PathBuf::from(trimmed)));
    }
    if let Some(rest) = trimmed.strip_prefix("git@") {
        if rest.contains(':') {
            return Ok(InstallSource::GitSsh(trimmed.to_string()));
        }
        return Err(raw.to_string());
    }
    if trimmed.starts_with("ssh://") {
        return Ok(InstallSource::GitSsh(trimmed.to_string()));
    }
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        let lower = trimmed.to_ascii_lowercase();
        if lower.ends_with(".git") || lower.contains("github.com") || lower.contains("gitlab.com") || lower.contains("bitbucket.org") {
            return Ok(InstallSource::GitHttps(trimmed.to_string()));
        }
        if ARCHIVE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return Ok(InstallSource::SignedRelease(trimmed.to_string()));
        }
        return Err(raw.to_string());
    }
    if SHORTHAND.is_match(trimmed) {
        let (owner, repo) = trimmed.split_once('/').expect("shorthand regex guarantees a slash");
        return Ok(InstallSource::GitHubShorthand {
            owner: owner.to_string(),
            repo: repo.to_string(),
        });
    }

    Err(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_github_shorthand() {
        assert_eq!(
            parse("zsh-users/zsh-autosuggestions").unwrap(),
            InstallSource::GitHubShorthand {
                owner: "zsh-users".to_string(),
                repo: "zsh-autosuggestions".to_string()
            }
        );
    }

    #[test]
    fn parses_git_https_url() {
        assert_eq!(
            parse("https://github.com/zsh-users/zsh-autosuggestions.git").unwrap(),
            InstallSource::GitHttps("https://github.com/zsh-users/zsh-autosuggestions.git".to_string())
        );
    }

    #[test]
    fn parses_git_ssh_url() {
        assert!(matches!(parse("git@github.com:zsh-users/zsh-autosuggestions.git"), Ok(InstallSource::GitSsh(_))));
    }

    #[test]
    fn parses_local_path() {
        assert_eq!(parse("./my-module").unwrap(), InstallSource::LocalPath(PathBuf::from("./my-module")));
    }

    #[test]
    fn parses_signed_release_archive_url() {
        assert!(matches!(parse("https://example.com/releases/mod-1.0.0.tar.gz"), Ok(InstallSource::SignedRelease(_))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("not a url at all!!").is_err());
        assert!(parse("").is_err());
    }
}
