/// Where an install/update operation fetches a module from.
///
/// Created by the CLI's source parser and consumed by the install pipeline;
/// it does not outlive a single install/update invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSource {
    GitHttps(String),
    GitSsh(String),
    GitHubShorthand { owner: String, repo: String },
    LocalPath(std::path::PathBuf),
    SignedRelease(String),
}

impl InstallSource {
    /// Best-effort display form used in audit records and error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::GitHttps(url) | Self::GitSsh(url) | Self::SignedRelease(url) => url.clone(),
            Self::GitHubShorthand { owner, repo } => format!("{owner}/{repo}"),
            Self::LocalPath(path) => path.display().to_string(),
        }
    }

    /// Whether the source requires a signature-verification path
    /// (`agent` callers may never use this source per the role gate).
    #[must_use]
    pub fn is_signed_release(&self) -> bool {
        matches!(self, Self::SignedRelease(_))
    }
}
