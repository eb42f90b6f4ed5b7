//! Git and HTTP transports (spec.md §5): narrow, mockable traits plus
//! synchronous implementations backed by `git2` and `reqwest`'s blocking
//! client. Zephyr has no async runtime — long-running operations are
//! cooperatively cancelled via [`crate::deadline::Deadline`] checked inside
//! each transport's progress callback, the same suspension points the
//! teacher's async download pipeline checked at `.await` points.

use crate::deadline::Deadline;
use std::path::Path;
use zephyr_schema::GitError;

pub const USER_AGENT: &str = concat!("zephyr/", env!("CARGO_PKG_VERSION"));

/// Narrow surface the install pipeline needs from a git implementation,
/// so tests can substitute an in-memory fake instead of touching the
/// network or the filesystem.
pub trait GitTransport {
    /// Clones `url` into `dest` without checking out a working tree
    /// (`--no-checkout`): the install pipeline scans the object database
    /// before any file is written.
    fn clone_no_checkout(&self, url: &str, dest: &Path, deadline: Deadline) -> Result<(), GitError>;

    /// Checks out `HEAD` (or the repository's default branch) into the
    /// already-cloned working tree at `dest`.
    fn checkout_head(&self, dest: &Path) -> Result<(), GitError>;

    /// Fetches and fast-forwards `dest` to the remote's default branch.
    fn pull(&self, dest: &Path, deadline: Deadline) -> Result<(), GitError>;

    /// Hard-resets `dest` to the remote's current `HEAD`, discarding local
    /// changes (used by `update --force`).
    fn reset_hard_to_remote_head(&self, dest: &Path) -> Result<(), GitError>;

    /// The current `HEAD` commit hash at `dest`.
    fn head_hash(&self, dest: &Path) -> Result<String, GitError>;
}

/// Real implementation backed by `git2` (libgit2 bindings), synchronous by
/// construction: there is no tokio runtime in Zephyr to drive an async
/// transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Transport;

impl Git2Transport {
    fn build_fetch_options(deadline: Deadline) -> git2::FetchOptions<'static> {
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.transfer_progress(move |_progress| !deadline.expired());
        let mut opts = git2::FetchOptions::new();
        opts.remote_callbacks(callbacks);
        opts
    }
}

impl GitTransport for Git2Transport {
    fn clone_no_checkout(&self, url: &str, dest: &Path, deadline: Deadline) -> Result<(), GitError> {
        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(Self::build_fetch_options(deadline));
        builder.with_checkout(git2::build::CheckoutBuilder::new().dry_run());
        builder.clone(url, dest).map_err(|e| GitError::CloneFailed {
            url: url.to_string(),
            detail: e.message().to_string(),
        })?;
        Ok(())
    }

    fn checkout_head(&self, dest: &Path) -> Result<(), GitError> {
        let repo = open_repo(dest)?;
        let head = repo.head().map_err(|e| GitError::ResetFailed { detail: e.message().to_string() })?;
        let object = head.peel(git2::ObjectType::Commit).map_err(|e| GitError::ResetFailed { detail: e.message().to_string() })?;
        repo.checkout_tree(&object, Some(git2::build::CheckoutBuilder::new().force()))
            .map_err(|e| GitError::ResetFailed { detail: e.message().to_string() })?;
        repo.set_head_detached(object.id()).map_err(|e| GitError::ResetFailed { detail: e.message().to_string() })?;
        Ok(())
    }

    fn pull(&self, dest: &Path, deadline: Deadline) -> Result<(), GitError> {
        let repo = open_repo(dest)?;
        let mut remote = repo.find_remote("origin").map_err(|e| GitError::FetchFailed {
            url: dest.display().to_string(),
            detail: e.message().to_string(),
        })?;
        remote
            .fetch(&[] as &[&str], Some(&mut Self::build_fetch_options(deadline)), None)
            .map_err(|e| GitError::FetchFailed {
                url: dest.display().to_string(),
                detail: e.message().to_string(),
            })?;
        self.reset_hard_to_remote_head(dest)
    }

    fn reset_hard_to_remote_head(&self, dest: &Path) -> Result<(), GitError> {
        let repo = open_repo(dest)?;
        let fetch_head = repo
            .find_reference("FETCH_HEAD")
            .or_else(|_| repo.head())
            .map_err(|e| GitError::ResetFailed { detail: e.message().to_string() })?;
        let commit = fetch_head
            .peel(git2::ObjectType::Commit)
            .map_err(|e| GitError::ResetFailed { detail: e.message().to_string() })?;
        repo.reset(&commit, git2::ResetType::Hard, None)
            .map_err(|e| GitError::ResetFailed { detail: e.message().to_string() })?;
        Ok(())
    }

    fn head_hash(&self, dest: &Path) -> Result<String, GitError> {
        let repo = open_repo(dest)?;
        let head = repo.head().map_err(|e| GitError::ResetFailed { detail: e.message().to_string() })?;
        let oid = head.target().ok_or_else(|| GitError::ResetFailed {
            detail: "HEAD is not a direct reference".to_string(),
        })?;
        Ok(oid.to_string())
    }
}

fn open_repo(path: &Path) -> Result<git2::Repository, GitError> {
    git2::Repository::open(path).map_err(|e| GitError::ResetFailed { detail: e.message().to_string() })
}

/// Narrow HTTP surface the install pipeline needs (fetching
/// `security.toml` overrides, hitting GitHub's release API for signed
/// releases). Kept distinct from [`GitTransport`] so tests can stub each
/// independently.
pub trait HttpTransport {
    /// Performs a blocking GET, returning the response body on any 2xx
    /// status.
    fn get(&self, url: &str, deadline: Deadline) -> Result<Vec<u8>, HttpError>;
}

/// HTTP transport failures, kept separate from [`GitError`] since the two
/// never convert into one another.
#[derive(thiserror::Error, Debug)]
pub enum HttpError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} exceeded its deadline")]
    Timeout { url: String },
}

/// Real implementation backed by `reqwest`'s blocking client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Builds a client with `User-Agent` set per spec.md §5 and no
    /// redirect limit beyond reqwest's default.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized, mirroring the
    /// teacher's `reqwest::Client::new()` call sites which assume a
    /// working TLS stack is part of the platform.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build reqwest client");
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, deadline: Deadline) -> Result<Vec<u8>, HttpError> {
        let remaining = deadline.remaining();
        if remaining.is_zero() {
            return Err(HttpError::Timeout { url: url.to_string() });
        }
        let response = self
            .client
            .get(url)
            .timeout(remaining)
            .send()
            .map_err(|source| HttpError::Request { url: url.to_string(), source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|source| HttpError::Request { url: url.to_string(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeGit {
        cloned: std::cell::RefCell<Vec<(String, std::path::PathBuf)>>,
    }

    impl GitTransport for FakeGit {
        fn clone_no_checkout(&self, url: &str, dest: &Path, _deadline: Deadline) -> Result<(), GitError> {
            self.cloned.borrow_mut().push((url.to_string(), dest.to_path_buf()));
            Ok(())
        }
        fn checkout_head(&self, _dest: &Path) -> Result<(), GitError> {
            Ok(())
        }
        fn pull(&self, _dest: &Path, _deadline: Deadline) -> Result<(), GitError> {
            Ok(())
        }
        fn reset_hard_to_remote_head(&self, _dest: &Path) -> Result<(), GitError> {
            Ok(())
        }
        fn head_hash(&self, _dest: &Path) -> Result<String, GitError> {
            Ok("deadbeef".to_string())
        }
    }

    #[test]
    fn fake_transport_records_clone_calls() {
        let git = FakeGit { cloned: std::cell::RefCell::new(Vec::new()) };
        git.clone_no_checkout("https://example.com/mod.git", Path::new("/tmp/mod"), Deadline::git_clone_default())
            .unwrap();
        assert_eq!(git.cloned.borrow().len(), 1);
    }
}
