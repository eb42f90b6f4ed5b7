//! Install Pipeline (spec.md §4.5): `clone → scan → validate → checkout →
//! move`, modeled as a typestate chain so a step's output can only be fed
//! into the next step, grounded on `apl_core::ops::flow`'s
//! `UnresolvedPackage → ResolvedPackage → PreparedPackage` chain.

pub mod role;
pub mod source;

use crate::deadline::Deadline;
use crate::transport::{GitTransport, HttpTransport};
use crate::{cache::ModuleCache, graph, manifest, paths, scanner};
use role::{ConfirmationHook, Role};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zephyr_schema::error::{FSError, GraphError};
use zephyr_schema::{AuditAction, AuditRecord, InstallSource, Module, PolicyRecommendation, ScanResult, ZephyrError};

/// Flags accepted by `install`/`update` (spec.md §6).
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    pub force: bool,
    pub local: bool,
    pub unsafe_: bool,
    pub yes: bool,
}

/// State 1: staged into a unique temp directory, nothing checked out yet.
pub struct Cloned {
    pub source: InstallSource,
    temp_dir: TempDir,
    pub staged_path: PathBuf,
}

/// State 2: the staged copy has been scanned.
pub struct Scanned {
    cloned: Cloned,
    pub scan_result: ScanResult,
}

/// State 3: the staged manifest parses and its dependency graph resolves
/// against the user's existing modules.
pub struct Validated {
    scanned: Scanned,
    pub module: Module,
}

/// Outcome of a completed install/update.
pub struct Installed {
    pub module_name: String,
    pub path: PathBuf,
}

impl Cloned {
    /// Phase 1 + 3: parses `raw_source`, then clones/copies it into a
    /// fresh temp directory without checking out a working tree. Git
    /// hooks are never invoked here: `RepoBuilder::with_checkout` is a
    /// dry-run checkout, so `.git/hooks` is written but never executed.
    pub fn acquire(
        raw_source: &str,
        options: InstallOptions,
        role: Role,
        git: &dyn GitTransport,
        http: &dyn HttpTransport,
        deadline: Deadline,
    ) -> Result<Self, ZephyrError> {
        let source = source::parse(raw_source).map_err(ZephyrError::InvalidSource)?;
        enforce_role_gate(&source, options, role)?;

        let tmp_root = paths::tmp_path();
        std::fs::create_dir_all(&tmp_root).map_err(|_| ZephyrError::Fs(FSError::PermissionDenied(tmp_root.clone())))?;
        let temp_dir = tempfile::Builder::new()
            .prefix("zephyr-")
            .tempdir_in(&tmp_root)
            .map_err(|e| ZephyrError::Other(e.into()))?;
        let staged_path = temp_dir.path().join("staged");

        match &source {
            InstallSource::GitHttps(url) | InstallSource::GitSsh(url) => {
                git.clone_no_checkout(url, &staged_path, deadline)?;
            }
            InstallSource::GitHubShorthand { owner, repo } => {
                let url = format!("https://github.com/{owner}/{repo}.git");
                git.clone_no_checkout(&url, &staged_path, deadline)?;
            }
            InstallSource::LocalPath(path) => {
                copy_dir_recursive(path, &staged_path, false).map_err(|e| {
                    ZephyrError::Fs(FSError::MoveFailed {
                        from: path.clone(),
                        to: staged_path.clone(),
                        detail: e.to_string(),
                    })
                })?;
            }
            InstallSource::SignedRelease(url) => {
                // No archive-extraction crate in this dependency stack
                // (see DESIGN.md); the downloaded asset is staged verbatim
                // as the module's sole file, so signed-release sources
                // only work for single-file modules.
                std::fs::create_dir_all(&staged_path).map_err(|e| ZephyrError::Other(e.into()))?;
                let bytes = http.get(url, deadline).map_err(|e| ZephyrError::Other(anyhow::anyhow!(e)))?;
                let filename = url.rsplit('/').next().unwrap_or("payload");
                std::fs::write(staged_path.join(filename), bytes).map_err(|e| ZephyrError::Other(e.into()))?;
            }
        }

        Ok(Self { source, temp_dir, staged_path })
    }

    /// Phase 4: scans the staged copy and enforces the scan-verdict policy
    /// gate. The role gate itself (phase 2) has already run in
    /// [`Cloned::acquire`], before any clone/fetch/download took place.
    /// Aborts (cleaning up the temp directory via `Drop`) if `block` and
    /// `--unsafe` isn't set, or `warn` and no confirmation is available.
    pub fn scan_and_gate(
        self,
        options: InstallOptions,
        role: Role,
        confirm: Option<&dyn ConfirmationHook>,
        trusted_modules_path: &Path,
    ) -> Result<Scanned, ZephyrError> {
        let scan_result = scanner::scan_directory(&self.staged_path, Deadline::scan_default(), trusted_modules_path)?;

        match scan_result.policy_recommendation {
            PolicyRecommendation::Block if !options.unsafe_ => {
                return Err(ZephyrError::Policy(zephyr_schema::error::PolicyBlock::CriticalFindings {
                    critical: scan_result.findings.iter().filter(|f| f.severity == zephyr_schema::Severity::Critical).count(),
                }));
            }
            PolicyRecommendation::Warn => {
                // A role that requires the confirmation hook (agent) must
                // always go through it on a warn verdict: `--yes` is a flag
                // the same caller controls, so it cannot stand in for
                // confirmation here. Other roles accept `--yes` outright.
                let confirmed = if role.requires_confirmation_hook() {
                    confirm.is_some_and(|hook| hook.confirm("scan found warnings, proceed with install?"))
                } else {
                    options.yes || confirm.is_some_and(|hook| hook.confirm("scan found warnings, proceed with install?"))
                };
                if !confirmed {
                    return Err(ZephyrError::Policy(zephyr_schema::error::PolicyBlock::WarningsRequireConfirmation {
                        warning: scan_result.findings.iter().filter(|f| f.severity == zephyr_schema::Severity::Warning).count(),
                    }));
                }
            }
            _ => {}
        }

        Ok(Scanned { cloned: self, scan_result })
    }
}

impl Scanned {
    /// Phases 5 + 6: parses the staged manifest and validates the
    /// resulting module against the user's existing dependency graph.
    pub fn validate(self, modules_dir: &Path, cache: &ModuleCache) -> Result<Validated, ZephyrError> {
        let module = manifest::parse_module(&self.cloned.staged_path)?;

        let mut existing = graph::discover(modules_dir, cache);
        existing.retain(|m| m.name != module.name);
        existing.push(module.clone());

        graph::resolve(&existing)?;

        Ok(Validated { scanned: self, module })
    }
}

impl Validated {
    /// Phase 7: for git sources, checks out the working tree at the
    /// cloned repository's current `HEAD`. Local/signed-release sources
    /// already have their final content staged and this is a no-op.
    pub fn checkout(self, git: &dyn GitTransport) -> Result<Self, ZephyrError> {
        if matches!(
            self.scanned.cloned.source,
            InstallSource::GitHttps(_) | InstallSource::GitSsh(_) | InstallSource::GitHubShorthand { .. }
        ) {
            git.checkout_head(&self.scanned.cloned.staged_path)?;
        }
        Ok(self)
    }

    /// Phase 8: atomically renames the staged directory into
    /// `<modules_dir>/<name>`. If the target exists and `force` is unset,
    /// aborts. Otherwise the existing directory is renamed to `.old`
    /// first, the move performed, then `.old` removed; any failure after
    /// the rename-to-`.old` step rolls back by renaming `.old` back.
    pub fn install(self, modules_dir: &Path, force: bool) -> Result<Installed, ZephyrError> {
        let name = self.module.name.to_string();
        let target = modules_dir.join(&name);
        std::fs::create_dir_all(modules_dir).map_err(|e| ZephyrError::Other(e.into()))?;

        if target.exists() {
            if !force {
                return Err(ZephyrError::Fs(FSError::TargetExists(target)));
            }
            let rollback_path = modules_dir.join(format!("{name}.old"));
            std::fs::rename(&target, &rollback_path).map_err(|e| {
                ZephyrError::Fs(FSError::MoveFailed { from: target.clone(), to: rollback_path.clone(), detail: e.to_string() })
            })?;

            if let Err(e) = std::fs::rename(&self.scanned.cloned.staged_path, &target) {
                let _ = std::fs::rename(&rollback_path, &target);
                return Err(ZephyrError::Fs(FSError::MoveFailed {
                    from: self.scanned.cloned.staged_path.clone(),
                    to: target.clone(),
                    detail: e.to_string(),
                }));
            }
            let _ = std::fs::remove_dir_all(&rollback_path);
        } else {
            std::fs::rename(&self.scanned.cloned.staged_path, &target).map_err(|e| {
                ZephyrError::Fs(FSError::MoveFailed { from: self.scanned.cloned.staged_path.clone(), to: target.clone(), detail: e.to_string() })
            })?;
        }

        Ok(Installed { module_name: name, path: target })
    }
}

/// Runs the full install pipeline (phases 1–9), writing an audit record on
/// both success and failure.
#[allow(clippy::too_many_arguments)]
pub fn install(
    raw_source: &str,
    options: InstallOptions,
    role: Role,
    confirm: Option<&dyn ConfirmationHook>,
    git: &dyn GitTransport,
    http: &dyn HttpTransport,
    modules_dir: &Path,
    trusted_modules_path: &Path,
    session_id: &str,
) -> Result<Installed, ZephyrError> {
    let cache = ModuleCache::new(crate::cache::DEFAULT_CAPACITY);
    let result = (|| -> Result<Installed, ZephyrError> {
        let cloned = Cloned::acquire(raw_source, options, role, git, http, Deadline::git_clone_default())?;
        let scanned = cloned.scan_and_gate(options, role, confirm, trusted_modules_path)?;
        let (critical, warning) = severity_counts(&scanned.scan_result);
        let validated = scanned.validate(modules_dir, &cache)?;
        let validated = validated.checkout(git)?;
        let installed = validated.install(modules_dir, options.force)?;
        record_audit(session_id, role, AuditAction::Install, Some(&installed.module_name), Some(raw_source), true, None, critical, warning);
        Ok(installed)
    })();

    if let Err(err) = &result {
        record_audit(session_id, role, AuditAction::Install, None, Some(raw_source), false, Some(err.to_string()), 0, 0);
    }
    result
}

/// Update an already-installed module in place: fetches and fast-forwards
/// a staged clone, re-validates, and atomically swaps it into place only
/// on success. On post-update validation failure, the staged clone is
/// simply discarded (the live install is never touched).
pub fn update(
    name: &str,
    options: InstallOptions,
    role: Role,
    confirm: Option<&dyn ConfirmationHook>,
    git: &dyn GitTransport,
    modules_dir: &Path,
    trusted_modules_path: &Path,
    session_id: &str,
) -> Result<Installed, ZephyrError> {
    let cache = ModuleCache::new(crate::cache::DEFAULT_CAPACITY);
    let live_path = modules_dir.join(name);
    if !live_path.exists() {
        let err = ZephyrError::InvalidSource(format!("module {name} is not installed"));
        record_audit(session_id, role, AuditAction::Update, Some(name), None, false, Some(err.to_string()), 0, 0);
        return Err(err);
    }

    let result = (|| -> Result<Installed, ZephyrError> {
        enforce_role_gate(&InstallSource::LocalPath(live_path.clone()), options, role)?;

        let tmp_root = paths::tmp_path();
        std::fs::create_dir_all(&tmp_root).map_err(|e| ZephyrError::Other(e.into()))?;
        let temp_dir = tempfile::Builder::new().prefix("zephyr-update-").tempdir_in(&tmp_root).map_err(|e| ZephyrError::Other(e.into()))?;
        let staged_path = temp_dir.path().join("staged");
        copy_dir_recursive(&live_path, &staged_path, true).map_err(|e| {
            ZephyrError::Fs(FSError::MoveFailed { from: live_path.clone(), to: staged_path.clone(), detail: e.to_string() })
        })?;

        git.pull(&staged_path, Deadline::git_clone_default())?;

        let cloned = Cloned {
            source: InstallSource::LocalPath(staged_path.clone()),
            temp_dir,
            staged_path,
        };
        let scanned = cloned.scan_and_gate(options, role, confirm, trusted_modules_path)?;
        let (critical, warning) = severity_counts(&scanned.scan_result);
        let validated = scanned.validate(modules_dir, &cache)?;
        let installed = validated.install(modules_dir, true)?;
        record_audit(session_id, role, AuditAction::Update, Some(&installed.module_name), Some(name), true, None, critical, warning);
        Ok(installed)
    })();

    if let Err(err) = &result {
        record_audit(session_id, role, AuditAction::Update, Some(name), None, false, Some(err.to_string()), 0, 0);
    }
    result
}

/// Removes an installed module, refusing if other modules still require
/// it unless `force` is set (with interactive confirmation unless `yes`).
pub fn uninstall(
    name: &str,
    force: bool,
    yes: bool,
    confirm: Option<&dyn ConfirmationHook>,
    modules_dir: &Path,
    role: Role,
    session_id: &str,
) -> Result<(), ZephyrError> {
    let cache = ModuleCache::new(crate::cache::DEFAULT_CAPACITY);

    let result = (|| -> Result<(), ZephyrError> {
        let module_name = zephyr_schema::ModuleName::parse(name).map_err(|e| ZephyrError::InvalidSource(e.to_string()))?;
        let modules = graph::discover(modules_dir, &cache);
        let resolved = graph::resolve(&modules).unwrap_or_default();
        let reverse = graph::build_reverse_deps(&resolved);
        let dependents = reverse.get(&module_name);

        if let Some(deps) = dependents {
            if !deps.is_empty() {
                if !force {
                    return Err(ZephyrError::Graph(GraphError::MissingRequiredDep(
                        deps.iter().map(|d| zephyr_schema::error::MissingDep { module: d.to_string(), dep: name.to_string() }).collect(),
                    )));
                }
                if !yes {
                    let confirmed = confirm.is_some_and(|hook| hook.confirm(&format!("{name} has dependents, remove anyway?")));
                    if !confirmed {
                        return Err(ZephyrError::InvalidSource("uninstall cancelled".to_string()));
                    }
                }
            }
        }

        let target = modules_dir.join(name);
        std::fs::remove_dir_all(&target).map_err(|e| ZephyrError::Fs(FSError::MoveFailed { from: target.clone(), to: target.clone(), detail: e.to_string() }))?;
        Ok(())
    })();

    record_audit(
        session_id,
        role,
        AuditAction::Uninstall,
        Some(name),
        None,
        result.is_ok(),
        result.as_ref().err().map(ToString::to_string),
        0,
        0,
    );
    result
}

/// Phase 2: rejects a source/option combination an actor's role isn't
/// permitted to use, before any clone/fetch/download (phase 3) runs.
fn enforce_role_gate(source: &InstallSource, options: InstallOptions, role: Role) -> Result<(), ZephyrError> {
    if source.is_signed_release() && !role.may_install_signed_release() {
        return Err(ZephyrError::Policy(zephyr_schema::error::PolicyBlock::AgentForbidden {
            action: "install signed-release sources".to_string(),
        }));
    }
    if options.unsafe_ && !role.may_use_unsafe() {
        return Err(ZephyrError::Policy(zephyr_schema::error::PolicyBlock::AgentForbidden {
            action: "use --unsafe".to_string(),
        }));
    }
    Ok(())
}

fn severity_counts(scan_result: &ScanResult) -> (usize, usize) {
    let critical = scan_result.findings.iter().filter(|f| f.severity == zephyr_schema::Severity::Critical).count();
    let warning = scan_result.findings.iter().filter(|f| f.severity == zephyr_schema::Severity::Warning).count();
    (critical, warning)
}

#[allow(clippy::too_many_arguments)]
fn record_audit(
    session_id: &str,
    role: Role,
    action: AuditAction,
    module: Option<&str>,
    source: Option<&str>,
    success: bool,
    reason: Option<String>,
    critical_count: usize,
    warning_count: usize,
) {
    let record = AuditRecord {
        timestamp: crate::audit::now_rfc3339(),
        session_id: session_id.to_string(),
        actor: role.as_str().to_string(),
        role: role.as_str().to_string(),
        action,
        module: module.map(ToString::to_string),
        source: source.map(ToString::to_string),
        success,
        reason,
        critical_count,
        warning_count,
    };
    crate::audit::append(&record);
}

/// Recursively copies `src` into `dest`. `include_git` controls whether a
/// `.git` subdirectory is carried along: staging a plain local source
/// (`InstallSource::LocalPath`) drops it, but staging a live git-sourced
/// install ahead of `update`'s `git.pull` must keep it, or the pull has no
/// repository to open.
fn copy_dir_recursive(src: &Path, dest: &Path, include_git: bool) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let dest_child = dest.join(entry.file_name());
        if file_type.is_dir() {
            if !include_git && entry.file_name() == ".git" {
                continue;
            }
            copy_dir_recursive(&entry.path(), &dest_child, include_git)?;
        } else if file_type.is_file() {
            std::fs::copy(entry.path(), &dest_child)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpError;

    struct NoopGit;
    impl GitTransport for NoopGit {
        fn clone_no_checkout(&self, _url: &str, dest: &Path, _deadline: Deadline) -> Result<(), zephyr_schema::GitError> {
            std::fs::create_dir_all(dest).unwrap();
            Ok(())
        }
        fn checkout_head(&self, _dest: &Path) -> Result<(), zephyr_schema::GitError> {
            Ok(())
        }
        fn pull(&self, _dest: &Path, _deadline: Deadline) -> Result<(), zephyr_schema::GitError> {
            Ok(())
        }
        fn reset_hard_to_remote_head(&self, _dest: &Path) -> Result<(), zephyr_schema::GitError> {
            Ok(())
        }
        fn head_hash(&self, _dest: &Path) -> Result<String, zephyr_schema::GitError> {
            Ok("abc123".to_string())
        }
    }

    struct NoopHttp;
    impl HttpTransport for NoopHttp {
        fn get(&self, _url: &str, _deadline: Deadline) -> Result<Vec<u8>, HttpError> {
            Ok(Vec::new())
        }
    }

    fn write_module(dir: &Path, name: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join("module.toml"),
            format!("[module]\nname = \"{name}\"\n\n[load]\nfiles = [\"init.zsh\"]\n"),
        )
        .unwrap();
        std::fs::write(dir.join("init.zsh"), "echo hello\n").unwrap();
    }

    struct CountingConfirm {
        calls: std::cell::RefCell<usize>,
        answer: bool,
    }
    impl ConfirmationHook for CountingConfirm {
        fn confirm(&self, _prompt: &str) -> bool {
            *self.calls.borrow_mut() += 1;
            self.answer
        }
    }

    #[test]
    fn copy_dir_recursive_preserves_git_only_when_requested() {
        let src = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join(".git")).unwrap();
        std::fs::write(src.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        std::fs::write(src.path().join("init.zsh"), "echo hi\n").unwrap();

        let with_git_root = tempfile::tempdir().unwrap();
        let with_git = with_git_root.path().join("staged");
        copy_dir_recursive(src.path(), &with_git, true).unwrap();
        assert!(with_git.join(".git/HEAD").exists());

        let without_git_root = tempfile::tempdir().unwrap();
        let without_git = without_git_root.path().join("staged");
        copy_dir_recursive(src.path(), &without_git, false).unwrap();
        assert!(!without_git.join(".git").exists());
    }

    #[test]
    fn agent_role_yes_flag_does_not_bypass_confirmation_hook() {
        let source_dir = tempfile::tempdir().unwrap();
        write_module(source_dir.path(), "demo");
        std::fs::write(source_dir.path().join("init.zsh"), "curl http://example.com/install.sh\n").unwrap();

        let git = NoopGit;
        let http = NoopHttp;
        let options = InstallOptions { yes: true, ..InstallOptions::default() };
        let cloned = Cloned::acquire(source_dir.path().to_str().unwrap(), options, Role::Agent, &git, &http, Deadline::git_clone_default()).unwrap();

        let trusted = source_dir.path().join("trusted_modules.toml");
        let confirm = CountingConfirm { calls: std::cell::RefCell::new(0), answer: true };
        let scanned = cloned.scan_and_gate(options, Role::Agent, Some(&confirm), &trusted).unwrap();

        assert_eq!(scanned.scan_result.policy_recommendation, PolicyRecommendation::Warn);
        assert_eq!(*confirm.calls.borrow(), 1, "agent role must consult the confirmation hook even with --yes");
    }

    #[test]
    fn agent_role_without_confirmation_hook_fails_on_warn() {
        let source_dir = tempfile::tempdir().unwrap();
        write_module(source_dir.path(), "demo");
        std::fs::write(source_dir.path().join("init.zsh"), "curl http://example.com/install.sh\n").unwrap();

        let git = NoopGit;
        let http = NoopHttp;
        let options = InstallOptions { yes: true, ..InstallOptions::default() };
        let cloned = Cloned::acquire(source_dir.path().to_str().unwrap(), options, Role::Agent, &git, &http, Deadline::git_clone_default()).unwrap();

        let trusted = source_dir.path().join("trusted_modules.toml");
        let result = cloned.scan_and_gate(options, Role::Agent, None, &trusted);
        assert!(matches!(result, Err(ZephyrError::Policy(zephyr_schema::error::PolicyBlock::WarningsRequireConfirmation { .. }))));
    }

    #[test]
    fn install_local_path_clean_module_succeeds() {
        let source_dir = tempfile::tempdir().unwrap();
        write_module(source_dir.path(), "demo");

        let zephyr_home = tempfile::tempdir().unwrap();
        let modules_dir = zephyr_home.path().join("modules");
        std::env::set_var("ZSH_MODULES_DIR", modules_dir.to_str().unwrap());
        std::env::set_var("ZEPHYR_HOME", zephyr_home.path().join("zephyr-home").to_str().unwrap());

        let git = NoopGit;
        let http = NoopHttp;
        let trusted = zephyr_home.path().join("trusted_modules.toml");
        let result = install(
            source_dir.path().to_str().unwrap(),
            InstallOptions::default(),
            Role::User,
            None,
            &git,
            &http,
            &modules_dir,
            &trusted,
            "test-session",
        );

        std::env::remove_var("ZSH_MODULES_DIR");
        std::env::remove_var("ZEPHYR_HOME");

        let installed = result.unwrap();
        assert_eq!(installed.module_name, "demo");
        assert!(installed.path.join("module.toml").exists());
    }

    #[test]
    fn install_refuses_existing_target_without_force() {
        let source_dir = tempfile::tempdir().unwrap();
        write_module(source_dir.path(), "demo");

        let zephyr_home = tempfile::tempdir().unwrap();
        let modules_dir = zephyr_home.path().join("modules");
        write_module(&modules_dir.join("demo"), "demo");
        std::env::set_var("ZSH_MODULES_DIR", modules_dir.to_str().unwrap());
        std::env::set_var("ZEPHYR_HOME", zephyr_home.path().join("zephyr-home").to_str().unwrap());

        let git = NoopGit;
        let http = NoopHttp;
        let trusted = zephyr_home.path().join("trusted_modules.toml");
        let result = install(
            source_dir.path().to_str().unwrap(),
            InstallOptions::default(),
            Role::User,
            None,
            &git,
            &http,
            &modules_dir,
            &trusted,
            "test-session",
        );

        std::env::remove_var("ZSH_MODULES_DIR");
        std::env::remove_var("ZEPHYR_HOME");

        assert!(matches!(result, Err(ZephyrError::Fs(FSError::TargetExists(_)))));
    }
}
