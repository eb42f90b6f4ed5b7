//! Module discovery, platform filtering and topological dependency
//! resolution.

use crate::cache::ModuleCache;
use crate::{manifest, platform};
use std::collections::{HashMap, HashSet, VecDeque};
use zephyr_schema::error::{GraphError, MissingDep};
use zephyr_schema::{Module, ModuleName};

/// Walks each immediate child directory of `root`, parsing `module.toml`
/// where present.
///
/// Modules that fail to parse are dropped with a `tracing::warn!`; the walk
/// never aborts on a single bad manifest. Parsed modules are cached by
/// absolute manifest path in `cache`.
#[must_use]
pub fn discover(root: &std::path::Path, cache: &ModuleCache) -> Vec<Module> {
    let mut modules = Vec::new();
    let Ok(read_dir) = std::fs::read_dir(root) else {
        tracing::warn!(root = %root.display(), "cannot read modules directory");
        return modules;
    };

    let mut children: Vec<_> = read_dir.filter_map(Result::ok).map(|e| e.path()).collect();
    children.sort();

    for child in children {
        if !child.is_dir() {
            continue;
        }
        let manifest_path = manifest::manifest_path(&child);
        if !manifest_path.exists() {
            continue;
        }
        if let Some(cached) = cache.get(&manifest_path) {
            modules.push(cached);
            continue;
        }
        match manifest::parse_module(&child) {
            Ok(module) => {
                cache.insert(manifest_path, module.clone());
                modules.push(module);
            }
            Err(err) => {
                tracing::warn!(path = %child.display(), error = %err, "skipping module with invalid manifest");
            }
        }
    }

    modules
}

/// A module dropped (or kept) by [`filter_compatible`], with the reason it
/// was excluded.
#[derive(Debug, Clone)]
pub struct PlatformReport {
    pub name: ModuleName,
    pub compatible: bool,
    pub reason: Option<String>,
}

/// Filters `modules` for the current OS/arch/shell/version, returning the
/// compatible subset and a report covering every input module (compatible
/// or not) for `list`-style diagnostics.
#[must_use]
pub fn filter_compatible(modules: &[Module]) -> (Vec<Module>, Vec<PlatformReport>) {
    filter_compatible_for(modules, platform::current_os(), platform::current_arch(), None)
}

/// Same as [`filter_compatible`] but against an explicit `(os, arch,
/// shell)` triple, used by the `--shell` CLI flag and by tests.
#[must_use]
pub fn filter_compatible_for(
    modules: &[Module],
    os: &str,
    arch: &str,
    shell: Option<&str>,
) -> (Vec<Module>, Vec<PlatformReport>) {
    let mut kept = Vec::new();
    let mut report = Vec::new();

    for module in modules {
        let p = &module.platforms;

        if !p.os.is_empty() && !p.os.iter().any(|o| o.eq_ignore_ascii_case(os)) {
            report.push(incompatible(module, format!("os {os} not in {:?}", p.os)));
            continue;
        }
        if !p.arch.is_empty() && !p.arch.iter().any(|a| a.eq_ignore_ascii_case(arch)) {
            report.push(incompatible(module, format!("arch {arch} not in {:?}", p.arch)));
            continue;
        }
        if let (Some(required_shell), Some(current_shell)) = (&p.shell, shell) {
            if !required_shell.eq_ignore_ascii_case(current_shell) {
                report.push(incompatible(
                    module,
                    format!("shell {current_shell} does not match required {required_shell}"),
                ));
                continue;
            }
        }
        if let Some(min_version) = &p.min_version {
            if let Some(current_shell_version) = shell {
                if !platform::version_at_least(current_shell_version, min_version) {
                    report.push(incompatible(
                        module,
                        format!("shell version {current_shell_version} below required {min_version}"),
                    ));
                    continue;
                }
            }
        }

        report.push(PlatformReport {
            name: module.name.clone(),
            compatible: true,
            reason: None,
        });
        kept.push(module.clone());
    }

    (kept, report)
}

fn incompatible(module: &Module, reason: String) -> PlatformReport {
    PlatformReport {
        name: module.name.clone(),
        compatible: false,
        reason: Some(reason),
    }
}

/// Topologically resolves `modules` honoring required-dependency edges.
///
/// Ties within the ready-set are broken by `(priority asc, name asc)`.
/// Dependency order always wins over priority: priority is purely a
/// tie-break among nodes whose in-degree has already reached zero.
///
/// # Errors
///
/// Returns [`GraphError::MissingRequiredDep`] if any required dependency is
/// absent from `modules` (listing every missing edge, not just the first),
/// or [`GraphError::CircularDep`] if the required-dependency subgraph is
/// not acyclic.
pub fn resolve(modules: &[Module]) -> Result<Vec<Module>, GraphError> {
    let by_name: HashMap<&str, &Module> = modules.iter().map(|m| (m.name.as_str(), m)).collect();

    let mut missing = Vec::new();
    for module in modules {
        for dep in &module.required_deps {
            if !by_name.contains_key(dep.as_str()) {
                missing.push(MissingDep {
                    module: module.name.to_string(),
                    dep: dep.to_string(),
                });
            }
        }
    }
    if !missing.is_empty() {
        return Err(GraphError::MissingRequiredDep(missing));
    }

    // Only required deps become graph edges. Optional deps never affect
    // in-degree/readiness, even when present in `modules`: they may only
    // break ties within the already-ready set (see the `ready.sort_by`
    // calls below use `(priority, name)`, not optional-dep order).
    let mut in_degree: HashMap<&str, usize> = modules.iter().map(|m| (m.name.as_str(), 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for module in modules {
        for dep in &module.required_deps {
            dependents.entry(dep.as_str()).or_default().push(module.name.as_str());
            *in_degree.get_mut(module.name.as_str()).unwrap() += 1;
        }
    }

    let mut ready: Vec<&Module> = modules
        .iter()
        .filter(|m| in_degree[m.name.as_str()] == 0)
        .collect();
    ready.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
    let mut ready: VecDeque<&Module> = ready.into();

    let mut order = Vec::with_capacity(modules.len());
    while let Some(current) = ready.pop_front() {
        order.push(current.clone());

        let mut newly_ready = Vec::new();
        if let Some(deps) = dependents.get(current.name.as_str()) {
            for &dependent_name in deps {
                let degree = in_degree.get_mut(dependent_name).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    newly_ready.push(by_name[dependent_name]);
                }
            }
        }
        newly_ready.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));

        let mut rest: Vec<&Module> = ready.into_iter().collect();
        rest.extend(newly_ready);
        rest.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        ready = rest.into();
    }

    if order.len() < modules.len() {
        let resolved_names: HashSet<&str> = order.iter().map(|m| m.name.as_str()).collect();
        let residual: Vec<String> = modules
            .iter()
            .map(|m| m.name.to_string())
            .filter(|n| !resolved_names.contains(n.as_str()))
            .collect();
        return Err(GraphError::CircularDep(residual));
    }

    Ok(order)
}

/// Builds the reverse-dependency index: `name -> names that require it`.
///
/// Used by uninstall to refuse (or warn) when dependents exist.
#[must_use]
pub fn build_reverse_deps(resolved: &[Module]) -> HashMap<ModuleName, HashSet<ModuleName>> {
    let mut reverse: HashMap<ModuleName, HashSet<ModuleName>> = HashMap::new();
    for module in resolved {
        for dep in &module.required_deps {
            reverse.entry(dep.clone()).or_default().insert(module.name.clone());
        }
    }
    reverse
}

#[cfg(test)]
mod tests {
    use super::*;
    use zephyr_schema::{Hooks, Platforms};

    fn module(name: &str, priority: i64, required: &[&str]) -> Module {
        Module {
            name: ModuleName::parse(name).unwrap(),
            version: "0.0.0".into(),
            description: None,
            author: None,
            license: None,
            required_deps: required.iter().map(|d| ModuleName::parse(d).unwrap()).collect(),
            optional_deps: vec![],
            platforms: Platforms::default(),
            priority,
            files: vec![],
            hooks: Hooks::default(),
            settings: vec![],
            path: std::path::PathBuf::from("/modules").join(name),
        }
    }

    #[test]
    fn linear_dependency_chain_resolves_in_order() {
        let modules = vec![
            module("core", 10, &[]),
            module("utils", 20, &["core"]),
            module("app", 30, &["utils", "core"]),
        ];
        let resolved = resolve(&modules).unwrap();
        let names: Vec<_> = resolved.iter().map(|m| m.name.to_string()).collect();
        assert_eq!(names, vec!["core", "utils", "app"]);
    }

    #[test]
    fn cycle_is_detected_and_reports_all_members() {
        let modules = vec![module("a", 10, &["b"]), module("b", 10, &["a"])];
        let err = resolve(&modules).unwrap_err();
        match err {
            GraphError::CircularDep(mut members) => {
                members.sort();
                assert_eq!(members, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected CircularDep, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_dep_lists_all_offenders() {
        let modules = vec![module("a", 10, &["missing1"]), module("b", 10, &["missing2"])];
        let err = resolve(&modules).unwrap_err();
        match err {
            GraphError::MissingRequiredDep(missing) => assert_eq!(missing.len(), 2),
            other => panic!("expected MissingRequiredDep, got {other:?}"),
        }
    }

    #[test]
    fn priority_is_only_a_tie_break_within_ready_set() {
        // `high_prio` has a lower (earlier) priority number than `dep`, but
        // depends on `dep`, so dep-first semantics must still place `dep`
        // before `high_prio` in the output.
        let modules = vec![module("dep", 50, &[]), module("high_prio", 1, &["dep"])];
        let resolved = resolve(&modules).unwrap();
        let names: Vec<_> = resolved.iter().map(|m| m.name.to_string()).collect();
        assert_eq!(names, vec!["dep", "high_prio"]);
    }

    #[test]
    fn ready_set_ties_break_by_priority_then_name() {
        let modules = vec![module("b", 10, &[]), module("a", 10, &[]), module("c", 5, &[])];
        let resolved = resolve(&modules).unwrap();
        let names: Vec<_> = resolved.iter().map(|m| m.name.to_string()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn reverse_deps_map_dependency_to_dependents() {
        let modules = vec![module("core", 10, &[]), module("utils", 20, &["core"])];
        let resolved = resolve(&modules).unwrap();
        let reverse = build_reverse_deps(&resolved);
        let core_dependents = &reverse[&ModuleName::parse("core").unwrap()];
        assert!(core_dependents.contains(&ModuleName::parse("utils").unwrap()));
    }

    #[test]
    fn filter_compatible_excludes_wrong_os() {
        let mut m = module("linux-only", 10, &[]);
        m.platforms.os = vec!["linux".to_string()];
        let (kept, report) = filter_compatible_for(&[m], "darwin", "arm64", None);
        assert!(kept.is_empty());
        assert!(!report[0].compatible);
    }

    #[test]
    fn empty_platform_constraints_mean_any() {
        let m = module("universal", 10, &[]);
        let (kept, _) = filter_compatible_for(&[m], "darwin", "arm64", None);
        assert_eq!(kept.len(), 1);
    }
}
