//! `zephyr list`: enumerate discovered modules, optionally as JSON or a
//! Mermaid dependency graph.

use crate::exit;
use serde::Serialize;
use zephyr_core::cache::ModuleCache;
use zephyr_core::{graph, paths, platform};
use zephyr_schema::Module;

#[derive(Debug, Serialize)]
struct ModuleSummary {
    name: String,
    version: String,
    description: Option<String>,
    priority: i64,
    required_deps: Vec<String>,
    optional_deps: Vec<String>,
    compatible: bool,
    reason: Option<String>,
}

#[allow(clippy::too_many_arguments)]
pub fn list(json: bool, pretty: bool, filter: Option<&str>, graph_format: Option<&str>) -> i32 {
    let modules_dir = paths::modules_dir();
    let cache = ModuleCache::new(zephyr_core::cache::DEFAULT_CAPACITY);
    let discovered = graph::discover(&modules_dir, &cache);
    let (_compatible, report) = graph::filter_compatible_for(&discovered, platform::current_os(), platform::current_arch(), None);

    let by_name: std::collections::HashMap<&str, &Module> = discovered.iter().map(|m| (m.name.as_str(), m)).collect();

    let mut summaries: Vec<ModuleSummary> = report
        .iter()
        .filter_map(|r| {
            let module = by_name.get(r.name.as_str())?;
            if let Some(needle) = filter {
                if !module.name.as_str().contains(needle) {
                    return None;
                }
            }
            Some(ModuleSummary {
                name: module.name.to_string(),
                version: module.version.clone(),
                description: module.description.clone(),
                priority: module.priority,
                required_deps: module.required_deps.iter().map(ToString::to_string).collect(),
                optional_deps: module.optional_deps.iter().map(ToString::to_string).collect(),
                compatible: r.compatible,
                reason: r.reason.clone(),
            })
        })
        .collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name));

    if let Some(format) = graph_format {
        if format.eq_ignore_ascii_case("mermaid") {
            println!("{}", render_mermaid(&discovered));
            return exit::OK;
        }
        eprintln!("zephyr: unsupported --graph format {format:?} (supported: mermaid)");
        return exit::INVALID_ARGS;
    }

    if json || pretty {
        let result = if pretty {
            serde_json::to_string_pretty(&summaries)
        } else {
            serde_json::to_string(&summaries)
        };
        match result {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("zephyr: failed to serialize module list: {err}");
                return exit::FAILURE;
            }
        }
        return exit::OK;
    }

    for summary in &summaries {
        let status = if summary.compatible { "ok" } else { "skip" };
        let version = &summary.version;
        println!("{status:<4} {:<24} {version}", summary.name);
        if let Some(reason) = &summary.reason {
            println!("       {reason}");
        }
    }
    exit::OK
}

/// Renders the required-dependency edges as a Mermaid `graph TD` block.
fn render_mermaid(modules: &[Module]) -> String {
    let mut out = String::from("graph TD\n");
    for module in modules {
        out.push_str(&format!("    {}[\"{}\"]\n", module.name.shell_ident(), module.name));
        for dep in &module.required_deps {
            out.push_str(&format!("    {} --> {}\n", module.name.shell_ident(), dep.shell_ident()));
        }
        for dep in &module.optional_deps {
            out.push_str(&format!("    {} -.-> {}\n", module.name.shell_ident(), dep.shell_ident()));
        }
    }
    out
}
