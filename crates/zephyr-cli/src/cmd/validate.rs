//! `zephyr validate`: parse and resolve the module graph without emitting.

use crate::exit;
use zephyr_core::cache::ModuleCache;
use zephyr_core::{graph, paths, platform};

pub fn validate() -> i32 {
    let modules_dir = paths::modules_dir();
    let cache = ModuleCache::new(zephyr_core::cache::DEFAULT_CAPACITY);
    let discovered = graph::discover(&modules_dir, &cache);
    let (compatible, report) = graph::filter_compatible_for(&discovered, platform::current_os(), platform::current_arch(), None);

    let mut had_incompatible = false;
    for r in &report {
        if !r.compatible {
            had_incompatible = true;
            println!("skip  {}: {}", r.name, r.reason.as_deref().unwrap_or("incompatible"));
        }
    }

    match graph::resolve(&compatible) {
        Ok(resolved) => {
            println!("ok: {} module(s) resolve cleanly", resolved.len());
            if had_incompatible {
                println!("({} module(s) skipped for this platform)", report.iter().filter(|r| !r.compatible).count());
            }
            exit::OK
        }
        Err(err) => {
            eprintln!("zephyr: {err}");
            exit::FAILURE
        }
    }
}
