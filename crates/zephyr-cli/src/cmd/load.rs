//! `zephyr load` (the default command): discover, filter, resolve, emit.

use crate::exit;
use crate::ShellArg;
use zephyr_core::cache::ModuleCache;
use zephyr_core::{emitter, graph, paths, platform};

pub fn load(shell: ShellArg) -> i32 {
    let modules_dir = paths::modules_dir();
    let cache = ModuleCache::new(zephyr_core::cache::DEFAULT_CAPACITY);
    let discovered = graph::discover(&modules_dir, &cache);
    let (compatible, _report) =
        graph::filter_compatible_for(&discovered, platform::current_os(), platform::current_arch(), Some(shell.as_str()));

    let resolved = match graph::resolve(&compatible) {
        Ok(r) => r,
        Err(err) => {
            tracing::error!(%err, "failed to resolve module graph");
            eprintln!("zephyr: {err}");
            return exit::FAILURE;
        }
    };

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    if let Err(err) = emitter::emit(&resolved, shell.to_emitter_shell(), &mut lock) {
        tracing::error!(%err, "failed to emit shell script");
        return exit::FAILURE;
    }
    exit::OK
}
