//! `tracing` subscriber setup (spec.md §6, §7).
//!
//! Verbosity is driven by (in increasing priority) `ZEPHYR_VERBOSE`,
//! `ZEPHYR_DEBUG`, then the `-v`/`-d`/`--trace` flags, so a flag always wins
//! over its environment-variable equivalent.

use tracing_subscriber::EnvFilter;

/// Resolves the effective log level and initializes the global subscriber.
///
/// `ZEPHYR_DEBUG` accepts `0`-`3` or `false|true|debug|trace`; `1`/`true`
/// maps to `debug`, `2`-`3`/`trace` map to `trace`. `ZEPHYR_DEBUG_TIMESTAMPS`
/// and `ZEPHYR_DEBUG_LOCATION` toggle the corresponding formatter fields.
pub fn init(verbose: bool, debug: bool, trace: bool, no_color: bool) {
    let level = resolve_level(verbose, debug, trace);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let with_timestamps = env_flag("ZEPHYR_DEBUG_TIMESTAMPS");
    let with_location = env_flag("ZEPHYR_DEBUG_LOCATION");
    let use_color = !no_color && std::env::var_os("NO_COLOR").is_none();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(use_color)
        .with_target(false)
        .with_file(with_location)
        .with_line_number(with_location);

    if with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}

fn resolve_level(verbose: bool, debug: bool, trace: bool) -> &'static str {
    if trace {
        return "trace";
    }
    if debug {
        return "debug";
    }
    if verbose {
        return "info";
    }
    match std::env::var("ZEPHYR_DEBUG").ok().as_deref() {
        Some("trace") | Some("2") | Some("3") => "trace",
        Some("true") | Some("debug") | Some("1") => "debug",
        _ if env_flag("ZEPHYR_VERBOSE") => "info",
        _ => "warn",
    }
}

fn env_flag(name: &str) -> bool {
    matches!(std::env::var(name).ok().as_deref(), Some("1") | Some("true"))
}
