//! Process exit codes (spec.md §6).
//!
//! Every subcommand but `scan` shares the same mapping: `0` success, `1`
//! generic failure, `4` invalid arguments. `scan` additionally distinguishes
//! `2` (critical findings) and `3` (scan I/O or timeout failure), and
//! inverts the critical/warning mapping when scanning a literal command
//! string rather than a directory.

pub const OK: i32 = 0;
pub const FAILURE: i32 = 1;
pub const SCAN_CRITICAL: i32 = 2;
pub const SCAN_IO_OR_TIMEOUT: i32 = 3;
pub const INVALID_ARGS: i32 = 4;

use zephyr_schema::error::ZephyrError;

/// Maps a top-level pipeline error to a process exit code.
#[must_use]
pub fn from_error(err: &ZephyrError) -> i32 {
    match err {
        ZephyrError::InvalidSource(_) => INVALID_ARGS,
        ZephyrError::Scan(_) => SCAN_IO_OR_TIMEOUT,
        _ => FAILURE,
    }
}
