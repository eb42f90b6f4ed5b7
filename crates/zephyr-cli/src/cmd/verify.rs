//! `zephyr verify <path>`: verify a signed release artifact.
//!
//! Signature verification is out of scope (spec.md §1); this presents the
//! command's interface, confirming only that the artifact exists and is
//! readable.

use crate::exit;
use std::path::Path;

pub fn verify(path: &Path) -> i32 {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            println!("{}: present, signature verification not implemented", path.display());
            exit::OK
        }
        Ok(_) => {
            eprintln!("zephyr: {} is not a regular file", path.display());
            exit::INVALID_ARGS
        }
        Err(err) => {
            eprintln!("zephyr: cannot read {}: {err}", path.display());
            exit::FAILURE
        }
    }
}
