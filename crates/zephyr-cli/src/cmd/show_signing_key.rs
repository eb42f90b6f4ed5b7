//! `zephyr show-signing-key`: print the index-signing public key.
//!
//! Signature verification bookkeeping is out of scope (spec.md §1); this
//! presents the command's interface without a real key management backend.

use crate::exit;

pub fn show_signing_key() -> i32 {
    match std::env::var("ZEPHYR_SIGNING_KEY") {
        Ok(key) => {
            println!("{key}");
            exit::OK
        }
        Err(_) => {
            eprintln!("zephyr: no signing key configured (set ZEPHYR_SIGNING_KEY)");
            exit::FAILURE
        }
    }
}
