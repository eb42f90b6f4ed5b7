//! Cooperative cancellation for long-running operations (scan, git).
//!
//! There is no async runtime (§5): a [`Deadline`] is just a wall-clock
//! expiry checked at the suspension points the spec names (per file during
//! scan, per git progress callback). Callers check [`Deadline::expired`]
//! themselves; nothing pre-empts them.

use std::time::{Duration, Instant};

/// A wall-clock expiry checked cooperatively by long-running loops.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    /// Creates a deadline `timeout` from now.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now() + timeout,
        }
    }

    /// The scanner's default wall-clock budget (30s, overridable).
    #[must_use]
    pub fn scan_default() -> Self {
        Self::after(Duration::from_secs(30))
    }

    /// The HTTP GET default timeout (10s, overridable).
    #[must_use]
    pub fn http_default() -> Self {
        Self::after(Duration::from_secs(10))
    }

    /// The git clone default timeout (60s, overridable).
    #[must_use]
    pub fn git_clone_default() -> Self {
        Self::after(Duration::from_secs(60))
    }

    /// Whether the deadline has passed.
    #[must_use]
    pub fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Time remaining until expiry, or `Duration::ZERO` if already past.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Milliseconds elapsed since this deadline's budget started, derived
    /// from how close to expiry we are relative to the original window.
    #[must_use]
    pub fn elapsed_ms(&self, started_at: Instant) -> u64 {
        started_at.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deadline_is_not_expired() {
        assert!(!Deadline::after(Duration::from_secs(5)).expired());
    }

    #[test]
    fn zero_duration_deadline_is_immediately_expired() {
        let d = Deadline::after(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(1));
        assert!(d.expired());
    }
}
