//! Actor role gate (spec.md §4.5 phase 2, §7): `agent` callers are subject
//! to stricter policy than an interactive `user`. Grounded on the
//! dependency-injection shape of the teacher's `Reporter` trait — role
//! policy and the confirmation hook are both injected into the pipeline,
//! so tests can substitute a fixed role/confirmation without touching
//! pipeline logic.

use serde::Deserialize;

/// The current actor's role, as determined by `security.toml` or the
/// `ZEPHYR_ROLE` environment override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
    Unknown,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this role may pass `--unsafe` to bypass a `block` verdict.
    #[must_use]
    pub fn may_use_unsafe(self) -> bool {
        matches!(self, Self::User | Self::Unknown)
    }

    /// Whether this role may install a `SignedRelease` source.
    #[must_use]
    pub fn may_install_signed_release(self) -> bool {
        matches!(self, Self::User | Self::Unknown)
    }

    /// Whether this role requires an interactive confirmation hook to
    /// proceed past a `warn` verdict.
    #[must_use]
    pub fn requires_confirmation_hook(self) -> bool {
        matches!(self, Self::Agent)
    }
}

#[derive(Debug, Deserialize, Default)]
struct SecurityConfig {
    #[serde(default)]
    role: Option<String>,
}

/// Resolves the current role: `ZEPHYR_ROLE` env var wins, then
/// `security.toml`'s `role` key, then `user` by default.
#[must_use]
pub fn current_role(security_config_path: &std::path::Path) -> Role {
    if let Ok(val) = std::env::var("ZEPHYR_ROLE") {
        return parse_role(&val);
    }
    let Ok(text) = std::fs::read_to_string(security_config_path) else {
        return Role::User;
    };
    match toml::from_str::<SecurityConfig>(&text) {
        Ok(cfg) => cfg.role.as_deref().map_or(Role::User, parse_role),
        Err(_) => {
            tracing::warn!(path = %security_config_path.display(), "ignoring malformed security.toml");
            Role::User
        }
    }
}

fn parse_role(value: &str) -> Role {
    match value {
        "user" => Role::User,
        "agent" => Role::Agent,
        _ => Role::Unknown,
    }
}

/// An interactive confirmation prompt, injected so tests and non-terminal
/// callers can substitute a fixed answer. `None` means no interactive
/// surface is available at all (e.g. a non-TTY agent session).
pub trait ConfirmationHook {
    fn confirm(&self, prompt: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_role_forbids_unsafe_and_signed_release() {
        assert!(!Role::Agent.may_use_unsafe());
        assert!(!Role::Agent.may_install_signed_release());
        assert!(Role::Agent.requires_confirmation_hook());
    }

    #[test]
    fn user_role_is_unrestricted() {
        assert!(Role::User.may_use_unsafe());
        assert!(Role::User.may_install_signed_release());
        assert!(!Role::User.requires_confirmation_hook());
    }

    #[test]
    fn env_override_wins_over_config_file() {
        std::env::set_var("ZEPHYR_ROLE", "agent");
        let role = current_role(std::path::Path::new("/nonexistent/security.toml"));
        std::env::remove_var("ZEPHYR_ROLE");
        assert_eq!(role, Role::Agent);
    }
}
