use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// A validated module identifier.
///
/// Must match `[A-Za-z][A-Za-z0-9_-]*` and be at most 50 characters. Unlike
/// package names elsewhere in the ecosystem, module names are case-sensitive
/// identifiers: they double as directory names under the modules root and
/// as the basis for `ZSH_MODULE_<NAME>_<KEY>` environment variable names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleName(String);

/// Reasons a candidate module name is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidModuleName {
    #[error("module name is empty")]
    Empty,
    #[error("module name exceeds 50 characters (got {0})")]
    TooLong(usize),
    #[error("module name must start with a letter: {0:?}")]
    BadStart(String),
    #[error("module name contains an invalid character {0:?}: {1:?}")]
    BadChar(char, String),
}

impl ModuleName {
    /// Validates and constructs a module name.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidModuleName`] if the candidate violates the naming
    /// rule (`[A-Za-z][A-Za-z0-9_-]*`, ≤50 chars).
    pub fn parse(candidate: &str) -> Result<Self, InvalidModuleName> {
        if candidate.is_empty() {
            return Err(InvalidModuleName::Empty);
        }
        if candidate.len() > 50 {
            return Err(InvalidModuleName::TooLong(candidate.len()));
        }
        let mut chars = candidate.chars();
        let first = chars.next().expect("checked non-empty above");
        if !first.is_ascii_alphabetic() {
            return Err(InvalidModuleName::BadStart(candidate.to_string()));
        }
        for c in chars {
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                return Err(InvalidModuleName::BadChar(c, candidate.to_string()));
            }
        }
        Ok(Self(candidate.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `ZSH_MODULE_<NAME>` form: uppercase, `-` mapped to `_`.
    #[must_use]
    pub fn shell_ident(&self) -> String {
        self.0
            .chars()
            .map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() })
            .collect()
    }
}

impl std::fmt::Display for ModuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for ModuleName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for ModuleName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl AsRef<std::ffi::OsStr> for ModuleName {
    fn as_ref(&self) -> &std::ffi::OsStr {
        self.0.as_ref()
    }
}

impl Borrow<str> for ModuleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ModuleName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModuleName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
