//! Memory key declarations and validation.

use serde::{Deserialize, Serialize};

use super::value::ValueKind;
use crate::compute_error::ConfigError;

/// Prefix reserved for hidden keys; user keys may not start with it.
pub const HIDDEN_PREFIX: char = '~';

/// A memory key declared by a vertex program or registered for a map-reduce result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryKey {
    name: String,
    kind: ValueKind,
}

impl MemoryKey {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Boolean)
    }

    pub fn blob(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Blob)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

/// Checks that `key` is well-formed.
///
/// A key must be non-empty, carry no surrounding whitespace or control
/// characters, and must not use the hidden prefix [`HIDDEN_PREFIX`].
pub fn validate_key(key: &str) -> Result<(), ConfigError> {
    let reason = if key.is_empty() {
        Some("key must not be empty")
    } else if key.trim() != key {
        Some("key must not have leading or trailing whitespace")
    } else if key.chars().any(char::is_control) {
        Some("key must not contain control characters")
    } else if key.starts_with(HIDDEN_PREFIX) {
        Some("keys starting with `~` are reserved")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ConfigError::InvalidMemoryKey {
            key: key.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
