//! Identifier allocation for package entities.
//!
//! Every module, item, resource and payload record carries an identifier
//! that must be a legal XML name, so tokens are a letter prefix followed by
//! hex-encoded random bytes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix that makes the hex token a legal XML name
pub const IDENTIFIER_PREFIX: char = 'g';

/// Identifier of any entity in the content graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Issue a fresh identifier (128 random bits, hex-encoded)
    pub fn generate() -> Self {
        let bytes = Uuid::new_v4().into_bytes();
        Self(format!("{}{}", IDENTIFIER_PREFIX, hex::encode(bytes)))
    }

    /// Wrap an identifier read from an existing package
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Identifier {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_identifier_shape() {
        let id = Identifier::generate();

        assert!(id.as_str().starts_with(IDENTIFIER_PREFIX));
        // prefix + 16 bytes as hex
        assert_eq!(id.as_str().len(), 33);
        assert!(id.as_str()[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_identifiers_differ() {
        let a = Identifier::generate();
        let b = Identifier::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_foreign_identifier_is_kept_verbatim() {
        let id = Identifier::new("i0042abc");
        assert_eq!(id, "i0042abc");
        assert_eq!(id.to_string(), "i0042abc");
    }
}
