//! Error type shared by the engine, serializer, scanner and hydrator.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by library operations
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid package at {}: {reason}", path.display())]
    InvalidPackage { path: PathBuf, reason: String },

    #[error("Invalid file name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Failed to parse {context}: {message}")]
    ParseFailure { context: String, message: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CartridgeError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }

    pub fn parse(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ParseFailure {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Adapter for `map_err` on `std::fs` calls
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, CartridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CartridgeError::not_found("module", "g123");
        assert_eq!(err.to_string(), "module not found: g123");

        let err = CartridgeError::InvalidPackage {
            path: PathBuf::from("/tmp/pkg"),
            reason: "missing imsmanifest.xml".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid package at /tmp/pkg: missing imsmanifest.xml"
        );

        let err = CartridgeError::invalid_name("../x.txt", "contains a path separator");
        assert_eq!(
            err.to_string(),
            "Invalid file name \"../x.txt\": contains a path separator"
        );
    }

    #[test]
    fn test_io_adapter_keeps_source() {
        use std::error::Error as _;

        let missing =
            std::fs::read("/definitely/not/here").map_err(CartridgeError::io("/definitely/not/here"));
        let err = missing.unwrap_err();
        assert!(matches!(err, CartridgeError::Io { .. }));
        assert!(err.source().is_some());
    }
}
