//! Error types for tribvh.
//!
//! Building a hierarchy never fails; these errors come from the layers around
//! it: configuration loading, raw triangle input and structural validation.

use thiserror::Error;

/// Main error type for tribvh operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Build configuration is out of range
    #[error("Invalid build config: {0}")]
    InvalidConfig(String),

    /// Triangle input could not be interpreted
    #[error("Invalid triangle input: {0}")]
    InvalidInput(String),

    /// A node breaks one of the hierarchy invariants
    #[error("Invalid BVH at node {node}: {reason}")]
    InvalidTree { node: usize, reason: String },

    /// Model index out of bounds
    #[error("Model index {index} out of bounds (count: {count})")]
    ModelOutOfBounds { index: usize, count: usize },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid tree error for `node`.
    pub fn tree(node: usize, reason: impl Into<String>) -> Self {
        Self::InvalidTree {
            node,
            reason: reason.into(),
        }
    }

    /// Create an invalid config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type alias for tribvh operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::tree(7, "child range overlaps");
        assert!(e.to_string().contains("node 7"));
        assert!(e.to_string().contains("overlaps"));

        let e = Error::ModelOutOfBounds { index: 5, count: 3 };
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
