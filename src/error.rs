//! Error types for the memoization engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Memo Error Enum ==
/// Errors raised by the memoization layer itself.
///
/// Errors returned by a wrapped function are never converted into this type;
/// they reach the caller unchanged.
#[derive(Error, Debug)]
pub enum MemoError {
    /// The argument list could not be encoded into a cache key
    #[error("Cannot derive cache key: {0}")]
    KeyDerivation(#[from] serde_json::Error),

    /// A configuration option is out of range
    #[error("Invalid option `{name}`: {value}")]
    InvalidOption { name: &'static str, value: i64 },
}

// == Result Type Alias ==
/// Convenience Result type for the memoization engine.
pub type Result<T> = std::result::Result<T, MemoError>;
