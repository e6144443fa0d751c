//! # Error Types for Strata
//!
//! Unified error handling across all Strata crates.
//!
//! None of these failures are transient: there is no I/O on the hot path, so
//! callers never retry. Every operation that fails leaves the generation store
//! exactly as it was before the call.

use thiserror::Error;

/// Main error type for Strata operations
#[derive(Error, Debug)]
pub enum StrataError {
    /// The history has no slot left for the requested generation.
    /// Recoverable only by starting a new run.
    #[error("history limit reached: generation {generation} exceeds capacity {capacity}")]
    CapacityExceeded { generation: u32, capacity: u32 },

    /// A generation above the current one was requested
    #[error("generation {requested} is out of range (current generation is {current})")]
    OutOfRangeGeneration { requested: u32, current: u32 },

    /// Brush radius or position is unusable
    #[error("Invalid brush parameters: {0}")]
    InvalidBrushParameters(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// GPU-specific error
    #[error("GPU error: {0}")]
    Gpu(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for Strata operations
pub type StrataResult<T> = Result<T, StrataError>;

impl StrataError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a GPU error
    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }

    /// Create a brush error
    pub fn brush(msg: impl Into<String>) -> Self {
        Self::InvalidBrushParameters(msg.into())
    }

    /// True for the "history limit reached" condition
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }
}

impl From<serde_json::Error> for StrataError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message() {
        let err = StrataError::CapacityExceeded {
            generation: 5,
            capacity: 5,
        };
        assert!(err.is_capacity());
        assert!(err.to_string().starts_with("history limit reached"));
    }

    #[test]
    fn test_helpers() {
        assert!(matches!(StrataError::gpu("lost"), StrataError::Gpu(m) if m == "lost"));
        assert!(!StrataError::brush("negative").is_capacity());
    }
}
