use thiserror::Error;

/// Unified error type for the sorted-set engine.
///
/// Lookups report absence through `Option`/`bool`. Only operations that
/// cannot produce any answer for a missing key return an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No sorted set is stored under the key.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Rejected configuration.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;
