//! Errors — recoverable failures surfaced by constructors and configuration
//!
//! Precondition violations (comparing columns of unequal differentia width,
//! depositing at a non-increasing rank) are programming errors and panic
//! instead of flowing through this type.

/// Crate-wide error type
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    #[error("invalid retention policy parameter: {0}")]
    InvalidPolicy(String),
    #[error("differentia bit width must lie in 1..=64, got {0}")]
    InvalidBitWidth(u8),
    #[error("significance level must lie in (0, 1], got {0}")]
    InvalidSignificanceLevel(f64),
    #[error("confidence level must lie in [0, 1), got {0}")]
    InvalidConfidenceLevel(f64),
    #[error("inconsistent column checkpoint: {0}")]
    InvalidCheckpoint(String),
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StrataError>;
