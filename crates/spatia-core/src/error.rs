//! Error types for spatia-core.

use thiserror::Error;

/// Error type for spatia-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid loop region: begin={begin}, end={end}")]
    InvalidLoopRegion { begin: f64, end: f64 },

    #[error("Invalid tempo: {0}. Must be positive")]
    InvalidTempo(f64),

    #[error("Invalid time signature: {numerator}/{denominator}")]
    InvalidTimeSignature { numerator: u32, denominator: u32 },
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
