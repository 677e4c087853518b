//! Error types for spatia-scene.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Too many sources: {count} (max {max})")]
    TooManySources { count: usize, max: usize },
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
