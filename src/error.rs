//! Centralized error type for the spatia umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] spatia_core::Error),

    #[error("Scene: {0}")]
    Scene(#[from] spatia_scene::Error),

    #[error("DSP: {0}")]
    Dsp(#[from] spatia_dsp::Error),

    #[error("State: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not a saved Spatia state.
    #[error("Unrecognized state document (tag {found:?})")]
    UnrecognizedState { found: Option<String> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
