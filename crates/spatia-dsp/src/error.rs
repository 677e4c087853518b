//! Error types for spatia-dsp

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read HRIR dataset {path}: {source}")]
    DatasetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HRIR dataset too short: expected {expected} samples, found {found}")]
    DatasetTooShort { expected: usize, found: usize },

    #[error("Invalid grid shape: {0}")]
    InvalidGrid(String),
}

pub type Result<T> = std::result::Result<T, Error>;
