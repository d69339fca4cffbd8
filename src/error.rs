//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, GDAL, fetch and numeric errors, and provides semantic
//! variants for configuration and rendering failures.
use std::path::PathBuf;

use thiserror::Error;

use crate::core::processing::composite::ShapeMismatch;
use crate::core::processing::stretch::StretchError;
use crate::types::Band;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::io::FetchError),

    #[error("Failed to stretch {band} band: {source}")]
    Stretch {
        band: Band,
        #[source]
        source: StretchError,
    },

    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatch),

    #[error("Invalid working folder {path:?}: {reason}")]
    InvalidWorkingFolder { path: PathBuf, reason: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Image encoding error: {0}")]
    Encode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    pub fn encode<E: std::fmt::Display>(e: E) -> Self {
        Error::Encode(e.to_string())
    }

    pub fn stretch(band: Band, source: StretchError) -> Self {
        Error::Stretch { band, source }
    }
}
