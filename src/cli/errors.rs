use std::path::PathBuf;

use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Expected 3 values (red, green, blue) for {arg}, got {count}")]
    InvalidTriple { arg: &'static str, count: usize },

    #[error("Basemap file does not exist: {path:?}")]
    MissingBasemap { path: PathBuf },

    #[error(transparent)]
    Library(#[from] landsat_truecolor::Error),
}
