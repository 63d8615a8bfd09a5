//! Error types for loading and saving blueprint files

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlueprintError {
    #[error("Failed to read '{path}': {source}. Check that the file exists and is readable.")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid inputs file '{path}': {message}")]
    InvalidInputs { path: String, message: String },
}
