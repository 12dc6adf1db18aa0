//! Error types for ngxconf

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ngxconf file operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while locating or reading configuration files
#[derive(Error, Debug)]
pub enum Error {
    /// IO error on a specific file
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Glob pattern could not be compiled or expanded
    #[error("Invalid glob pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
