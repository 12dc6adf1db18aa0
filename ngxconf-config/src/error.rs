//! Error types for the configuration tree

use crate::parser::SyntaxError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for tree, model and include operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing, editing or expanding a configuration
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Removal requested on the model root
    #[error("Element has no parent")]
    DetachedElement,

    /// The model no longer matches the tree it was built from
    #[error("Element not found in its parent's body, the model is stale")]
    InconsistentModel,

    #[error("Malformed node: {0}")]
    MalformedNode(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No files match include pattern `{pattern}` in {}", base.display())]
    IncludeNotFound { pattern: String, base: PathBuf },

    #[error("Include cycle: {} includes itself", path.display())]
    IncludeCycle { path: PathBuf },

    #[error(transparent)]
    File(#[from] ngxconf_core::Error),
}
