//! ngxconf Core Library
//!
//! Shared pieces for the ngxconf workspace: the error type and the file
//! resolution collaborator used to expand `include` directives.

pub mod error;
pub mod resolver;

pub use error::{Error, Result};
pub use resolver::{FileResolver, FsResolver, MemoryResolver};

/// ngxconf version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Conventional location of the main nginx configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nginx/nginx.conf";
