//! ngxconf Configuration Library
//!
//! This crate parses nginx configuration into a whitespace-preserving tree,
//! lets callers search, filter and edit it, and writes it back out. Text that
//! was not edited renders byte for byte as it was read.
//!
//! # Example
//!
//! ```rust
//! use ngxconf_config::{dumps, filter_out, loads, Model};
//!
//! let source = "user nginx;\nhttp {\n    # compression\n    gzip on;\n}\n";
//! let doc = loads(source).unwrap();
//! assert_eq!(dumps(&doc), source);
//!
//! let model = Model::build(&doc).unwrap();
//! let gzip = model.find(&["http", "gzip"]);
//! assert_eq!(model[gzip[0]].text(), Some("on"));
//!
//! let quiet = filter_out(&doc, &["#"]).unwrap();
//! assert_eq!(dumps(&quiet), "user nginx;\nhttp {\n    gzip on;\n}\n");
//! ```

pub mod dual;
pub mod dumper;
pub mod error;
pub mod filter;
pub mod include;
pub mod model;
pub mod node;
pub mod parser;

#[cfg(test)]
mod fixtures;

pub use dual::{DualView, Item};
pub use dumper::render;
pub use error::{Error, Result};
pub use filter::{apply_filter, apply_optional_op_filter, filter_only, filter_out, strip_comments, Verdict};
pub use include::{load_with_includes, IncludeOptions, MissingInclude, PROVENANCE_TAG};
pub use model::{find_elems, Directive, DirectiveId, DirectiveValue, Found, Model};
pub use node::{BodyRef, Key, KeyRef, NodeRef};
pub use parser::{parse, SyntaxError};

use ngxconf_core::{FileResolver, FsResolver};
use std::path::Path;

/// Parse configuration text
pub fn loads(source: &str) -> Result<DualView> {
    Ok(parser::parse(source)?)
}

/// Render a tree back to configuration text
pub fn dumps(tree: &DualView) -> String {
    dumper::render(tree)
}

/// Read and parse a single file. `include` directives are left as they are;
/// see [`load_with_includes`] to expand them.
pub fn load(path: impl AsRef<Path>) -> Result<DualView> {
    let path = path.as_ref();
    let source = FsResolver.read(path)?;
    Ok(parser::parse(&source).map_err(|e| e.with_file(path))?)
}

/// Render a tree and write it to `path`
pub fn dump(tree: &DualView, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    tracing::debug!("Writing {}", path.display());
    std::fs::write(path, dumps(tree)).map_err(|e| ngxconf_core::Error::io(path, e))?;
    Ok(())
}
