//! File resolution
//!
//! `include` directives name files with glob patterns that are relative to
//! the including file. The parser never touches the filesystem itself: it asks
//! a [`FileResolver`] to expand patterns and to read file contents.

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Expands include patterns and reads configuration files
pub trait FileResolver {
    /// Expand `pattern` relative to `base`, returning matches in glob order.
    ///
    /// Absolute patterns ignore `base`. Zero matches is not an error here;
    /// the caller decides what an empty expansion means.
    fn glob(&self, base: &Path, pattern: &str) -> Result<Vec<PathBuf>>;

    /// Read the full text of a configuration file
    fn read(&self, path: &Path) -> Result<String>;
}

/// Resolver backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsResolver;

impl FileResolver for FsResolver {
    fn glob(&self, base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        let full = join_pattern(base, pattern);
        tracing::debug!("Expanding include pattern: {}", full);

        let paths = glob::glob(&full).map_err(|e| Error::Pattern {
            pattern: full.clone(),
            message: e.to_string(),
        })?;

        let mut matches = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                Error::io(path, std::io::Error::from(e))
            })?;
            let resolved = std::fs::canonicalize(&path).map_err(|e| Error::io(&path, e))?;
            matches.push(resolved);
        }

        Ok(matches)
    }

    fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }
}

/// In-memory resolver, mostly useful for tests and for embedding
#[derive(Debug, Default, Clone)]
pub struct MemoryResolver {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`MemoryResolver::insert`]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl FileResolver for MemoryResolver {
    fn glob(&self, base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        let full = join_pattern(base, pattern);
        let compiled = Pattern::new(&full).map_err(|e| Error::Pattern {
            pattern: full.clone(),
            message: e.to_string(),
        })?;

        // Same separator semantics as a filesystem glob: `*` stops at `/`
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };

        Ok(self
            .files
            .keys()
            .filter(|path| compiled.matches_path_with(path, options))
            .cloned()
            .collect())
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file not registered"),
            )
        })
    }
}

/// Prefix a pattern with its (escaped) base directory unless it is absolute
fn join_pattern(base: &Path, pattern: &str) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }

    let escaped = Pattern::escape(&base.to_string_lossy());
    if escaped.is_empty() {
        pattern.to_string()
    } else {
        Path::new(&escaped).join(pattern).to_string_lossy().into_owned()
    }
}
