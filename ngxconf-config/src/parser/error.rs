//! Syntax errors with source positions

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use std::path::PathBuf;
use thiserror::Error;

/// The grammar could not consume the input up to the end of the document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Syntax error{} at line {line}, column {column}: expected {expected}, found {found}",
    in_file(.file)
)]
pub struct SyntaxError {
    /// Byte offset into the source
    pub offset: usize,
    /// 1-based
    pub line: usize,
    /// 1-based, in characters
    pub column: usize,
    pub expected: String,
    pub found: String,
    /// File the source was read from, when known
    pub file: Option<PathBuf>,
}

fn in_file(file: &Option<PathBuf>) -> String {
    match file {
        Some(path) => format!(" in {}", path.display()),
        None => String::new(),
    }
}

impl SyntaxError {
    pub fn new(
        source: &str,
        offset: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;

        Self {
            offset,
            line,
            column,
            expected: expected.into(),
            found: found.into(),
            file: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Render a plain-text diagnostic pointing at the failing offset
    pub fn report(&self, name: &str, source: &str) -> String {
        let start = self.offset.min(source.len());
        let end = source
            .get(start..)
            .and_then(|rest| rest.chars().next())
            .map_or(start, |c| start + c.len_utf8());
        let span = (name, start..end);

        let config = Config::default()
            .with_color(false)
            .with_index_type(IndexType::Byte);

        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, span.clone())
            .with_config(config)
            .with_message(format!("expected {}", self.expected))
            .with_label(Label::new(span).with_message(format!("found {}", self.found)))
            .finish()
            .write((name, Source::from(source)), &mut out);

        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}
