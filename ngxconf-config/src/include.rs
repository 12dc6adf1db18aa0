//! Include expansion
//!
//! [`load_with_includes`] parses a file and replaces each `include pattern;`
//! directive with the parsed contents of every file the pattern matches.
//! Included documents are flattened into the including sequence, each one
//! prefixed with a `##` provenance marker naming its file.

use crate::dual::{DualView, Item};
use crate::error::{Error, Result};
use crate::node::{BodyRef, KeyRef, NodeRef};
use crate::parser::parse;
use ngxconf_core::FileResolver;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tag of the synthetic provenance marker
pub const PROVENANCE_TAG: &str = "##";

/// What an `include` whose pattern matches no file resolves to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingInclude {
    /// Fail with `IncludeNotFound`
    #[default]
    Error,
    /// Resolve to no content
    Skip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncludeOptions {
    pub on_missing: MissingInclude,
}

/// Load `path` through `resolver` and expand its includes recursively
pub fn load_with_includes(
    path: &Path,
    resolver: &dyn FileResolver,
    options: IncludeOptions,
) -> Result<DualView> {
    Loader {
        resolver,
        options,
        loading: Vec::new(),
    }
    .load(path)
}

struct Loader<'r> {
    resolver: &'r dyn FileResolver,
    options: IncludeOptions,
    /// Files currently being expanded, outermost first
    loading: Vec<PathBuf>,
}

impl Loader<'_> {
    fn load(&mut self, path: &Path) -> Result<DualView> {
        if self.loading.iter().any(|p| p == path) {
            return Err(Error::IncludeCycle {
                path: path.to_path_buf(),
            });
        }

        debug!("Loading {}", path.display());
        let source = self.resolver.read(path)?;
        let tree = parse(&source).map_err(|e| e.with_file(path))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        self.loading.push(path.to_path_buf());
        let expanded = self.expand(&tree, base);
        self.loading.pop();

        let mut doc = expanded?;
        doc.insert(0, Item::provenance(path))?;
        Ok(doc)
    }

    fn expand(&mut self, tree: &DualView, base: &Path) -> Result<DualView> {
        tree.flat_map(|item| match item.as_node()? {
            NodeRef::Pair {
                key: KeyRef::Plain("include"),
                body: BodyRef::Value(Some(pattern)),
            } => self.include(item, pattern, base),
            NodeRef::Pair {
                body: BodyRef::Block(body),
                ..
            } => {
                let body = self.expand(body, base)?;
                Ok(DualView::from(item.with_body(body)?))
            }
            _ => Ok(DualView::from(item.clone())),
        })
    }

    /// Statements replacing one `include` directive
    fn include(&mut self, directive: &Item, pattern: &str, base: &Path) -> Result<DualView> {
        let pattern = unquote(pattern);
        let matches = self.resolver.glob(base, pattern)?;

        if matches.is_empty() {
            return match self.options.on_missing {
                MissingInclude::Error => Err(Error::IncludeNotFound {
                    pattern: pattern.to_string(),
                    base: base.to_path_buf(),
                }),
                MissingInclude::Skip => {
                    warn!("No files match include pattern {} in {}, skipping", pattern, base.display());
                    Ok(DualView::new())
                }
            };
        }

        debug!("Expanding include {} into {} file(s)", pattern, matches.len());

        // The directive's indentation goes in front of the first fragment
        let indent = directive
            .as_list()
            .and_then(|list| list.raw().next())
            .filter(|item| item.is_spacey())
            .cloned();
        let mut statements = DualView::wrap(indent);

        for path in &matches {
            statements.extend(self.load(path)?);
        }
        Ok(statements)
    }
}

fn unquote(pattern: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = pattern
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dumper::render;
    use crate::model::Model;
    use ngxconf_core::MemoryResolver;

    fn load(resolver: &MemoryResolver, path: &str) -> Result<DualView> {
        load_with_includes(Path::new(path), resolver, IncludeOptions::default())
    }

    #[test]
    fn test_flatten_includes() {
        let resolver = MemoryResolver::new()
            .with_file("/etc/nginx/nginx.conf", "http {\n    include sites/*.conf;\n}\n")
            .with_file("/etc/nginx/sites/a.conf", "server { listen 80; }\n")
            .with_file("/etc/nginx/sites/b.conf", "server { listen 81; }\n");

        let doc = load(&resolver, "/etc/nginx/nginx.conf").unwrap();
        let model = Model::build(&doc).unwrap();

        let http = model.find(&["http"]);
        assert_eq!(http.len(), 1);
        let servers: Vec<_> = model[http[0]]
            .children()
            .iter()
            .filter(|&&id| model[id].key.as_ref().is_some_and(|k| k.matches("server")))
            .collect();
        assert_eq!(servers.len(), 2);
        assert!(servers.iter().all(|&&id| model[id].parent == Some(http[0])));

        assert_eq!(
            render(&doc),
            "## /etc/nginx/nginx.conf;\n\
             http {\n    \
             ## /etc/nginx/sites/a.conf;\n\
             server { listen 80; }\n\
             ## /etc/nginx/sites/b.conf;\n\
             server { listen 81; }\n\
             \n}\n"
        );
    }

    #[test]
    fn test_provenance_marker_comes_first() {
        let resolver = MemoryResolver::new().with_file("/etc/nginx/nginx.conf", "user nginx;\n");
        let doc = load(&resolver, "/etc/nginx/nginx.conf").unwrap();

        let marker = doc.get(0).unwrap().as_node().unwrap();
        assert!(marker.is_tagged(&[PROVENANCE_TAG]));
        assert!(matches!(
            marker,
            NodeRef::Pair { body: BodyRef::Value(Some("/etc/nginx/nginx.conf")), .. }
        ));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_relative_to_including_file() {
        let resolver = MemoryResolver::new()
            .with_file("/etc/nginx/nginx.conf", "include conf.d/main.conf;\n")
            .with_file("/etc/nginx/conf.d/main.conf", "include extra/*.conf;\n")
            .with_file("/etc/nginx/conf.d/extra/gzip.conf", "gzip on;\n");

        let doc = load(&resolver, "/etc/nginx/nginx.conf").unwrap();
        let model = Model::build(&doc).unwrap();
        let gzip = model.find(&["gzip"]);
        assert_eq!(gzip.len(), 1);
        assert_eq!(model[gzip[0]].text(), Some("on"));
        assert_eq!(model.find(&[PROVENANCE_TAG]).len(), 3);
    }

    #[test]
    fn test_quoted_pattern() {
        let resolver = MemoryResolver::new()
            .with_file("/etc/nginx/nginx.conf", "include \"mime.types\";\n")
            .with_file("/etc/nginx/mime.types", "types { text/html html; }\n");

        let doc = load(&resolver, "/etc/nginx/nginx.conf").unwrap();
        assert!(render(&doc).contains("types { text/html html; }"));
    }

    #[test]
    fn test_missing_include() {
        let resolver = MemoryResolver::new().with_file("/etc/nginx/nginx.conf", "include conf.d/*.conf;\nuser nginx;\n");

        let err = load(&resolver, "/etc/nginx/nginx.conf").unwrap_err();
        assert!(matches!(
            err,
            Error::IncludeNotFound { ref pattern, ref base }
                if pattern == "conf.d/*.conf" && base == Path::new("/etc/nginx")
        ));

        let options = IncludeOptions {
            on_missing: MissingInclude::Skip,
        };
        let doc = load_with_includes(Path::new("/etc/nginx/nginx.conf"), &resolver, options).unwrap();
        assert_eq!(render(&doc), "## /etc/nginx/nginx.conf;\n\nuser nginx;\n");
    }

    #[test]
    fn test_include_cycle() {
        let resolver = MemoryResolver::new()
            .with_file("/etc/nginx/a.conf", "include b.conf;\n")
            .with_file("/etc/nginx/b.conf", "include a.conf;\n");

        let err = load(&resolver, "/etc/nginx/a.conf").unwrap_err();
        assert!(matches!(err, Error::IncludeCycle { ref path } if path == Path::new("/etc/nginx/a.conf")));
    }

    #[test]
    fn test_same_file_twice_is_not_a_cycle() {
        let resolver = MemoryResolver::new()
            .with_file("/etc/nginx/nginx.conf", "include common.conf;\ninclude common.conf;\n")
            .with_file("/etc/nginx/common.conf", "charset utf-8;\n");

        let doc = load(&resolver, "/etc/nginx/nginx.conf").unwrap();
        let model = Model::build(&doc).unwrap();
        assert_eq!(model.find(&["charset"]).len(), 2);
    }

    #[test]
    fn test_syntax_error_names_file() {
        let resolver = MemoryResolver::new()
            .with_file("/etc/nginx/nginx.conf", "include broken.conf;\n")
            .with_file("/etc/nginx/broken.conf", "server {\n");

        let err = load(&resolver, "/etc/nginx/nginx.conf").unwrap_err();
        match err {
            Error::Syntax(e) => assert_eq!(e.file.as_deref(), Some(Path::new("/etc/nginx/broken.conf"))),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_root() {
        let resolver = MemoryResolver::new();
        let err = load(&resolver, "/etc/nginx/nginx.conf").unwrap_err();
        assert!(matches!(err, Error::File(ngxconf_core::Error::Io { .. })));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("'*.conf'"), "*.conf");
        assert_eq!(unquote("\"half"), "\"half");
        assert_eq!(unquote("plain"), "plain");
    }
}
