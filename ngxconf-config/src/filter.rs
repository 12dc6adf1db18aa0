//! Tree filters
//!
//! Every filter here rebuilds the tree top-down: a sequence is transformed
//! first, then each block of the transformed sequence has its body filtered
//! the same way. Statements that survive keep their raw tokens, so the
//! output renders with the original indentation.

use crate::dual::{DualView, Item};
use crate::error::Result;
use crate::node::{BodyRef, NodeRef};
use tracing::trace;

/// What to do with a node selected by [`apply_optional_op_filter`]
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Drop,
    Keep,
    /// Put another statement in place of the node
    Replace(Item),
    /// Put a whole sequence of statements in place of the node
    Splice(DualView),
}

/// Apply `transform` to the document and to every block body in it.
pub fn apply_filter<F>(tree: &DualView, mut transform: F) -> Result<DualView>
where
    F: FnMut(&DualView) -> Result<DualView>,
{
    filter_sequence(tree, &mut transform)
}

fn filter_sequence<F>(tree: &DualView, transform: &mut F) -> Result<DualView>
where
    F: FnMut(&DualView) -> Result<DualView>,
{
    let transformed = transform(tree)?;

    transformed.flat_map(|item| match item.as_node()? {
        NodeRef::Pair {
            body: BodyRef::Block(body),
            ..
        } => {
            let body = filter_sequence(body, &mut *transform)?;
            Ok(DualView::from(item.with_body(body)?))
        }
        _ => Ok(DualView::from(item.clone())),
    })
}

/// Call `node_fn` on every `[key, body]` node tagged with one of `tags`, or
/// on every node when `tags` is empty, and act on its [`Verdict`].
///
/// Nested bodies are visited whether or not their block was selected.
pub fn apply_optional_op_filter<F>(tree: &DualView, mut node_fn: F, tags: &[&str]) -> Result<DualView>
where
    F: FnMut(&Item) -> Result<Verdict>,
{
    apply_filter(tree, |sequence| {
        sequence.flat_map(|item| {
            let selected = match item.as_node()? {
                NodeRef::Pair { key, .. } => tags.is_empty() || tags.iter().any(|tag| key.matches(tag)),
                NodeRef::Leaf(_) => false,
            };
            if !selected {
                return Ok(DualView::from(item.clone()));
            }

            Ok(match node_fn(item)? {
                Verdict::Drop => DualView::new(),
                Verdict::Keep => DualView::from(item.clone()),
                Verdict::Replace(replacement) => DualView::from(replacement),
                Verdict::Splice(statements) => statements,
            })
        })
    })
}

/// Keep the nodes `keep` accepts, at every level
fn retain<P>(tree: &DualView, keep: P) -> Result<DualView>
where
    P: Fn(&NodeRef<'_>) -> bool,
{
    apply_filter(tree, |sequence| {
        sequence.flat_map(|item| {
            let node = item.as_node()?;
            if keep(&node) {
                Ok(DualView::from(item.clone()))
            } else {
                trace!("Filtering out {:?}", tag_of(&node));
                Ok(DualView::new())
            }
        })
    })
}

fn tag_of<'a>(node: &NodeRef<'a>) -> Option<&'a str> {
    match node {
        NodeRef::Pair { key, .. } => key.head(),
        NodeRef::Leaf(token) => Some(*token),
    }
}

/// Drop every node tagged with one of `tags`
pub fn filter_out(tree: &DualView, tags: &[&str]) -> Result<DualView> {
    retain(tree, |node| !node.is_tagged(tags))
}

/// Keep only the nodes tagged with one of `tags`. Inside a kept block, only
/// its tagged nodes survive too.
pub fn filter_only(tree: &DualView, tags: &[&str]) -> Result<DualView> {
    retain(tree, |node| node.is_tagged(tags))
}

/// Drop line comments plus any node tagged with one of `extra`
pub fn strip_comments(tree: &DualView, extra: &[&str]) -> Result<DualView> {
    let mut tags = Vec::with_capacity(extra.len() + 1);
    tags.push("#");
    tags.extend_from_slice(extra);
    filter_out(tree, &tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dumper::render;
    use crate::fixtures::COMPLEX;
    use crate::parser::parse;
    use proptest::prelude::*;

    const SIMPLE: &str = "user nginx;\nhttp {\n    sendfile on;\n    server {\n        listen 80;\n        root /a;\n    }\n}\n";

    #[test]
    fn test_filter_out_dummy_directives() {
        let doc = parse(COMPLEX).unwrap();
        let filtered = filter_out(&doc, &["types", "load_module", "events"]).unwrap();
        let out = render(&filtered);

        assert!(!out.contains("load_module"));
        assert!(!out.contains("events"));
        assert!(!out.contains("worker_connections"));
        assert!(out.contains("worker_processes  auto;"));
        assert!(out.contains("        location / {\n            root   /usr/share/nginx/html;"));
    }

    #[test]
    fn test_filter_out_nothing() {
        let doc = parse(COMPLEX).unwrap();
        let filtered = filter_out(&doc, &[]).unwrap();
        assert_eq!(render(&filtered), COMPLEX);
    }

    #[test]
    fn test_strip_comments() {
        let doc = parse(COMPLEX).unwrap();
        let stripped = strip_comments(&doc, &[]).unwrap();
        let out = render(&stripped);

        assert!(!out.contains('#'));
        assert!(out.contains("user  nginx;"));
        assert!(out.contains("''      close;"));

        let stripped = strip_comments(&doc, &["map"]).unwrap();
        assert!(!render(&stripped).contains("$connection_upgrade"));
    }

    #[test]
    fn test_filter_only_nested() {
        let doc = parse(SIMPLE).unwrap();
        let filtered = filter_only(&doc, &["http", "server", "listen"]).unwrap();
        assert_eq!(render(&filtered), "\nhttp {\n    server {\n        listen 80;\n    }\n}\n");
    }

    #[test]
    fn test_filter_only_without_tags() {
        let doc = parse(SIMPLE).unwrap();
        let filtered = filter_only(&doc, &[]).unwrap();
        assert!(filtered.is_empty());
        assert_eq!(render(&filtered), "\n");
    }

    #[test]
    fn test_filter_only_compound_keys() {
        let doc = parse(COMPLEX).unwrap();
        let filtered = filter_only(&doc, &["http", "server", "location", "proxy_pass"]).unwrap();
        let out = render(&filtered);

        assert!(out.contains("location ~* \\.(gif|jpg|png)$ {"));
        assert!(out.contains("proxy_pass http://backend;"));
        assert!(!out.contains("expires"));
        assert!(!out.contains("upstream"));
    }

    #[test]
    fn test_replace_keeps_formatting() {
        let doc = parse(SIMPLE).unwrap();
        let filtered = apply_optional_op_filter(
            &doc,
            |item| {
                let mut item = item.clone();
                if let Some(list) = item.as_list_mut() {
                    list.set(1, "8080")?;
                }
                Ok(Verdict::Replace(item))
            },
            &["listen"],
        )
        .unwrap();

        assert!(render(&filtered).contains("\n        listen 8080;\n        root /a;"));
    }

    #[test]
    fn test_splice_statements() {
        let doc = parse("http {\n    include proxy.conf;\n}\n").unwrap();
        let filtered = apply_optional_op_filter(
            &doc,
            |_| {
                let mut statements = DualView::new();
                statements.append(Item::directive("proxy_buffering", Some("off")).indented("\n    "));
                statements.append(Item::directive("proxy_http_version", Some("1.1")).indented("\n    "));
                Ok(Verdict::Splice(statements))
            },
            &["include"],
        )
        .unwrap();

        assert_eq!(
            render(&filtered),
            "http {\n    proxy_buffering off;\n    proxy_http_version 1.1;\n}\n"
        );
    }

    #[test]
    fn test_recursion_continues_past_matches() {
        let doc = parse("server { server { listen 1; } }\nlisten 2;").unwrap();
        let mut seen = Vec::new();
        let filtered = apply_optional_op_filter(
            &doc,
            |item| {
                seen.push(item.as_node()?.is_tagged(&["server"]));
                Ok(Verdict::Keep)
            },
            &["server"],
        )
        .unwrap();

        assert_eq!(seen, vec![true, true]);
        assert_eq!(render(&filtered), "server { server { listen 1; } }\nlisten 2;");
    }

    #[test]
    fn test_drop_all_with_empty_tags() {
        let doc = parse(SIMPLE).unwrap();
        let filtered = apply_optional_op_filter(&doc, |_| Ok(Verdict::Drop), &[]).unwrap();
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_apply_filter_reaches_every_body() {
        let doc = parse("a 1;\nb { c 2; }").unwrap();
        let filtered = apply_filter(&doc, |sequence| {
            let mut sequence = sequence.clone();
            sequence.append(Item::directive("x", None));
            Ok(sequence)
        })
        .unwrap();

        assert_eq!(render(&filtered), "a 1;\nb { c 2;x; }x;");
    }

    fn flat_document() -> impl Strategy<Value = String> {
        prop::collection::vec(("[a-d]", "[0-9]{1,3}"), 1..12).prop_map(|statements| {
            statements
                .into_iter()
                .map(|(key, value)| format!("{key} {value};\n"))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_only_and_out_partition_nodes(
            doc in flat_document(),
            tags in prop::sample::subsequence(vec!["a", "b", "c", "d"], 0..=4),
        ) {
            let tree = parse(&doc).unwrap();
            let only = filter_only(&tree, &tags).unwrap();
            let out = filter_out(&tree, &tags).unwrap();

            prop_assert_eq!(only.len() + out.len(), tree.len());
            for item in only.iter() {
                prop_assert!(item.as_node().unwrap().is_tagged(&tags));
            }
            for item in out.iter() {
                prop_assert!(!item.as_node().unwrap().is_tagged(&tags));
            }
        }
    }
}
