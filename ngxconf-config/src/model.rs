//! Structural model
//!
//! A [`Model`] is a navigable directive tree derived from a [`DualView`].
//! Directives live in a flat arena and refer to each other by
//! [`DirectiveId`]; each one also records the semantic index path that leads
//! to its raw node, which is how [`Model::remove`] finds it again in the
//! tree, plus a fingerprint of that node to check the tree still matches.
//! The model is never patched: after the tree changes it is rebuilt.

use crate::dual::{DualView, Item};
use crate::error::{Error, Result};
use crate::node::{BodyRef, Key, NodeRef};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::ops::Index;

/// Handle to a directive inside a [`Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectiveId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveValue {
    Text(Option<String>),
    Block(Vec<DirectiveId>),
}

/// A directive or block, with a back reference to its enclosing block
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// `None` for the document root
    pub key: Option<Key>,
    pub value: DirectiveValue,
    pub parent: Option<DirectiveId>,
    /// Semantic indices from the document root down to the raw node
    pub path: Vec<usize>,
    /// Hash of the raw node this directive was built from
    fingerprint: u64,
}

impl Directive {
    pub fn is_block(&self) -> bool {
        matches!(self.value, DirectiveValue::Block(_))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            DirectiveValue::Text(text) => text.as_deref(),
            DirectiveValue::Block(_) => None,
        }
    }

    pub fn children(&self) -> &[DirectiveId] {
        match &self.value {
            DirectiveValue::Block(children) => children,
            DirectiveValue::Text(_) => &[],
        }
    }
}

/// Directive tree over a document
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    nodes: Vec<Directive>,
}

impl Model {
    /// Build the model of a document. Every semantic entry of the document
    /// and of each block body must be a `[key, value]` pair.
    pub fn build(tree: &DualView) -> Result<Model> {
        let mut model = Model { nodes: Vec::new() };
        model.nodes.push(Directive {
            key: None,
            value: DirectiveValue::Block(Vec::new()),
            parent: None,
            path: Vec::new(),
            fingerprint: 0,
        });

        let children = model.build_body(tree, DirectiveId(0), &[])?;
        model.nodes[0].value = DirectiveValue::Block(children);

        tracing::debug!("Built model with {} directives", model.nodes.len() - 1);
        Ok(model)
    }

    fn build_body(
        &mut self,
        body: &DualView,
        parent: DirectiveId,
        prefix: &[usize],
    ) -> Result<Vec<DirectiveId>> {
        let mut children = Vec::with_capacity(body.len());

        for (index, item) in body.iter().enumerate() {
            let NodeRef::Pair { key, body: child_body } = item.as_node()? else {
                return Err(Error::MalformedNode(format!(
                    "directive expected, found token {:?}",
                    item.as_token().unwrap_or_default()
                )));
            };

            let mut path = prefix.to_vec();
            path.push(index);

            let id = DirectiveId(self.nodes.len());
            self.nodes.push(Directive {
                key: Some(key.to_key()),
                value: DirectiveValue::Text(None),
                parent: Some(parent),
                path: path.clone(),
                fingerprint: fingerprint(item),
            });

            self.nodes[id.0].value = match child_body {
                BodyRef::Value(text) => DirectiveValue::Text(text.map(str::to_string)),
                BodyRef::Block(block) => DirectiveValue::Block(self.build_body(block, id, &path)?),
            };
            children.push(id);
        }

        Ok(children)
    }

    pub fn root(&self) -> DirectiveId {
        DirectiveId(0)
    }

    pub fn get(&self, id: DirectiveId) -> Option<&Directive> {
        self.nodes.get(id.0)
    }

    /// Number of directives, the root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// All directives matching `path`, in document order.
    ///
    /// A segment matches a plain key equal to it or an opener whose first
    /// word equals it. Blocks that do not match the current segment are
    /// searched for it too, so intermediate blocks may be skipped. An empty
    /// path yields the root.
    pub fn find(&self, path: &[&str]) -> Vec<DirectiveId> {
        if path.is_empty() {
            return vec![self.root()];
        }

        let mut found = Vec::new();
        self.find_in(self.root(), path, &mut found);
        found
    }

    fn find_in(&self, block: DirectiveId, path: &[&str], found: &mut Vec<DirectiveId>) {
        let Some((segment, rest)) = path.split_first() else {
            return;
        };

        for &child in self[block].children() {
            let node = &self[child];
            let matched = node.key.as_ref().is_some_and(|key| key.matches(segment));

            if matched && rest.is_empty() {
                found.push(child);
            } else if matched {
                self.find_in(child, rest, found);
            } else if node.is_block() {
                self.find_in(child, path, found);
            }
        }
    }

    /// Delete a directive's raw node from `doc` and rebuild the model.
    ///
    /// `doc` must be the tree this model was built from. Sibling formatting
    /// is untouched.
    pub fn remove(&self, doc: &mut DualView, id: DirectiveId) -> Result<Model> {
        let node = self.get(id).ok_or(Error::InconsistentModel)?;
        if node.parent.is_none() {
            return Err(Error::DetachedElement);
        }

        let Some((&last, ancestors)) = node.path.split_last() else {
            return Err(Error::DetachedElement);
        };

        let mut body = &mut *doc;
        for &index in ancestors {
            body = body
                .child_mut(index)
                .and_then(|block| block.child_mut(1))
                .ok_or(Error::InconsistentModel)?;
        }

        if body.get(last).map(fingerprint) != Some(node.fingerprint) {
            return Err(Error::InconsistentModel);
        }
        body.delete(last)?;

        tracing::debug!("Removed directive at {:?}, rebuilding model", node.path);
        Model::build(doc)
    }
}

impl Index<DirectiveId> for Model {
    type Output = Directive;

    fn index(&self, id: DirectiveId) -> &Directive {
        &self.nodes[id.0]
    }
}

/// A value found by [`find_elems`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Found<'a> {
    Value(Option<&'a str>),
    Block(&'a DualView),
}

/// Values and block bodies matching `path`, straight from the tree.
///
/// Uses the same matching rule as [`Model::find`]. An empty path yields the
/// tree itself.
pub fn find_elems<'a>(tree: &'a DualView, path: &[&str]) -> Result<Vec<Found<'a>>> {
    if path.is_empty() {
        return Ok(vec![Found::Block(tree)]);
    }

    let mut found = Vec::new();
    find_elems_in(tree, path, &mut found)?;
    Ok(found)
}

fn find_elems_in<'a>(body: &'a DualView, path: &[&str], found: &mut Vec<Found<'a>>) -> Result<()> {
    let Some((segment, rest)) = path.split_first() else {
        return Ok(());
    };

    for item in body.iter() {
        let NodeRef::Pair { key, body } = item.as_node()? else {
            return Err(Error::MalformedNode(format!(
                "[key, value] pair expected, found token {:?}",
                item.as_token().unwrap_or_default()
            )));
        };
        let matched = key.matches(segment);

        match body {
            BodyRef::Value(value) if matched && rest.is_empty() => found.push(Found::Value(value)),
            BodyRef::Block(block) if matched && rest.is_empty() => found.push(Found::Block(block)),
            BodyRef::Block(block) if matched => find_elems_in(block, rest, found)?,
            BodyRef::Block(block) => find_elems_in(block, path, found)?,
            BodyRef::Value(_) => {}
        }
    }

    Ok(())
}

impl<'a> Found<'a> {
    pub fn as_value(&self) -> Option<&'a str> {
        match self {
            Found::Value(value) => *value,
            Found::Block(_) => None,
        }
    }
}

fn fingerprint(item: &Item) -> u64 {
    let mut hasher = DefaultHasher::new();
    item.hash(&mut hasher);
    hasher.finish()
}
