//! Dual-view sequence
//!
//! A [`DualView`] owns the raw sequence produced by the parser together with
//! a visibility flag per entry. Visible entries form the semantic view that
//! callers index, edit and search. Hidden entries are the whitespace runs
//! that only matter when the tree is rendered back to text.
//!
//! All indices taken by the public API are semantic. Each mutation translates
//! the index into a raw position with [`DualView::raw_position`], so the
//! whitespace around the edited entry stays where it was.

use crate::error::{Error, Result};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Range};

/// One element of a [`DualView`]: a string token or a nested sequence
#[derive(Debug, Clone, PartialEq, Hash)]
pub enum Item {
    Token(String),
    List(DualView),
}

impl Item {
    /// Build a list item from raw tokens, hiding whitespace the way the
    /// parser does
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Item>,
    {
        Item::List(DualView::wrap(items.into_iter().map(Into::into)))
    }

    pub fn as_token(&self) -> Option<&str> {
        match self {
            Item::Token(token) => Some(token.as_str()),
            Item::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&DualView> {
        match self {
            Item::List(list) => Some(list),
            Item::Token(_) => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut DualView> {
        match self {
            Item::List(list) => Some(list),
            Item::Token(_) => None,
        }
    }

    /// True for a token made only of whitespace, including the empty token
    pub fn is_spacey(&self) -> bool {
        matches!(self, Item::Token(token) if is_spacey(token))
    }
}

/// Any Unicode whitespace counts, which is wider than what the lexer splits
/// on: a value made only of U+00A0 parses as a token but is hidden.
pub(crate) fn is_spacey(token: &str) -> bool {
    token.chars().all(char::is_whitespace)
}

impl From<&str> for Item {
    fn from(token: &str) -> Self {
        Item::Token(token.to_string())
    }
}

impl From<String> for Item {
    fn from(token: String) -> Self {
        Item::Token(token)
    }
}

impl From<DualView> for Item {
    fn from(list: DualView) -> Self {
        Item::List(list)
    }
}

#[derive(Debug, Clone, PartialEq, Hash)]
struct Entry {
    item: Item,
    visible: bool,
}

impl Entry {
    fn visible(item: Item) -> Self {
        Self {
            item,
            visible: true,
        }
    }
}

/// Whitespace-preserving sequence with a raw and a semantic view
///
/// Equality and hashing compare both views and ignore the modified flag.
#[derive(Debug, Clone, Default)]
pub struct DualView {
    entries: Vec<Entry>,
    modified: bool,
}

impl DualView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a raw sequence, hiding whitespace-only tokens.
    ///
    /// A whitespace-only token stays visible when a `#` token precedes it in
    /// the same sequence, so a comment made of blanks keeps its text.
    pub fn wrap<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Item>,
    {
        let mut after_hash = false;
        let entries = items
            .into_iter()
            .map(|item| {
                let visible = after_hash || !item.is_spacey();
                if item.as_token() == Some("#") {
                    after_hash = true;
                }
                Entry { item, visible }
            })
            .collect();

        Self {
            entries,
            modified: false,
        }
    }

    /// Semantic length
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.visible).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries in the raw view
    pub fn raw_len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.iter().nth(index)
    }

    /// Mutable access to a nested sequence at a semantic index
    pub fn child_mut(&mut self, index: usize) -> Option<&mut DualView> {
        let pos = self.raw_position(index)?;
        self.entries[pos].item.as_list_mut()
    }

    /// Iterate the semantic view
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.entries.iter().filter(|e| e.visible).map(|e| &e.item)
    }

    /// Iterate the raw view
    pub fn raw(&self) -> impl Iterator<Item = &Item> + '_ {
        self.entries.iter().map(|e| &e.item)
    }

    /// Serializable raw view
    pub fn spaced(&self) -> Spaced<'_> {
        Spaced(self)
    }

    /// Raw position of the entry at semantic `index`
    pub fn raw_position(&self, index: usize) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.visible)
            .nth(index)
            .map(|(pos, _)| pos)
    }

    fn position_or_err(&self, index: usize) -> Result<usize> {
        self.raw_position(index).ok_or_else(|| Error::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Insert before the entry at semantic `index`, or at the end when
    /// `index == len()`
    pub fn insert(&mut self, index: usize, item: impl Into<Item>) -> Result<()> {
        let pos = match self.raw_position(index) {
            Some(pos) => pos,
            None if index == self.len() => self.entries.len(),
            None => {
                return Err(Error::IndexOutOfRange {
                    index,
                    len: self.len(),
                });
            }
        };

        self.entries.insert(pos, Entry::visible(item.into()));
        self.modified = true;
        Ok(())
    }

    pub fn append(&mut self, item: impl Into<Item>) {
        self.entries.push(Entry::visible(item.into()));
        self.modified = true;
    }

    /// Append every entry of `other`, keeping its hidden whitespace
    pub fn extend(&mut self, other: DualView) {
        self.entries.extend(other.entries);
        self.modified = true;
    }

    pub fn set(&mut self, index: usize, item: impl Into<Item>) -> Result<()> {
        let pos = self.position_or_err(index)?;
        self.entries[pos] = Entry::visible(item.into());
        self.modified = true;
        Ok(())
    }

    /// Delete the entry at semantic `index` and return it
    pub fn delete(&mut self, index: usize) -> Result<Item> {
        let pos = self.position_or_err(index)?;
        let entry = self.entries.remove(pos);
        self.modified = true;
        Ok(entry.item)
    }

    /// True if this sequence or any nested one was mutated since creation
    pub fn is_modified(&self) -> bool {
        self.modified
            || self
                .entries
                .iter()
                .any(|e| matches!(&e.item, Item::List(list) if list.is_modified()))
    }

    /// Rebuild the sequence by mapping every semantic entry to a fragment.
    ///
    /// Hidden entries are copied through in place. The result counts as
    /// modified.
    pub fn flat_map<F>(&self, mut f: F) -> Result<DualView>
    where
        F: FnMut(&Item) -> Result<DualView>,
    {
        let mut out = DualView {
            entries: Vec::with_capacity(self.entries.len()),
            modified: true,
        };

        for entry in &self.entries {
            if entry.visible {
                out.entries.extend(f(&entry.item)?.entries);
            } else {
                out.entries.push(entry.clone());
            }
        }

        Ok(out)
    }

    // ========================================
    // Operations without a raw-view meaning
    // ========================================

    pub fn remove(&mut self, _item: &Item) -> Result<()> {
        Err(Error::UnsupportedOperation("remove by value"))
    }

    pub fn pop(&mut self) -> Result<Item> {
        Err(Error::UnsupportedOperation("pop"))
    }

    pub fn reverse(&mut self) -> Result<()> {
        Err(Error::UnsupportedOperation("reverse"))
    }

    pub fn sort(&mut self) -> Result<()> {
        Err(Error::UnsupportedOperation("sort"))
    }

    pub fn splice<I>(&mut self, _range: Range<usize>, _items: I) -> Result<()>
    where
        I: IntoIterator<Item = Item>,
    {
        Err(Error::UnsupportedOperation("slice assignment"))
    }
}

/// A single visible entry
impl From<Item> for DualView {
    fn from(item: Item) -> Self {
        Self {
            entries: vec![Entry::visible(item)],
            modified: false,
        }
    }
}

impl PartialEq for DualView {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Hash for DualView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.hash(state);
    }
}

impl Add for DualView {
    type Output = DualView;

    fn add(mut self, rhs: DualView) -> DualView {
        self.extend(rhs);
        self
    }
}

impl fmt::Display for DualView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::dumper::render(self))
    }
}

// ============================================================
// Serde
// ============================================================

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Item::Token(token) => serializer.serialize_str(token),
            Item::List(list) => list.serialize(serializer),
        }
    }
}

impl Serialize for DualView {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self.iter() {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

/// Raw view of a [`DualView`] for serialization
pub struct Spaced<'a>(&'a DualView);

impl Serialize for Spaced<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.raw_len()))?;
        for item in self.0.raw() {
            match item {
                Item::Token(token) => seq.serialize_element(token)?,
                Item::List(list) => seq.serialize_element(&list.spaced())?,
            }
        }
        seq.end()
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawNode {
    Token(String),
    List(Vec<RawNode>),
}

impl RawNode {
    fn into_item(self) -> Item {
        match self {
            RawNode::Token(token) => Item::Token(token),
            RawNode::List(items) => Item::List(DualView::wrap(items.into_iter().map(RawNode::into_item))),
        }
    }
}

/// Nested arrays of strings, read as a raw sequence and wrapped
impl<'de> Deserialize<'de> for DualView {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let items = Vec::<RawNode>::deserialize(deserializer)?;
        Ok(DualView::wrap(items.into_iter().map(RawNode::into_item)))
    }
}
