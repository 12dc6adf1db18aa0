//! Typed views over tree items
//!
//! The parser produces untyped nested sequences. A statement is a list whose
//! semantic view holds one or two entries: the key (a token, or a list of
//! words for block openers like `location ~* \.php$`) and the body (a value
//! token, or the nested sequence of a block). [`Item::as_node`] classifies an
//! item into that shape once so callers can match on it.

use crate::dual::{DualView, Item};
use crate::error::{Error, Result};
use std::path::Path;

/// Borrowed classification of an [`Item`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Leaf(&'a str),
    Pair { key: KeyRef<'a>, body: BodyRef<'a> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyRef<'a> {
    Plain(&'a str),
    Compound(&'a DualView),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyRef<'a> {
    /// Directive argument; `None` for `break;`
    Value(Option<&'a str>),
    Block(&'a DualView),
}

impl<'a> KeyRef<'a> {
    /// The directive name: the plain key or the first word of an opener
    pub fn head(&self) -> Option<&'a str> {
        match self {
            KeyRef::Plain(key) => Some(*key),
            KeyRef::Compound(words) => words.get(0).and_then(Item::as_token),
        }
    }

    /// Tag rule shared by searches and filters
    pub fn matches(&self, tag: &str) -> bool {
        self.head() == Some(tag)
    }

    pub fn to_key(&self) -> Key {
        match self {
            KeyRef::Plain(key) => Key::Plain(key.to_string()),
            KeyRef::Compound(words) => Key::Compound(
                words
                    .iter()
                    .filter_map(Item::as_token)
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

impl NodeRef<'_> {
    /// True if this is a pair whose key matches any of `tags`
    pub fn is_tagged(&self, tags: &[&str]) -> bool {
        match self {
            NodeRef::Pair { key, .. } => tags.iter().any(|tag| key.matches(tag)),
            NodeRef::Leaf(_) => false,
        }
    }
}

/// Owned directive key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Plain(String),
    Compound(Vec<String>),
}

impl Key {
    pub fn head(&self) -> Option<&str> {
        match self {
            Key::Plain(key) => Some(key.as_str()),
            Key::Compound(words) => words.first().map(String::as_str),
        }
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.head() == Some(tag)
    }
}

impl Item {
    /// Classify this item as a leaf token or a `[key, body]` pair
    pub fn as_node(&self) -> Result<NodeRef<'_>> {
        let list = match self {
            Item::Token(token) => return Ok(NodeRef::Leaf(token)),
            Item::List(list) => list,
        };

        let mut semantic = list.iter();
        let (first, second) = match (semantic.next(), semantic.next(), semantic.next()) {
            (Some(first), second, None) => (first, second),
            _ => {
                return Err(Error::MalformedNode(format!(
                    "expected a [key, value] pair, got {} entries",
                    list.len()
                )));
            }
        };

        let key = match first {
            Item::Token(key) => KeyRef::Plain(key),
            Item::List(words) => KeyRef::Compound(words),
        };
        let body = match second {
            None => BodyRef::Value(None),
            Some(Item::Token(value)) => BodyRef::Value(Some(value.as_str())),
            Some(Item::List(block)) => BodyRef::Block(block),
        };

        Ok(NodeRef::Pair { key, body })
    }

    // ========================================
    // Builders
    // ========================================

    /// `key value;`, or `key;` without a value
    pub fn directive(key: &str, value: Option<&str>) -> Item {
        match value {
            Some(value) => Item::list([key, " ", value]),
            None => Item::list([key]),
        }
    }

    /// A line comment; `text` is everything after the `#`
    pub fn comment(text: &str) -> Item {
        Item::list(["#", text])
    }

    /// `word word {body}` with single spaces between the opener words
    pub fn block(opener: &[&str], body: DualView) -> Item {
        let mut words = Vec::with_capacity(opener.len() * 2);
        for word in opener {
            words.push(Item::from(*word));
            words.push(Item::from(" "));
        }

        Item::list([Item::list(words), Item::List(body)])
    }

    /// `## path;` marker naming the file a fragment came from
    pub fn provenance(path: &Path) -> Item {
        let path = path.to_string_lossy();
        Item::list([crate::include::PROVENANCE_TAG, " ", path.as_ref(), "\n"])
    }

    /// Prefix a statement with leading whitespace
    pub fn indented(self, ws: &str) -> Item {
        match self {
            Item::List(list) => Item::List(DualView::wrap([Item::from(ws)]) + list),
            token => token,
        }
    }

    /// Same block with a different body, keeping the opener's formatting
    pub fn with_body(&self, body: DualView) -> Result<Item> {
        let mut item = self.clone();
        match item.as_list_mut() {
            Some(list) if list.len() == 2 => {
                list.set(1, body)?;
                Ok(item)
            }
            _ => Err(Error::MalformedNode("expected a block".to_string())),
        }
    }
}
