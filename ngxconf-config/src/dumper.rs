//! Render a tree back to configuration text
//!
//! Rendering walks the raw view, so every whitespace token the parser kept is
//! written back where it was. Separators are only invented for entries that
//! carry none, i.e. nodes built or edited through the API.

use crate::dual::{DualView, Item};

/// Render a document or block body
pub fn render(tree: &DualView) -> String {
    let mut out = String::new();
    render_statements(tree, &mut out);
    out
}

fn render_statements(list: &DualView, out: &mut String) {
    for item in list.raw() {
        match item {
            Item::Token(token) => out.push_str(token),
            Item::List(statement) => render_statement(statement, out),
        }
    }
}

fn render_statement(statement: &DualView, out: &mut String) {
    let mut raw = statement.raw().peekable();

    // Indentation
    if let Some(indent) = raw.next_if(|item| item.is_spacey()) {
        push_words(indent, out);
    }

    let Some(key) = raw.next() else {
        return;
    };
    let rest: Vec<&Item> = raw.collect();

    let is_block = matches!(key, Item::List(_)) || rest.iter().any(|item| matches!(item, Item::List(_)));
    if is_block {
        render_block(key, &rest, out);
        return;
    }

    push_words(key, out);
    if key.as_token() == Some("#") {
        for item in rest {
            push_words(item, out);
        }
        return;
    }

    let mut rest = rest.into_iter().peekable();
    let gap = rest.next_if(|item| item.is_spacey());
    let value = rest.next();

    match gap {
        Some(gap) => push_words(gap, out),
        None if value.is_some() => out.push(' '),
        None => {}
    }
    if let Some(value) = value {
        push_words(value, out);
    }
    out.push(';');

    for item in rest {
        push_words(item, out);
    }
}

/// `opener{body}` followed by the closing whitespace and `}`
fn render_block(opener: &Item, rest: &[&Item], out: &mut String) {
    push_words(opener, out);

    let body_at = rest.iter().position(|item| matches!(item, Item::List(_)));
    let (before, body, after) = match body_at {
        Some(i) => (&rest[..i], rest[i].as_list(), &rest[i + 1..]),
        None => (rest, None, &[][..]),
    };

    for item in before {
        push_words(item, out);
    }
    out.push('{');
    if let Some(body) = body {
        render_statements(body, out);
    }
    for item in after {
        push_words(item, out);
    }
    out.push('}');
}

/// Concatenate the raw tokens of an item
fn push_words(item: &Item, out: &mut String) {
    match item {
        Item::Token(token) => out.push_str(token),
        Item::List(list) => {
            for item in list.raw() {
                push_words(item, out);
            }
        }
    }
}
