//! nginx configuration parser
//!
//! Recursive descent over a byte offset into the source. Every whitespace run
//! becomes a token of the output so the tree renders back to the exact input:
//!
//! - a statement's leading whitespace is its first raw token
//! - whitespace between a key and its value is a gap token (`""` when the
//!   value follows the key directly)
//! - whitespace before a closing `}` is the third raw entry of the block
//! - whitespace at the end of the document is a trailing top-level token

use crate::dual::{DualView, Item};
use crate::parser::error::SyntaxError;
use crate::parser::lexer::{token_at, Location, Spanned, Token};

type ParseResult<T> = Result<T, SyntaxError>;

/// Location modifiers split off the first opener word, longest first
const MODIFIERS: [&str; 4] = ["^~", "~*", "~", "="];

/// Characters the lexer groups into whitespace tokens
const WHITESPACE: [char; 4] = [' ', '\t', '\r', '\n'];

/// Parser state
pub struct Parser<'s> {
    source: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source, pos: 0 }
    }

    /// Parse the entire document: one or more statements, then optional
    /// trailing whitespace
    pub fn parse(&mut self) -> ParseResult<DualView> {
        let mut items = Vec::new();

        loop {
            let leading = self.whitespace()?;
            match self.peek()? {
                None if items.is_empty() => return Err(self.error("directive")),
                None => {
                    items.extend(leading.map(Item::Token));
                    break;
                }
                Some(_) => items.push(self.parse_statement(leading)?),
            }
        }

        Ok(DualView::wrap(items))
    }

    // ========================================
    // Statements
    // ========================================

    fn parse_statement(&mut self, leading: Option<String>) -> ParseResult<Item> {
        match self.peek()? {
            Some(Token::Hash) => self.parse_comment(leading),
            Some(Token::Word | Token::Other | Token::Dollar | Token::Quoted) => {
                self.parse_directive(leading)
            }
            _ => Err(self.error("directive")),
        }
    }

    /// `#` and the rest of the line; the newline is left for the next
    /// statement
    fn parse_comment(&mut self, leading: Option<String>) -> ParseResult<Item> {
        self.pos += 1;
        let end = self.source[self.pos..]
            .find('\n')
            .map_or(self.source.len(), |i| self.pos + i);
        let rest = self.source[self.pos..end].to_string();
        self.pos = end;

        let mut raw: Vec<Item> = leading.map(Item::Token).into_iter().collect();
        raw.push(Item::from("#"));
        raw.push(Item::Token(rest));
        Ok(Item::list(raw))
    }

    fn parse_directive(&mut self, leading: Option<String>) -> ParseResult<Item> {
        let source = self.source;
        let key = self.parse_key()?;

        if key == "if" {
            if let Some(item) = self.parse_if(&leading)? {
                return Ok(item);
            }
        }

        let gap = self.whitespace()?;
        let value_start = self.pos;
        let run = self.scan_value()?;

        match self.peek()? {
            Some(Token::Semicolon) => {
                let value = &source[value_start..self.pos];
                self.pos += 1;
                Ok(assignment(leading, key, gap, value))
            }
            Some(Token::BlockOpen) => {
                self.pos += 1;
                let mut opener: Vec<Item> = leading.map(Item::Token).into_iter().collect();
                opener.push(Item::from(key));
                opener.extend(gap.map(Item::Token));
                opener.extend(self.opener_words(&run, key != "charset_map"));

                let (body, closing) = self.parse_contents(key == "map")?;
                Ok(block(opener, body, closing))
            }
            Some(Token::BlockClose) | None => Err(self.error("';'")),
            Some(_) => Err(self.error("';' or '{'")),
        }
    }

    /// `if (condition) {`. The condition ends at the `)` that balances the
    /// opening `(`; quoted spans are skipped, so they may hold parentheses
    /// and braces. Returns `None` without consuming input when the condition
    /// does not balance on its line or is not followed by `{`.
    fn parse_if(&mut self, leading: &Option<String>) -> ParseResult<Option<Item>> {
        let source = self.source;
        let start = self.pos;
        let gap = self.whitespace()?;
        let cond_start = self.pos;

        let close = condition_end(source, cond_start).filter(|&close| {
            source[close + 1..]
                .trim_start_matches(WHITESPACE)
                .starts_with('{')
        });
        let Some(close) = close else {
            self.pos = start;
            return Ok(None);
        };

        let condition = &source[cond_start..=close];
        self.pos = close + 1;
        let before_brace = self.whitespace()?;
        self.pos += 1;

        let mut opener: Vec<Item> = leading.clone().map(Item::Token).into_iter().collect();
        opener.push(Item::from("if"));
        opener.extend(gap.map(Item::Token));
        opener.push(Item::from(condition));
        opener.extend(before_brace.map(Item::Token));

        let (body, closing) = self.parse_contents(false)?;
        Ok(Some(block(opener, body, closing)))
    }

    /// Statements up to and including the closing `}`. Returns the body and
    /// the whitespace that preceded the `}`.
    fn parse_contents(&mut self, map_body: bool) -> ParseResult<(DualView, Option<String>)> {
        let mut items = Vec::new();

        loop {
            let leading = self.whitespace()?;
            match self.peek()? {
                None => return Err(self.error("'}'")),
                Some(Token::BlockClose) => {
                    self.pos += 1;
                    return Ok((DualView::wrap(items), leading));
                }
                Some(Token::Hash) => items.push(self.parse_comment(leading)?),
                Some(_) if map_body => items.push(self.parse_map_entry(leading)?),
                Some(_) => items.push(self.parse_statement(leading)?),
            }
        }
    }

    /// `pattern value;` inside a `map` block. The pattern is a quoted string
    /// or anything up to whitespace or `;`, braces included.
    fn parse_map_entry(&mut self, leading: Option<String>) -> ParseResult<Item> {
        let source = self.source;
        let pattern_start = self.pos;
        let quoted = match token_at(source, self.pos) {
            Ok(Some(tok)) if tok.value == Token::Quoted && tok.span.end - tok.span.start > 1 => {
                Some(tok.span.end)
            }
            _ => None,
        };
        self.pos = match quoted {
            Some(end) => end,
            None => {
                let rest = &source[self.pos..];
                let len = rest
                    .find(|c: char| WHITESPACE.contains(&c) || c == ';')
                    .unwrap_or(rest.len());
                self.pos + len
            }
        };
        let pattern = &source[pattern_start..self.pos];
        if pattern.is_empty() {
            return Err(self.error("map pattern"));
        }

        let gap = self.whitespace()?;
        let value_start = self.pos;
        self.scan_value()?;

        match self.peek()? {
            Some(Token::Semicolon) => {
                let value = &source[value_start..self.pos];
                self.pos += 1;
                Ok(assignment(leading, pattern, gap, value))
            }
            _ => Err(self.error("';'")),
        }
    }

    // ========================================
    // Values
    // ========================================

    /// Consume a value run: every token up to `;`, `{`, `}`, `,` or end of
    /// input. The terminator is not consumed.
    fn scan_value(&mut self) -> ParseResult<Vec<Spanned<Token>>> {
        let mut run = Vec::new();
        while let Some(tok) = self.lex()? {
            if tok.value.terminates_value() {
                break;
            }
            self.pos = tok.span.end;
            run.push(tok);
        }
        Ok(run)
    }

    /// Split an opener's argument run into words and the whitespace between
    /// them
    fn opener_words(&self, run: &[Spanned<Token>], split_modifier: bool) -> Vec<Item> {
        let mut items = Vec::new();
        let mut word: Option<Location> = None;
        let mut first_word = split_modifier;

        let mut flush = |word: &mut Option<Location>, items: &mut Vec<Item>| {
            if let Some(span) = word.take() {
                let text = &self.source[span.start..span.end];
                let modifier = MODIFIERS
                    .iter()
                    .find(|m| text.starts_with(**m))
                    .filter(|m| first_word && text.len() > m.len());
                match modifier {
                    Some(modifier) => {
                        items.push(Item::from(*modifier));
                        items.push(Item::from(&text[modifier.len()..]));
                    }
                    None => items.push(Item::from(text)),
                }
                first_word = false;
            }
        };

        for tok in run {
            if tok.value == Token::Whitespace {
                flush(&mut word, &mut items);
                items.push(Item::from(&self.source[tok.span.start..tok.span.end]));
            } else {
                word = Some(match word {
                    Some(span) => Location {
                        start: span.start,
                        end: tok.span.end,
                    },
                    None => tok.span,
                });
            }
        }
        flush(&mut word, &mut items);

        items
    }

    // ========================================
    // Token utilities
    // ========================================

    fn lex(&self) -> ParseResult<Option<Spanned<Token>>> {
        token_at(self.source, self.pos)
            .map_err(|e| SyntaxError::new(self.source, self.pos, "token", e.to_string()))
    }

    fn peek(&self) -> ParseResult<Option<Token>> {
        Ok(self.lex()?.map(|tok| tok.value))
    }

    fn whitespace(&mut self) -> ParseResult<Option<String>> {
        match self.lex()? {
            Some(tok) if tok.value == Token::Whitespace => {
                self.pos = tok.span.end;
                Ok(Some(self.source[tok.span.start..tok.span.end].to_string()))
            }
            _ => Ok(None),
        }
    }

    /// A directive name. Adjacent text extends a leading word, so entries
    /// like `0.5%` or `*.example.com` stay whole; `if` is never extended.
    fn parse_key(&mut self) -> ParseResult<&'s str> {
        let source = self.source;
        let start = self.pos;

        while let Some(tok) = self.lex()? {
            let extends = match tok.value {
                Token::Word | Token::Other | Token::Dollar => true,
                Token::Quoted => self.pos == start,
                _ => false,
            };
            if !extends || (self.pos > start && &source[start..self.pos] == "if") {
                break;
            }
            self.pos = tok.span.end;
        }

        if self.pos == start {
            return Err(self.error("directive name"));
        }
        Ok(&source[start..self.pos])
    }

    fn error(&self, expected: &str) -> SyntaxError {
        let found = match token_at(self.source, self.pos) {
            Ok(Some(tok)) => match tok.value {
                Token::Word | Token::Other | Token::Quoted | Token::Dollar => {
                    format!("{} `{}`", tok.value, &self.source[tok.span.start..tok.span.end])
                }
                other => other.to_string(),
            },
            Ok(None) => "end of input".to_string(),
            Err(e) => e.to_string(),
        };
        SyntaxError::new(self.source, self.pos, expected, found)
    }
}

/// Offset of the `)` closing the parenthesized condition at `start`. Lexed
/// token by token so quoted spans count as opaque text.
fn condition_end(source: &str, start: usize) -> Option<usize> {
    if !source[start..].starts_with('(') {
        return None;
    }

    let mut depth = 0usize;
    let mut pos = start;
    while let Ok(Some(tok)) = token_at(source, pos) {
        let text = &source[tok.span.start..tok.span.end];
        match tok.value {
            Token::Quoted if text.len() > 1 => {}
            Token::Whitespace if text.contains('\n') => return None,
            _ => {
                for (i, c) in text.char_indices() {
                    match c {
                        '(' => depth += 1,
                        ')' => {
                            depth = depth.saturating_sub(1);
                            if depth == 0 {
                                return Some(tok.span.start + i);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        pos = tok.span.end;
    }
    None
}

/// `[leading?, key, gap, value]`, or `[leading?, key, gap?]` without a value.
/// A present value always gets a gap token so the dumper does not invent a
/// space that was not in the source.
fn assignment(leading: Option<String>, key: &str, gap: Option<String>, value: &str) -> Item {
    let mut raw: Vec<Item> = leading.map(Item::Token).into_iter().collect();
    raw.push(Item::from(key));
    if value.is_empty() {
        raw.extend(gap.map(Item::Token));
    } else {
        raw.push(Item::Token(gap.unwrap_or_default()));
        raw.push(Item::from(value));
    }
    Item::list(raw)
}

/// `[opener, body, closing?]`
fn block(opener: Vec<Item>, body: DualView, closing: Option<String>) -> Item {
    let mut raw = vec![Item::list(opener), Item::List(body)];
    raw.extend(closing.map(Item::Token));
    Item::list(raw)
}

/// Parse a complete document
pub fn parse(source: &str) -> ParseResult<DualView> {
    let mut parser = Parser::new(source);
    parser.parse()
}
