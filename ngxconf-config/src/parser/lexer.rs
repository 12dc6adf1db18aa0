//! Lexer for nginx configuration
//!
//! The grammar is context sensitive (a `#` opens a comment only at the start
//! of a statement, `map` bodies accept patterns a value would reject), so the
//! parser does not tokenize the whole source up front. It asks for one token
//! at a time at its current offset with [`token_at`] and decides from context
//! what the token means.
//!
//! Key features:
//! - Whitespace runs are tokens, never skipped
//! - Quoted spans and `${NAME}` substitutions are atomic, so the `;`, `{` and
//!   `}` they may contain do not terminate a value
//! - Quoted spans never cross a line end; an unbalanced quote lexes as a
//!   stray quote character

use logos::{Logos, Span};
use std::fmt;

/// Source location for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl From<Span> for Location {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Location,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: impl Into<Location>) -> Self {
        Self {
            value,
            span: span.into(),
        }
    }
}

/// Token types for nginx configuration syntax
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("#")]
    Hash,

    // ============================================================
    // Structural
    // ============================================================
    #[token("{")]
    BlockOpen,

    #[token("}")]
    BlockClose,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    // ============================================================
    // Values
    // ============================================================
    /// `"..."` or `'...'` on a single line, kept verbatim. A quote without a
    /// closing partner on the same line is a one character token.
    #[token("\"", quoted)]
    #[token("'", quoted)]
    Quoted,

    /// `$`, or a whole `${NAME}` substitution
    #[token("$", substitution)]
    Dollar,

    /// Key characters: alphanumerics plus `_ / + - .`
    #[regex(r"[A-Za-z0-9_/+.\-]+")]
    Word,

    /// Anything else that is neither whitespace nor special
    #[regex(r#"[^ \t\r\n#{};,"'$A-Za-z0-9_/+.\-]+"#)]
    Other,
}

impl Token {
    /// Tokens that end a generic value
    pub fn terminates_value(&self) -> bool {
        matches!(
            self,
            Token::BlockOpen | Token::BlockClose | Token::Semicolon | Token::Comma
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Whitespace => write!(f, "whitespace"),
            Token::Hash => write!(f, "'#'"),
            Token::BlockOpen => write!(f, "'{{'"),
            Token::BlockClose => write!(f, "'}}'"),
            Token::Semicolon => write!(f, "';'"),
            Token::Comma => write!(f, "','"),
            Token::Quoted => write!(f, "quoted string"),
            Token::Dollar => write!(f, "'$'"),
            Token::Word => write!(f, "word"),
            Token::Other => write!(f, "text"),
        }
    }
}

/// Extend a quote token up to its closing quote on the same line
fn quoted(lex: &mut logos::Lexer<Token>) -> bool {
    let quote = lex.slice().as_bytes()[0];
    let rest = lex.remainder().as_bytes();

    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b'\n' => break,
            b'\\' if rest.get(i + 1) == Some(&b'\n') => break,
            b'\\' => i += 2,
            b if b == quote => {
                lex.bump(i + 1);
                break;
            }
            _ => i += 1,
        }
    }
    true
}

/// Extend `$` over a following `{NAME}`
fn substitution(lex: &mut logos::Lexer<Token>) -> bool {
    let rest = lex.remainder().as_bytes();
    if rest.first() == Some(&b'{') {
        let name = rest[1..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count();
        if name > 0 && rest.get(name + 1) == Some(&b'}') {
            lex.bump(name + 2);
        }
    }
    true
}

/// Lexer error
#[derive(Debug, Clone, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character at position {position}")]
    UnexpectedChar { position: usize },
}

/// Lex the single token starting at byte `offset` of `source`.
///
/// Returns `Ok(None)` at end of input. Spans are absolute offsets into
/// `source`.
pub fn token_at(source: &str, offset: usize) -> Result<Option<Spanned<Token>>, LexError> {
    let rest = source.get(offset..).unwrap_or("");
    let mut lexer = Token::lexer(rest);

    match lexer.next() {
        None => Ok(None),
        Some(Ok(token)) => {
            let span = lexer.span();
            Ok(Some(Spanned::new(
                token,
                Location {
                    start: offset + span.start,
                    end: offset + span.end,
                },
            )))
        }
        Some(Err(_)) => Err(LexError::UnexpectedChar {
            position: offset + lexer.span().start,
        }),
    }
}
