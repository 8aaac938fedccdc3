//! Lexical tokens produced by the tokenizer.

use bytes::Bytes;
use std::fmt;

/// The kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `*<count>`
    Array,
    /// `$<length>`
    BulkStringHeader,
    /// `+<text>`
    SimpleString,
    /// `-<text>`
    Error,
    /// `:<digits>`
    Integer,
    /// The fixed-length payload following a bulk string header
    String,
    /// `\r\n`
    Crlf,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Array => "array header",
            TokenKind::BulkStringHeader => "bulk string header",
            TokenKind::SimpleString => "simple string",
            TokenKind::Error => "error",
            TokenKind::Integer => "integer",
            TokenKind::String => "string",
            TokenKind::Crlf => "CRLF",
        };
        f.write_str(name)
    }
}

/// A single token. Header tokens carry the text after their sigil
/// (`*2` has value `2`), string tokens carry the raw payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Bytes,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<Bytes>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// The `\r\n` terminator token.
    pub fn crlf() -> Self {
        Self::new(TokenKind::Crlf, Bytes::from_static(b"\r\n"))
    }

    /// Parses the value as a non-negative decimal number.
    ///
    /// Used for array and bulk string headers.
    pub fn as_length(&self) -> Option<usize> {
        // `usize::from_str` accepts a leading '+', RESP does not
        if self.value.is_empty() || !self.value.iter().all(u8::is_ascii_digit) {
            return None;
        }
        std::str::from_utf8(&self.value).ok()?.parse().ok()
    }
}
