//! RESP Tokenizer
//!
//! The first decoding stage. It turns a raw request into a flat list of
//! [`Token`]s without interpreting the nesting; that is left to the
//! [`parser`](crate::protocol::parser).
//!
//! ## State Machine
//!
//! ```text
//!            '$'                    "\r\n"
//! Initial ───────> ReadingLength ──────────> ReadingString
//!    ▲                                            │
//!    └──────────── <length> bytes captured ───────┘
//! ```
//!
//! - `Initial`: a sigil (`*`, `$`, `+`, `-`, `:`) opens a token, and every
//!   byte up to `\r` is accumulated into it.
//! - `ReadingLength`: only ASCII digits are allowed; they form the declared
//!   length of the following bulk string.
//! - `ReadingString`: exactly `length` bytes are captured as one token and
//!   must be followed by CRLF. This fixed-length read is what makes bulk
//!   strings binary-safe: the payload may contain sigils or CRLF.
//!
//! A `\r` always closes the pending token and must be followed by `\n`.

use crate::protocol::error::{ProtocolError, ProtocolResult};
use crate::protocol::token::{Token, TokenKind};
use crate::protocol::types::prefix;
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Initial,
    ReadingLength,
    ReadingString,
}

/// Single-use tokenizer over one request.
#[derive(Debug)]
pub struct Tokenizer {
    input: Bytes,
    pos: usize,
    state: LexState,
    /// Declared length of the next bulk string
    length: usize,
    /// Kind of the token being accumulated, if any
    pending: Option<TokenKind>,
    value: Vec<u8>,
    tokens: Vec<Token>,
}

impl Tokenizer {
    pub fn new(input: Bytes) -> Self {
        Self {
            input,
            pos: 0,
            state: LexState::Initial,
            length: 0,
            pending: None,
            value: Vec::new(),
            tokens: Vec::new(),
        }
    }

    /// Runs the state machine to the end of the input.
    pub fn tokenize(mut self) -> ProtocolResult<Vec<Token>> {
        while self.pos < self.input.len() || self.state == LexState::ReadingString {
            if self.state == LexState::ReadingString {
                self.read_bulk_string()?;
                continue;
            }

            let byte = self.input[self.pos];
            self.pos += 1;

            match (byte, self.state) {
                (b'\r', _) => self.terminate()?,
                (_, LexState::ReadingLength) => self.push_digit(byte)?,
                _ => self.accept(byte)?,
            }
        }

        if self.pending.is_some() {
            return Err(ProtocolError::UnexpectedEof);
        }

        Ok(self.tokens)
    }

    /// Handles a byte in the `Initial` state.
    fn accept(&mut self, byte: u8) -> ProtocolResult<()> {
        if self.pending.is_some() {
            self.value.push(byte);
            return Ok(());
        }

        let kind = match byte {
            prefix::ARRAY => TokenKind::Array,
            prefix::BULK_STRING => TokenKind::BulkStringHeader,
            prefix::SIMPLE_STRING => TokenKind::SimpleString,
            prefix::ERROR => TokenKind::Error,
            prefix::INTEGER => TokenKind::Integer,
            _ => {
                return Err(ProtocolError::UnexpectedByte {
                    byte,
                    pos: self.pos - 1,
                })
            }
        };

        if kind == TokenKind::BulkStringHeader {
            self.state = LexState::ReadingLength;
            self.length = 0;
        }
        self.pending = Some(kind);
        Ok(())
    }

    fn push_digit(&mut self, byte: u8) -> ProtocolResult<()> {
        let invalid = ProtocolError::InvalidLength { pos: self.pos - 1 };
        if !byte.is_ascii_digit() {
            return Err(invalid);
        }

        self.length = self
            .length
            .checked_mul(10)
            .and_then(|n| n.checked_add(usize::from(byte - b'0')))
            .ok_or(invalid)?;
        self.value.push(byte);
        Ok(())
    }

    /// Handles `\r`: closes the pending token and emits CRLF.
    fn terminate(&mut self) -> ProtocolResult<()> {
        if self.state == LexState::ReadingLength && self.value.is_empty() {
            return Err(ProtocolError::InvalidLength { pos: self.pos - 1 });
        }

        self.push_pending();

        match self.input.get(self.pos) {
            Some(&b'\n') => self.pos += 1,
            _ => return Err(ProtocolError::MissingLineFeed { pos: self.pos }),
        }
        self.tokens.push(Token::crlf());

        if self.state == LexState::ReadingLength {
            self.state = LexState::ReadingString;
        }
        Ok(())
    }

    fn push_pending(&mut self) {
        if let Some(kind) = self.pending.take() {
            let value = Bytes::from(std::mem::take(&mut self.value));
            self.tokens.push(Token::new(kind, value));
        }
    }

    /// Captures exactly `length` bytes as a string token, followed by the
    /// mandatory CRLF.
    fn read_bulk_string(&mut self) -> ProtocolResult<()> {
        let end = self
            .pos
            .checked_add(self.length)
            .filter(|&end| end <= self.input.len())
            .ok_or(ProtocolError::LengthExceedsInput {
                length: self.length,
                pos: self.pos,
            })?;

        match self.input.get(end) {
            Some(&b'\r') => {}
            Some(&byte) => return Err(ProtocolError::UnexpectedByte { byte, pos: end }),
            None => return Err(ProtocolError::UnexpectedEof),
        }
        if self.input.get(end + 1) != Some(&b'\n') {
            return Err(ProtocolError::MissingLineFeed { pos: end + 1 });
        }

        let payload = self.input.slice(self.pos..end);
        self.tokens.push(Token::new(TokenKind::String, payload));
        self.tokens.push(Token::crlf());
        self.pos = end + 2;
        self.state = LexState::Initial;
        Ok(())
    }
}

/// Tokenizes a complete request.
pub fn tokenize(input: &[u8]) -> ProtocolResult<Vec<Token>> {
    Tokenizer::new(Bytes::copy_from_slice(input)).tokenize()
}
