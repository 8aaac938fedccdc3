//! Decoder Errors
//!
//! Every failure of the tokenizer, the command parser and the frame splitter
//! is reported as a [`ProtocolError`]. None of them are fatal: the connection
//! replies with an error and keeps serving.

use crate::protocol::token::TokenKind;
use crate::protocol::types::RespValue;
use thiserror::Error;

/// Errors raised while decoding a RESP request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A byte that cannot start a token
    #[error("unexpected byte {byte:#04x} at position {pos}")]
    UnexpectedByte { byte: u8, pos: usize },

    /// `\r` not followed by `\n`
    #[error("expected '\\n' after '\\r' at position {pos}")]
    MissingLineFeed { pos: usize },

    /// Non-digit inside a length field, or the length is empty/too large
    #[error("invalid length at position {pos}")]
    InvalidLength { pos: usize },

    /// A bulk string declares more bytes than the input holds
    #[error("bulk string length {length} exceeds input at position {pos}")]
    LengthExceedsInput { length: usize, pos: usize },

    /// The input stopped in the middle of a token
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The parser met a token of the wrong kind for its current state
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
    },

    /// A bulk string header token that is not a non-negative integer
    #[error("invalid bulk length '{0}'")]
    InvalidBulkLength(String),

    /// An array header that is not a non-negative integer
    #[error("invalid array length '{0}'")]
    InvalidArrayLength(String),

    /// The array header disagrees with the number of elements read
    #[error("wrong array length, expected: {expected}, actual: {actual}")]
    WrongArrayLength { expected: usize, actual: usize },

    /// A structurally valid command whose name is not recognized
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Command name bytes are not valid UTF-8
    #[error("command name is not valid UTF-8")]
    InvalidCommandName,

    /// The request did not contain a command name
    #[error("empty command")]
    EmptyCommand,
}

/// Result type for decoding operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl From<ProtocolError> for RespValue {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnknownCommand(name) => {
                RespValue::error(format!("ERR unknown command '{}'", name))
            }
            err => RespValue::error(format!("ERR Protocol error: {}", err)),
        }
    }
}
