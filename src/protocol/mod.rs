//! RESP Protocol Implementation
//!
//! Requests are decoded in two stages, each a small finite-state machine:
//!
//! ```text
//!  raw bytes ──> Tokenizer ──> [Token] ──> Parser ──> Command
//! ```
//!
//! ## Modules
//!
//! - `frame`: finds where one request ends in a connection buffer
//! - `tokenizer`: bytes to a flat token list
//! - `parser`: token list to a validated [`Command`]
//! - `types`: `RespValue` replies and their serialization
//!
//! ## Example
//!
//! ```
//! use lexkv::protocol::{decode, RespValue};
//!
//! let command = decode(b"*2\r\n$4\r\nECHO\r\n$3\r\nHEY\r\n").unwrap();
//! assert_eq!(command.name, "ECHO");
//! assert_eq!(&command.args[0][..], b"HEY");
//!
//! assert_eq!(RespValue::pong().serialize(), b"+PONG\r\n");
//! ```

pub mod command;
pub mod error;
pub mod frame;
pub mod parser;
pub mod token;
pub mod tokenizer;
pub mod types;

// Re-export commonly used types for convenience
pub use command::Command;
pub use error::{ProtocolError, ProtocolResult};
pub use frame::frame_length;
pub use parser::{decode, decode_frame, parse, Parser, ParserState};
pub use token::{Token, TokenKind};
pub use tokenizer::{tokenize, Tokenizer};
pub use types::RespValue;
