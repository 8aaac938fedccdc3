//! # lexkv - A Small Redis-Compatible Key-Value Server
//!
//! lexkv speaks a subset of RESP (the Redis Serialization Protocol) and keeps
//! its data in memory, with optional per-key expiry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              lexkv                               │
//! │                                                                  │
//! │  ┌────────────┐   ┌────────────┐   ┌───────────┐   ┌──────────┐  │
//! │  │ Connection │──>│ Tokenizer  │──>│  Parser   │──>│ Command  │  │
//! │  │  (frames)  │   │   (FSM)    │   │   (FSM)   │   │ Handler  │  │
//! │  └────────────┘   └────────────┘   └───────────┘   └────┬─────┘  │
//! │                                                         │        │
//! │                                                         ▼        │
//! │                                   ┌──────────────────────────┐   │
//! │                                   │  Store (64 RwLock shards)│   │
//! │                                   └──────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `PING [message]`
//! - `ECHO message`
//! - `SET key value [PX milliseconds]`
//! - `GET key`
//! - `CONFIG ...` (accepted, no effect)
//!
//! ## Module Overview
//!
//! - [`protocol`]: framing, tokenizer, parser and reply types
//! - [`storage`]: sharded store with lazy expiry
//! - [`commands`]: command dispatch and handlers
//! - [`connection`]: per-client read/execute/reply loop
//! - [`config`]: command-line configuration
//!
//! ## Example
//!
//! ```
//! use lexkv::commands::CommandHandler;
//! use lexkv::protocol::decode;
//! use lexkv::storage::Store;
//! use std::sync::Arc;
//!
//! let handler = CommandHandler::new(Arc::new(Store::new()));
//!
//! let set = decode(b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n").unwrap();
//! assert_eq!(handler.execute(set).serialize(), b"+OK\r\n");
//!
//! let get = decode(b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n").unwrap();
//! assert_eq!(handler.execute(get).serialize(), b"$5\r\nvalue\r\n");
//! ```

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{decode, Command, ProtocolError, RespValue};
pub use storage::Store;

/// The default port lexkv listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host lexkv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of lexkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
