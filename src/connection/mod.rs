//! Connection Module
//!
//! One async task per client. The task owns its read buffer and decoder
//! state; the only thing shared between connections is the
//! [`Store`](crate::storage::Store) behind the command handler.
//!
//! ## Example
//!
//! ```ignore
//! use lexkv::connection::{handle_connection, ConnectionStats};
//! use lexkv::commands::CommandHandler;
//! use lexkv::storage::Store;
//! use std::sync::Arc;
//!
//! let store = Arc::new(Store::new());
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! let handler = CommandHandler::new(Arc::clone(&store));
//! tokio::spawn(handle_connection(stream, addr, handler, Arc::clone(&stats)));
//! ```

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
