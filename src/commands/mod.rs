//! Command Handler Module
//!
//! Executes decoded commands against the store and produces replies.
//!
//! ```text
//! ┌─────────────────┐
//! │ Tokenizer/Parser│  (protocol module)
//! └────────┬────────┘
//!          │ Command
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Store       │  (storage module)
//! └─────────────────┘
//! ```

pub mod error;
pub mod handler;

pub use error::{CommandError, CommandResult};
pub use handler::CommandHandler;
