//! Command Handler
//!
//! Dispatches a decoded [`Command`] to its handler by exact (upper-cased)
//! name and turns the outcome into a reply.
//!
//! ## Supported Commands
//!
//! - `PING [message]` - Test connection
//! - `ECHO message` - Echo message
//! - `SET key value [PX milliseconds]` - Set a key, optionally expiring
//! - `GET key` - Get a key's value
//! - `CONFIG ...` - Accepted and ignored
//!
//! Handlers never fail the connection: every [`CommandError`] becomes an
//! error reply. Handlers borrow the command only for the duration of the call.

use crate::commands::error::{CommandError, CommandResult};
use crate::protocol::{Command, RespValue};
use crate::storage::Store;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Executes commands against a shared [`Store`].
#[derive(Debug, Clone)]
pub struct CommandHandler {
    store: Arc<Store>,
}

impl CommandHandler {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Executes a command and returns the reply to send back.
    pub fn execute(&self, command: Command) -> RespValue {
        match self.dispatch(&command) {
            Ok(reply) => reply,
            Err(err) => {
                debug!(command = %command.name, error = %err, "Command failed");
                err.into()
            }
        }
    }

    fn dispatch(&self, command: &Command) -> CommandResult {
        let args = command.args.as_slice();
        match command.name.as_str() {
            "PING" => self.cmd_ping(args),
            "ECHO" => self.cmd_echo(args),
            "SET" => self.cmd_set(args),
            "GET" => self.cmd_get(args),
            "CONFIG" => self.cmd_config(args),
            _ => Err(CommandError::UnknownCommand(command.name.clone())),
        }
    }

    /// PING [message]
    fn cmd_ping(&self, args: &[Bytes]) -> CommandResult {
        match args {
            [] => Ok(RespValue::pong()),
            [message] => Ok(RespValue::bulk_string(message.clone())),
            _ => Err(CommandError::WrongArity("PING")),
        }
    }

    /// ECHO message
    fn cmd_echo(&self, args: &[Bytes]) -> CommandResult {
        let [message] = args else {
            return Err(CommandError::WrongArity("ECHO"));
        };
        Ok(RespValue::bulk_string(message.clone()))
    }

    /// SET key value [PX milliseconds]
    ///
    /// Options are validated before anything is written, so a bad `PX`
    /// leaves the previous record untouched.
    ///
    /// Key and value are copied: the arguments are slices of the request
    /// frame and would otherwise keep the whole read buffer alive.
    fn cmd_set(&self, args: &[Bytes]) -> CommandResult {
        let [key, value, options @ ..] = args else {
            return Err(CommandError::WrongArity("SET"));
        };

        let ttl = parse_set_options(options)?;
        let key = Bytes::copy_from_slice(key);
        let value = Bytes::copy_from_slice(value);

        match ttl {
            Some(ttl) => self.store.set_with_ttl(key, value, ttl),
            None => self.store.set(key, value),
        };

        Ok(RespValue::ok())
    }

    /// GET key
    fn cmd_get(&self, args: &[Bytes]) -> CommandResult {
        let [key] = args else {
            return Err(CommandError::WrongArity("GET"));
        };

        Ok(match self.store.get(key) {
            Some(value) => RespValue::bulk_string(value),
            None => RespValue::null(),
        })
    }

    /// CONFIG ... (no-op)
    fn cmd_config(&self, args: &[Bytes]) -> CommandResult {
        debug!(args = args.len(), "Ignoring CONFIG");
        Ok(RespValue::ok())
    }
}

/// Parses the options after `SET key value`. Only `PX` is supported.
fn parse_set_options(options: &[Bytes]) -> Result<Option<Duration>, CommandError> {
    let mut ttl = None;
    let mut iter = options.iter();

    while let Some(option) = iter.next() {
        if !option.eq_ignore_ascii_case(b"PX") || ttl.is_some() {
            return Err(CommandError::Syntax);
        }
        let millis = iter.next().ok_or(CommandError::Syntax)?;
        ttl = Some(Duration::from_millis(parse_u64(millis)?));
    }

    Ok(ttl)
}

fn parse_u64(value: &[u8]) -> Result<u64, CommandError> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(CommandError::Value)
}
