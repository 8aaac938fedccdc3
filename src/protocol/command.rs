//! Decoded client commands.

use crate::protocol::types::RespValue;
use bytes::Bytes;

/// Command names accepted by the parser.
pub const KNOWN_COMMANDS: &[&str] = &["PING", "ECHO", "SET", "GET", "CONFIG"];

/// Returns true if `name` (already upper-cased) is a recognized command.
pub fn is_known(name: &str) -> bool {
    KNOWN_COMMANDS.contains(&name)
}

/// A fully validated command: upper-cased name plus its arguments in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<Bytes>,
}

impl Command {
    /// Creates a command, upper-casing the name.
    pub fn new(name: impl AsRef<str>, args: Vec<Bytes>) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            args,
        }
    }

    /// Encodes the command the way a client sends it: an array of bulk strings.
    pub fn to_resp(&self) -> RespValue {
        let mut items = Vec::with_capacity(self.args.len() + 1);
        items.push(RespValue::bulk_string(self.name.clone()));
        items.extend(self.args.iter().cloned().map(RespValue::BulkString));
        RespValue::array(items)
    }
}
