//! Command execution errors.
//!
//! These never close a connection: each one is turned into a RESP error
//! reply by [`From<CommandError> for RespValue`](RespValue).

use crate::protocol::RespValue;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No handler is registered for the command name
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    /// Unknown, repeated or incomplete option
    #[error("syntax error")]
    Syntax,

    /// An argument that should be a non-negative integer is not
    #[error("value is not an integer or out of range")]
    Value,
}

pub type CommandResult = Result<RespValue, CommandError>;

impl From<CommandError> for RespValue {
    fn from(err: CommandError) -> Self {
        RespValue::error(format!("ERR {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_resp() {
        let reply: RespValue = CommandError::UnknownCommand("FOO".to_string()).into();
        assert_eq!(reply.serialize(), b"-ERR unknown command 'FOO'\r\n");

        let reply: RespValue = CommandError::WrongArity("GET").into();
        assert_eq!(
            reply.serialize(),
            b"-ERR wrong number of arguments for 'GET' command\r\n"
        );
    }
}
