//! RESP Command Parser
//!
//! The second decoding stage. It walks the flat token list produced by the
//! [`tokenizer`](crate::protocol::tokenizer) and assembles one [`Command`].
//!
//! ## State Machine
//!
//! ```text
//! ArrayHeader ─> CommandLength ─> CommandName ─> ArgLength ─> ArgValue
//!                                                    ▲            │
//!                                                    └────────────┘
//! ```
//!
//! Every state first validates the current token, then processes it and
//! moves to the next state. A CRLF right after a processed token is skipped.
//! The `ArgLength`/`ArgValue` pair repeats until the tokens run out, so
//! commands of any arity go through the same cycle.
//!
//! When the tokens are exhausted, the element count declared by the array
//! header must match the number of strings read (name + arguments).

use crate::protocol::command::{is_known, Command};
use crate::protocol::error::{ProtocolError, ProtocolResult};
use crate::protocol::token::{Token, TokenKind};
use crate::protocol::tokenizer::{tokenize, Tokenizer};
use bytes::Bytes;

/// The states of the command parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Expecting `*<count>`
    ArrayHeader,
    /// Expecting the bulk header of the command name
    CommandLength,
    /// Expecting the command name
    CommandName,
    /// Expecting the bulk header of the next argument
    ArgLength,
    /// Expecting an argument
    ArgValue,
}

impl ParserState {
    /// The token kind this state accepts.
    pub fn expected_kind(self) -> TokenKind {
        match self {
            ParserState::ArrayHeader => TokenKind::Array,
            ParserState::CommandLength | ParserState::ArgLength => TokenKind::BulkStringHeader,
            ParserState::CommandName | ParserState::ArgValue => TokenKind::String,
        }
    }

    /// Checks that `token` may be processed in this state.
    pub fn validate(self, token: &Token) -> ProtocolResult<()> {
        let expected = self.expected_kind();
        if token.kind != expected {
            return Err(ProtocolError::UnexpectedToken {
                expected,
                found: token.kind,
            });
        }

        match self {
            ParserState::ArrayHeader if token.as_length().is_none() => Err(
                ProtocolError::InvalidArrayLength(lossy(&token.value)),
            ),
            ParserState::CommandLength | ParserState::ArgLength
                if token.as_length().is_none() =>
            {
                Err(ProtocolError::InvalidBulkLength(lossy(&token.value)))
            }
            _ => Ok(()),
        }
    }

    /// The state that follows this one.
    pub fn next(self) -> Self {
        match self {
            ParserState::ArrayHeader => ParserState::CommandLength,
            ParserState::CommandLength => ParserState::CommandName,
            ParserState::CommandName => ParserState::ArgLength,
            ParserState::ArgLength => ParserState::ArgValue,
            ParserState::ArgValue => ParserState::ArgLength,
        }
    }
}

fn lossy(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

/// Single-use parser over the tokens of one request.
#[derive(Debug)]
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    state: ParserState,
    /// Element count declared by the array header
    expected_len: usize,
    /// Strings read so far (name + arguments)
    actual_len: usize,
    name: Option<String>,
    args: Vec<Bytes>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            state: ParserState::ArrayHeader,
            expected_len: 0,
            actual_len: 0,
            name: None,
            args: Vec::new(),
        }
    }

    /// Current state, mostly useful in tests.
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Validates and processes the next token. Returns `false` once the
    /// tokens are exhausted.
    pub fn step(&mut self) -> ProtocolResult<bool> {
        let tokens = self.tokens;
        let Some(token) = tokens.get(self.pos) else {
            return Ok(false);
        };

        self.state.validate(token)?;
        self.process(token)?;
        self.pos += 1;
        self.state = self.state.next();

        if tokens
            .get(self.pos)
            .is_some_and(|next| next.kind == TokenKind::Crlf)
        {
            self.pos += 1;
        }

        Ok(true)
    }

    fn process(&mut self, token: &Token) -> ProtocolResult<()> {
        match self.state {
            ParserState::ArrayHeader => {
                // validate() guarantees the header is numeric
                self.expected_len = token.as_length().unwrap_or_default();
            }
            ParserState::CommandLength | ParserState::ArgLength => {}
            ParserState::CommandName => {
                let name = std::str::from_utf8(&token.value)
                    .map_err(|_| ProtocolError::InvalidCommandName)?
                    .to_uppercase();
                if !is_known(&name) {
                    return Err(ProtocolError::UnknownCommand(name));
                }
                self.name = Some(name);
                self.actual_len += 1;
            }
            ParserState::ArgValue => {
                self.args.push(token.value.clone());
                self.actual_len += 1;
            }
        }
        Ok(())
    }

    /// Runs the parser over all tokens.
    pub fn parse(mut self) -> ProtocolResult<Command> {
        while self.step()? {}

        if self.expected_len != self.actual_len {
            return Err(ProtocolError::WrongArrayLength {
                expected: self.expected_len,
                actual: self.actual_len,
            });
        }

        let name = self.name.ok_or(ProtocolError::EmptyCommand)?;
        Ok(Command {
            name,
            args: self.args,
        })
    }
}

/// Parses a token list into a command.
pub fn parse(tokens: &[Token]) -> ProtocolResult<Command> {
    Parser::new(tokens).parse()
}

/// Tokenizes and parses one request.
pub fn decode(input: &[u8]) -> ProtocolResult<Command> {
    parse(&tokenize(input)?)
}

/// Like [`decode`], but keeps argument payloads as slices of `frame`.
pub fn decode_frame(frame: Bytes) -> ProtocolResult<Command> {
    parse(&Tokenizer::new(frame).tokenize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, value: &'static str) -> Token {
        Token::new(kind, Bytes::from_static(value.as_bytes()))
    }

    /// Tokens for `*<count>` followed by one bulk string per item.
    fn request(count: &'static str, items: &[&'static str]) -> Vec<Token> {
        let mut tokens = vec![tok(TokenKind::Array, count), Token::crlf()];
        for item in items {
            tokens.push(Token::new(
                TokenKind::BulkStringHeader,
                Bytes::from(item.len().to_string()),
            ));
            tokens.push(Token::crlf());
            tokens.push(tok(TokenKind::String, item));
            tokens.push(Token::crlf());
        }
        tokens
    }

    #[test]
    fn test_parse_echo() {
        let cmd = parse(&request("2", &["ECHO", "HEY"])).unwrap();
        assert_eq!(cmd, Command::new("ECHO", vec![Bytes::from("HEY")]));
    }

    #[test]
    fn test_parse_set() {
        let cmd = parse(&request("3", &["SET", "key", "value"])).unwrap();
        assert_eq!(cmd.name, "SET");
        assert_eq!(cmd.args, vec![Bytes::from("key"), Bytes::from("value")]);
    }

    #[test]
    fn test_parse_ping_no_args() {
        let cmd = parse(&request("1", &["PING"])).unwrap();
        assert_eq!(cmd, Command::new("PING", vec![]));
    }

    #[test]
    fn test_lowercase_name_is_uppercased() {
        let cmd = parse(&request("2", &["get", "k"])).unwrap();
        assert_eq!(cmd.name, "GET");
    }

    #[test]
    fn test_no_array_start() {
        let tokens = vec![tok(TokenKind::String, "PING"), Token::crlf()];
        assert_eq!(
            parse(&tokens),
            Err(ProtocolError::UnexpectedToken {
                expected: TokenKind::Array,
                found: TokenKind::String,
            })
        );
    }

    #[test]
    fn test_wrong_array_length() {
        assert_eq!(
            parse(&request("3", &["PING"])),
            Err(ProtocolError::WrongArrayLength {
                expected: 3,
                actual: 1
            })
        );
        assert_eq!(
            parse(&request("1", &["SET", "k", "v"])),
            Err(ProtocolError::WrongArrayLength {
                expected: 1,
                actual: 3
            })
        );
    }

    #[test]
    fn test_invalid_array_length() {
        assert_eq!(
            parse(&request("-1", &[])),
            Err(ProtocolError::InvalidArrayLength("-1".to_string()))
        );
    }

    #[test]
    fn test_invalid_bulk_length() {
        let tokens = vec![
            tok(TokenKind::Array, "1"),
            Token::crlf(),
            tok(TokenKind::BulkStringHeader, "four"),
        ];
        assert_eq!(
            parse(&tokens),
            Err(ProtocolError::InvalidBulkLength("four".to_string()))
        );
    }

    #[test]
    fn test_unknown_command_is_parse_error() {
        assert_eq!(
            parse(&request("1", &["FLUSHALL"])),
            Err(ProtocolError::UnknownCommand("FLUSHALL".to_string()))
        );
    }

    #[test]
    fn test_empty_command() {
        assert_eq!(parse(&request("0", &[])), Err(ProtocolError::EmptyCommand));
        assert_eq!(parse(&[]), Err(ProtocolError::EmptyCommand));
    }

    #[test]
    fn test_state_cycle() {
        let tokens = request("3", &["SET", "k", "v"]);
        let mut parser = Parser::new(&tokens);
        let mut states = vec![parser.state()];
        while parser.step().unwrap() {
            states.push(parser.state());
        }
        assert_eq!(
            states,
            vec![
                ParserState::ArrayHeader,
                ParserState::CommandLength,
                ParserState::CommandName,
                ParserState::ArgLength,
                ParserState::ArgValue,
                ParserState::ArgLength,
                ParserState::ArgValue,
                ParserState::ArgLength,
            ]
        );
    }

    #[test]
    fn test_decode_scenarios() {
        assert_eq!(
            decode(b"*1\r\n$4\r\nPING\r\n"),
            Ok(Command::new("PING", vec![]))
        );
        assert_eq!(
            decode(b"*2\r\n$4\r\nECHO\r\n$3\r\nHEY\r\n"),
            Ok(Command::new("ECHO", vec![Bytes::from("HEY")]))
        );
        assert!(decode(b"*2\r\n$4\r\nECHO\r\n$5\r\nHI\r\n").is_err());
    }

    #[test]
    fn test_decode_rejects_unterminated_bulk_string() {
        assert_eq!(decode(b"*1\r\n$4\r\nPING"), Err(ProtocolError::UnexpectedEof));
        assert_eq!(
            decode(b"*2\r\n$3\r\nGET\r\n$1\r\nk"),
            Err(ProtocolError::UnexpectedEof)
        );
    }

    #[test]
    fn test_decode_declared_three_with_two_elements() {
        assert_eq!(
            decode(b"*3\r\n$3\r\nGET\r\n$3\r\nkey\r\n"),
            Err(ProtocolError::WrongArrayLength {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_decode_binary_safe_argument() {
        let cmd = decode(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$6\r\n*1\r\n$0\r\n").unwrap();
        assert_eq!(cmd.args[1], Bytes::from_static(b"*1\r\n$0"));
    }

    #[test]
    fn test_round_trip() {
        let cases: Vec<(&str, Vec<&str>)> = vec![
            ("PING", vec![]),
            ("ECHO", vec!["hello world"]),
            ("SET", vec!["key", "value"]),
            ("SET", vec!["key", "value", "PX", "100"]),
            ("GET", vec![""]),
            ("CONFIG", vec!["GET", "dir"]),
            ("SET", vec!["*2\r\n", "$3\r\n:+-"]),
        ];

        for (name, args) in cases {
            let args: Vec<Bytes> = args.into_iter().map(Bytes::from).collect();
            let command = Command::new(name, args);
            let wire = command.to_resp().serialize();
            assert_eq!(decode(&wire), Ok(command));
        }
    }

    #[test]
    fn test_round_trip_generated() {
        use crate::protocol::command::KNOWN_COMMANDS;

        // Bytes that are meaningful to the tokenizer, plus a few plain ones
        const ALPHABET: &[u8] = b"\r\n*$+-:0123abcXYZ \x00\xff";

        // xorshift, fixed seed so failures are reproducible
        let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut next = move |bound: usize| -> usize {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % bound as u64) as usize
        };

        for case in 0..500 {
            let name = KNOWN_COMMANDS[next(KNOWN_COMMANDS.len())];
            let args: Vec<Bytes> = (0..next(6))
                .map(|_| {
                    (0..next(24))
                        .map(|_| ALPHABET[next(ALPHABET.len())])
                        .collect::<Vec<u8>>()
                        .into()
                })
                .collect();

            let command = Command::new(name, args);
            let wire = command.to_resp().serialize();
            assert_eq!(decode(&wire), Ok(command), "case {}", case);
        }
    }
}
