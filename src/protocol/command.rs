//! Command definitions
//!
//! Turns a request array into a typed command. Names are case-insensitive;
//! arguments may be bulk or simple strings.

use bytes::Bytes;

use crate::error::{KvError, Result};
use super::Value;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    Ping,
    Get,
    Set,
    HGet,
    HSet,
    HGetAll,
}

impl CommandType {
    pub const ALL: [CommandType; 6] = [
        CommandType::Ping,
        CommandType::Get,
        CommandType::Set,
        CommandType::HGet,
        CommandType::HSet,
        CommandType::HGetAll,
    ];

    /// Look up a command by name, ignoring ASCII case
    pub fn from_name(name: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().as_bytes().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandType::Ping => "PING",
            CommandType::Get => "GET",
            CommandType::Set => "SET",
            CommandType::HGet => "HGET",
            CommandType::HSet => "HSET",
            CommandType::HGetAll => "HGETALL",
        }
    }

    /// Mutating commands are the ones recorded in the AOF
    pub fn is_mutating(&self) -> bool {
        matches!(self, CommandType::Set | CommandType::HSet)
    }

    /// Allowed argument counts, excluding the command name
    fn arity(&self) -> std::ops::RangeInclusive<usize> {
        match self {
            CommandType::Ping => 0..=1,
            CommandType::Get | CommandType::HGetAll => 1..=1,
            CommandType::Set | CommandType::HGet => 2..=2,
            CommandType::HSet => 3..=3,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Health check, optionally echoing a message
    Ping { message: Option<Bytes> },

    /// Get a value by key
    Get { key: Bytes },

    /// Set a key-value pair
    Set { key: Bytes, value: Bytes },

    /// Get one field of a hash
    HGet { hash: Bytes, field: Bytes },

    /// Set one field of a hash
    HSet { hash: Bytes, field: Bytes, value: Bytes },

    /// Get every field/value pair of a hash
    HGetAll { hash: Bytes },
}

impl Command {
    /// Parse a request frame
    ///
    /// Errors are `KvError::Command` carrying the reply text.
    pub fn from_value(frame: &Value) -> Result<Self> {
        let items = frame.as_array().ok_or_else(|| {
            KvError::Command("ERR invalid request: expected array of arguments".to_string())
        })?;

        let (name, rest) = items.split_first().ok_or_else(|| {
            KvError::Command("ERR invalid request: expected at least 1 argument".to_string())
        })?;

        let name = name.as_bytes().ok_or_else(|| {
            KvError::Command("ERR invalid request: command name must be a string".to_string())
        })?;

        let ty = CommandType::from_name(name).ok_or_else(|| {
            KvError::Command(format!(
                "ERR unknown command '{}'",
                String::from_utf8_lossy(name)
            ))
        })?;

        if !ty.arity().contains(&rest.len()) {
            return Err(KvError::Command(format!(
                "ERR wrong number of arguments for '{}' command",
                ty.name().to_ascii_lowercase()
            )));
        }

        let mut args = Vec::with_capacity(rest.len());
        for arg in rest {
            let bytes = arg.as_bytes().ok_or_else(|| {
                KvError::Command(format!(
                    "ERR invalid argument for '{}' command: expected a string",
                    ty.name().to_ascii_lowercase()
                ))
            })?;
            args.push(Bytes::copy_from_slice(bytes));
        }
        let mut args = args.into_iter();
        // Arity is checked above, so every `next()` below is present
        let mut next = || args.next().unwrap_or_default();

        let command = match ty {
            CommandType::Ping => Command::Ping {
                message: (!rest.is_empty()).then(&mut next),
            },
            CommandType::Get => Command::Get { key: next() },
            CommandType::Set => Command::Set {
                key: next(),
                value: next(),
            },
            CommandType::HGet => Command::HGet {
                hash: next(),
                field: next(),
            },
            CommandType::HSet => Command::HSet {
                hash: next(),
                field: next(),
                value: next(),
            },
            CommandType::HGetAll => Command::HGetAll { hash: next() },
        };

        Ok(command)
    }

    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Ping { .. } => CommandType::Ping,
            Command::Get { .. } => CommandType::Get,
            Command::Set { .. } => CommandType::Set,
            Command::HGet { .. } => CommandType::HGet,
            Command::HSet { .. } => CommandType::HSet,
            Command::HGetAll { .. } => CommandType::HGetAll,
        }
    }

    pub fn is_mutating(&self) -> bool {
        self.command_type().is_mutating()
    }

    /// Canonical request frame for this command
    pub fn to_value(&self) -> Value {
        let name = Value::bulk(self.command_type().name());
        let args: Vec<&Bytes> = match self {
            Command::Ping { message } => message.iter().collect(),
            Command::Get { key } => vec![key],
            Command::Set { key, value } => vec![key, value],
            Command::HGet { hash, field } => vec![hash, field],
            Command::HSet { hash, field, value } => vec![hash, field, value],
            Command::HGetAll { hash } => vec![hash],
        };

        let mut items = Vec::with_capacity(1 + args.len());
        items.push(name);
        items.extend(args.into_iter().cloned().map(Value::Bulk));
        Value::Array(items)
    }
}
