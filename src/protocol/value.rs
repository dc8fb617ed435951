//! Value definitions
//!
//! The tagged union carried by every request, reply and AOF record.

use bytes::Bytes;

/// Type marker bytes
pub const ARRAY_MARKER: u8 = b'*';
pub const BULK_MARKER: u8 = b'$';
pub const SIMPLE_MARKER: u8 = b'+';
pub const ERROR_MARKER: u8 = b'-';
pub const INTEGER_MARKER: u8 = b':';

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Wire form of the null bulk string
pub const NULL_BULK: &[u8] = b"$-1\r\n";

/// A protocol-level value
///
/// `Simple` and `Error` are line-delimited and must not contain `\r\n`.
/// `Bulk` is length-prefixed and may carry arbitrary bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `+text`
    Simple(String),

    /// `-text`
    Error(String),

    /// `:n` (accepted by the decoder, never produced by a handler)
    Integer(i64),

    /// `$len` + raw bytes
    Bulk(Bytes),

    /// `*count` + elements
    Array(Vec<Value>),

    /// `$-1`
    Null,
}

/// Discriminant of a [`Value`], mostly for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Simple,
    Error,
    Integer,
    Bulk,
    Array,
    Null,
}

impl Value {
    /// `+OK`
    pub fn ok() -> Self {
        Value::Simple("OK".to_string())
    }

    /// Simple string; `\r` and `\n` are replaced so the text stays one line
    pub fn simple(text: impl Into<String>) -> Self {
        Value::Simple(single_line(text.into()))
    }

    /// Error reply; `\r` and `\n` are replaced so the text stays one line
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(single_line(message.into()))
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Value::Bulk(data.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(items)
    }

    /// Build a command invocation: an array of bulk strings
    ///
    /// ```
    /// use respkv::protocol::Value;
    ///
    /// let cmd = Value::command(&["SET", "k", "v"]);
    /// assert_eq!(cmd.encode(), b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n".to_vec());
    /// ```
    pub fn command<A: AsRef<[u8]>>(args: &[A]) -> Self {
        Value::Array(
            args.iter()
                .map(|a| Value::Bulk(Bytes::copy_from_slice(a.as_ref())))
                .collect(),
        )
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Simple(_) => ValueKind::Simple,
            Value::Error(_) => ValueKind::Error,
            Value::Integer(_) => ValueKind::Integer,
            Value::Bulk(_) => ValueKind::Bulk,
            Value::Array(_) => ValueKind::Array,
            Value::Null => ValueKind::Null,
        }
    }

    /// Payload of a string-like value (Bulk or Simple)
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bulk(data) => Some(data),
            Value::Simple(text) => Some(text.as_bytes()),
            _ => None,
        }
    }

    /// Elements of an Array value
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

/// Line-delimited text cannot carry a line break on the wire
fn single_line(text: String) -> String {
    if text.contains(['\r', '\n']) {
        text.replace(['\r', '\n'], " ")
    } else {
        text
    }
}

/// Arrays are torn down with an explicit work list so dropping a deeply
/// nested value does not recurse once per level.
impl Drop for Value {
    fn drop(&mut self) {
        let Value::Array(items) = self else {
            return;
        };
        if !items.iter().any(|item| matches!(item, Value::Array(_))) {
            return;
        }

        let mut pending = std::mem::take(items);
        while let Some(mut item) = pending.pop() {
            if let Value::Array(inner) = &mut item {
                pending.append(inner);
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bulk(b)
    }
}

impl From<Option<Bytes>> for Value {
    fn from(b: Option<Bytes>) -> Self {
        b.map(Value::Bulk).unwrap_or(Value::Null)
    }
}
