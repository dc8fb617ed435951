//! Value encoder
//!
//! Byte-exact serialization of a [`Value`] into wire form. Encoding is pure:
//! the only output is the produced byte sequence.
//!
//! ```text
//! Simple   +<text>\r\n
//! Error    -<text>\r\n
//! Integer  :<n>\r\n
//! Bulk     $<byte len>\r\n<bytes>\r\n
//! Array    *<count>\r\n<element>...
//! Null     $-1\r\n
//! ```

use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use super::value::{
    Value, ARRAY_MARKER, BULK_MARKER, CRLF, ERROR_MARKER, INTEGER_MARKER, NULL_BULK,
    SIMPLE_MARKER,
};

impl Value {
    /// Encode to a freshly allocated buffer
    pub fn encode(&self) -> Vec<u8> {
        encode(self).to_vec()
    }

    /// Exact number of bytes `encode` will produce
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::Simple(text) | Value::Error(text) => 1 + text.len() + 2,
            Value::Integer(n) => 1 + decimal_len(*n) + 2,
            Value::Bulk(data) => 1 + decimal_len(data.len() as i64) + 2 + data.len() + 2,
            Value::Array(items) => {
                1 + decimal_len(items.len() as i64)
                    + 2
                    + items.iter().map(Value::encoded_len).sum::<usize>()
            }
            Value::Null => NULL_BULK.len(),
        }
    }
}

/// Encode a value into a new buffer
pub fn encode(value: &Value) -> Bytes {
    let mut buf = BytesMut::with_capacity(value.encoded_len());
    encode_into(value, &mut buf);
    buf.freeze()
}

/// Append the wire form of `value` to `buf`
pub fn encode_into(value: &Value, buf: &mut BytesMut) {
    match value {
        Value::Simple(text) => put_line(buf, SIMPLE_MARKER, text.as_bytes()),
        Value::Error(text) => put_line(buf, ERROR_MARKER, text.as_bytes()),
        Value::Integer(n) => put_line(buf, INTEGER_MARKER, n.to_string().as_bytes()),
        Value::Bulk(data) => {
            put_line(buf, BULK_MARKER, data.len().to_string().as_bytes());
            buf.put_slice(data);
            buf.put_slice(CRLF);
        }
        Value::Array(items) => {
            put_line(buf, ARRAY_MARKER, items.len().to_string().as_bytes());
            for item in items {
                encode_into(item, buf);
            }
        }
        Value::Null => buf.put_slice(NULL_BULK),
    }
}

/// Write a value to a stream and flush it
pub fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    writer.write_all(&encode(value))?;
    writer.flush()?;
    Ok(())
}

fn put_line(buf: &mut BytesMut, marker: u8, body: &[u8]) {
    buf.reserve(1 + body.len() + 2);
    buf.put_u8(marker);
    buf.put_slice(body);
    buf.put_slice(CRLF);
}

fn decimal_len(n: i64) -> usize {
    let sign = usize::from(n < 0);
    let mut magnitude = n.unsigned_abs();
    let mut digits = 1;
    while magnitude >= 10 {
        magnitude /= 10;
        digits += 1;
    }
    sign + digits
}
