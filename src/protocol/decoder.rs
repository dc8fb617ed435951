//! Stream decoder
//!
//! Pulls one [`Value`] at a time off any buffered reader. The decoder never
//! buffers a whole message; it reads exactly the bytes the next value needs,
//! so it can be resumed across calls on a socket or a log file.
//!
//! ## End-of-stream handling
//! - EOF before the first marker byte of a top-level value: `EndOfStream`
//! - EOF anywhere after that: `UnexpectedEndOfStream`

use std::io::{BufRead, ErrorKind, Read};

use bytes::Bytes;

use crate::error::{KvError, Result};
use super::value::{
    Value, ARRAY_MARKER, BULK_MARKER, ERROR_MARKER, INTEGER_MARKER, SIMPLE_MARKER,
};

/// Upper bound on the capacity reserved up front for an array. Elements past
/// this still decode, the vector just grows as they arrive.
const MAX_PREALLOC: usize = 1024;

/// Incremental decoder over a buffered byte stream
pub struct Decoder<R> {
    reader: R,

    /// Bytes consumed so far
    position: u64,
}

impl<R: BufRead> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
        }
    }

    /// Read exactly one value
    pub fn read_value(&mut self) -> Result<Value> {
        self.read_frame()
    }

    /// Total bytes consumed. After a successful `read_value` this is the
    /// offset of the next message.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    // =========================================================================
    // Value parsing
    // =========================================================================

    /// Decode one top-level value
    ///
    /// Arrays are assembled on an explicit stack of open frames, so nesting
    /// depth is bounded by memory and not by the thread stack.
    fn read_frame(&mut self) -> Result<Value> {
        // (elements so far, elements still expected)
        let mut open: Vec<(Vec<Value>, usize)> = Vec::new();

        'next: loop {
            let marker = match self.read_marker()? {
                Some(marker) => marker,
                None if open.is_empty() => return Err(KvError::EndOfStream),
                None => return Err(KvError::UnexpectedEndOfStream),
            };

            let mut value = match marker {
                ARRAY_MARKER => match self.read_array_len()? {
                    None => Value::Null,
                    Some(0) => Value::Array(Vec::new()),
                    Some(count) => {
                        open.push((Vec::with_capacity(count.min(MAX_PREALLOC)), count));
                        continue 'next;
                    }
                },
                BULK_MARKER => self.read_bulk()?,
                SIMPLE_MARKER => Value::Simple(self.read_text()?),
                ERROR_MARKER => Value::Error(self.read_text()?),
                INTEGER_MARKER => Value::Integer(self.read_integer()?),
                other => return Err(KvError::UnknownType(other)),
            };

            // Close every frame this value completes
            while let Some((mut items, remaining)) = open.pop() {
                items.push(value);
                if remaining > 1 {
                    open.push((items, remaining - 1));
                    continue 'next;
                }
                value = Value::Array(items);
            }
            return Ok(value);
        }
    }

    /// Element count of an array header, `None` for the null array
    fn read_array_len(&mut self) -> Result<Option<usize>> {
        let count = self.read_integer()?;
        if count == -1 {
            return Ok(None);
        }
        Self::checked_len(count, "array").map(Some)
    }

    fn read_bulk(&mut self) -> Result<Value> {
        let len = self.read_integer()?;
        if len == -1 {
            return Ok(Value::Null);
        }
        let len = Self::checked_len(len, "bulk string")?;

        let mut data = Vec::with_capacity(len.min(MAX_PREALLOC * 64));
        let read = (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut data)
            .map_err(Self::map_io)?;
        self.position += read as u64;
        if read < len {
            return Err(KvError::UnexpectedEndOfStream);
        }

        let mut terminator = [0u8; 2];
        self.read_exact(&mut terminator)?;
        if &terminator != b"\r\n" {
            return Err(KvError::Protocol(format!(
                "bulk string of {} bytes not followed by CRLF",
                len
            )));
        }

        Ok(Value::Bulk(Bytes::from(data)))
    }

    fn read_text(&mut self) -> Result<String> {
        let line = self.read_line()?;
        String::from_utf8(line)
            .map_err(|_| KvError::Protocol("invalid UTF-8 in simple string".to_string()))
    }

    fn read_integer(&mut self) -> Result<i64> {
        let line = self.read_line()?;
        std::str::from_utf8(&line)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                KvError::Protocol(format!(
                    "invalid integer: {:?}",
                    String::from_utf8_lossy(&line)
                ))
            })
    }

    fn checked_len(len: i64, what: &str) -> Result<usize> {
        usize::try_from(len)
            .map_err(|_| KvError::Protocol(format!("invalid {} length: {}", what, len)))
    }

    // =========================================================================
    // Raw reads
    // =========================================================================

    /// Read one marker byte, `None` on clean EOF
    fn read_marker(&mut self) -> Result<Option<u8>> {
        let mut marker = [0u8; 1];
        match self.reader.read_exact(&mut marker) {
            Ok(()) => {
                self.position += 1;
                Ok(Some(marker[0]))
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(KvError::Io(e)),
        }
    }

    /// Read up to and including the next `\r\n`, returning the line without it.
    /// A lone `\n` is part of the line.
    fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            let read = self
                .reader
                .read_until(b'\n', &mut line)
                .map_err(Self::map_io)?;
            self.position += read as u64;

            if read == 0 || line.last() != Some(&b'\n') {
                return Err(KvError::UnexpectedEndOfStream);
            }
            if line.ends_with(b"\r\n") {
                line.truncate(line.len() - 2);
                return Ok(line);
            }
        }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf).map_err(Self::map_io)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn map_io(e: std::io::Error) -> KvError {
        if e.kind() == ErrorKind::UnexpectedEof {
            KvError::UnexpectedEndOfStream
        } else {
            KvError::Io(e)
        }
    }
}

/// Read a single value from a buffered reader
pub fn read_value<R: BufRead>(reader: R) -> Result<Value> {
    Decoder::new(reader).read_value()
}

/// Decode a complete value from a byte slice
pub fn decode(bytes: &[u8]) -> Result<Value> {
    read_value(bytes)
}
