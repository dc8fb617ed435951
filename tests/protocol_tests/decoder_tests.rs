//! Decoder Tests
//!
//! These tests verify:
//! - Each value type decodes from its wire form
//! - Nested arrays decode at any depth
//! - Bulk strings are binary safe
//! - Clean EOF vs truncated input
//! - Malformed input is rejected with a typed error

use std::io::BufReader;

use bytes::Bytes;
use respkv::protocol::{decode, encode, Decoder, Value};
use respkv::KvError;

// =============================================================================
// Helper Functions
// =============================================================================

fn decode_all(bytes: &[u8]) -> Vec<Value> {
    let mut decoder = Decoder::new(bytes);
    let mut values = Vec::new();
    loop {
        match decoder.read_value() {
            Ok(v) => values.push(v),
            Err(KvError::EndOfStream) => return values,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
}

// =============================================================================
// Scalar Tests
// =============================================================================

#[test]
fn test_decode_bulk() {
    assert_eq!(decode(b"$5\r\nhello\r\n").unwrap(), Value::bulk("hello"));
}

#[test]
fn test_decode_empty_bulk() {
    assert_eq!(decode(b"$0\r\n\r\n").unwrap(), Value::bulk(""));
}

#[test]
fn test_decode_null_bulk() {
    assert_eq!(decode(b"$-1\r\n").unwrap(), Value::Null);
}

#[test]
fn test_decode_simple_string() {
    assert_eq!(decode(b"+OK\r\n").unwrap(), Value::simple("OK"));
}

#[test]
fn test_decode_error() {
    assert_eq!(
        decode(b"-ERR something broke\r\n").unwrap(),
        Value::error("ERR something broke")
    );
}

#[test]
fn test_decode_integer() {
    assert_eq!(decode(b":42\r\n").unwrap(), Value::Integer(42));
    assert_eq!(decode(b":-7\r\n").unwrap(), Value::Integer(-7));
}

// =============================================================================
// Array Tests
// =============================================================================

#[test]
fn test_decode_command_array() {
    let value = decode(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n").unwrap();
    assert_eq!(value, Value::command(&["SET", "k", "v"]));
}

#[test]
fn test_decode_empty_array() {
    assert_eq!(decode(b"*0\r\n").unwrap(), Value::Array(vec![]));
}

#[test]
fn test_decode_null_array() {
    assert_eq!(decode(b"*-1\r\n").unwrap(), Value::Null);
}

#[test]
fn test_decode_nested_arrays() {
    let value = decode(b"*2\r\n*2\r\n$1\r\na\r\n+b\r\n*1\r\n*0\r\n").unwrap();
    assert_eq!(
        value,
        Value::array(vec![
            Value::array(vec![Value::bulk("a"), Value::simple("b")]),
            Value::array(vec![Value::array(vec![])]),
        ])
    );
}

#[test]
fn test_decode_deeply_nested() {
    let depth = 1_000_000;
    let mut wire = Vec::with_capacity(depth * 4 + 10);
    for _ in 0..depth {
        wire.extend_from_slice(b"*1\r\n");
    }
    wire.extend_from_slice(b"$4\r\nleaf\r\n");

    let mut value = decode(&wire).unwrap();
    for level in 0..depth {
        let inner = match &mut value {
            Value::Array(items) if items.len() == 1 => items.pop().unwrap(),
            other => panic!("expected one-element array at level {}, got {:?}", level, other.kind()),
        };
        value = inner;
    }
    assert_eq!(value, Value::bulk("leaf"));
}

#[test]
fn test_deep_nesting_cut_short_is_unexpected_eof() {
    let mut wire = Vec::new();
    for _ in 0..100_000 {
        wire.extend_from_slice(b"*2\r\n");
    }
    wire.extend_from_slice(b"+only-one\r\n");

    assert!(matches!(decode(&wire), Err(KvError::UnexpectedEndOfStream)));
}

// =============================================================================
// Binary Safety Tests
// =============================================================================

#[test]
fn test_bulk_with_embedded_crlf() {
    let value = decode(b"$6\r\na\r\nb\r\n\r\n").unwrap();
    assert_eq!(value, Value::bulk("a\r\nb\r\n"));
}

#[test]
fn test_bulk_with_all_byte_values() {
    let payload: Vec<u8> = (0..=255).collect();
    let wire = encode(&Value::Bulk(Bytes::from(payload.clone())));
    assert_eq!(decode(&wire).unwrap(), Value::Bulk(Bytes::from(payload)));
}

// =============================================================================
// Streaming Tests
// =============================================================================

#[test]
fn test_consecutive_values_in_one_stream() {
    let values = decode_all(b"+OK\r\n$1\r\nx\r\n*1\r\n$4\r\nPING\r\n$-1\r\n");
    assert_eq!(
        values,
        vec![
            Value::ok(),
            Value::bulk("x"),
            Value::command(&["PING"]),
            Value::Null,
        ]
    );
}

#[test]
fn test_decode_across_tiny_buffer() {
    // A one-byte buffer forces every read to refill
    let wire = b"*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n";
    let mut decoder = Decoder::new(BufReader::with_capacity(1, &wire[..]));

    assert_eq!(
        decoder.read_value().unwrap(),
        Value::command(&["hello", "world"])
    );
    assert!(matches!(decoder.read_value(), Err(KvError::EndOfStream)));
}

#[test]
fn test_position_after_each_value() {
    let mut decoder = Decoder::new(&b"*1\r\n$1\r\na\r\n:5\r\n"[..]);
    decoder.read_value().unwrap();
    assert_eq!(decoder.position(), 11);
    decoder.read_value().unwrap();
    assert_eq!(decoder.position(), 15);
}

// =============================================================================
// End-of-Stream Tests
// =============================================================================

#[test]
fn test_empty_stream_is_clean_eof() {
    assert!(matches!(decode(b""), Err(KvError::EndOfStream)));
}

#[test]
fn test_truncated_length_line() {
    assert!(matches!(decode(b"*3"), Err(KvError::UnexpectedEndOfStream)));
    assert!(matches!(decode(b"$5\r"), Err(KvError::UnexpectedEndOfStream)));
}

#[test]
fn test_truncated_bulk_payload() {
    assert!(matches!(
        decode(b"$10\r\nshort"),
        Err(KvError::UnexpectedEndOfStream)
    ));
}

#[test]
fn test_missing_bulk_terminator() {
    assert!(matches!(
        decode(b"$5\r\nhello"),
        Err(KvError::UnexpectedEndOfStream)
    ));
    assert!(matches!(
        decode(b"$5\r\nhello\r"),
        Err(KvError::UnexpectedEndOfStream)
    ));
}

#[test]
fn test_truncated_array_elements() {
    assert!(matches!(
        decode(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n"),
        Err(KvError::UnexpectedEndOfStream)
    ));
}

#[test]
fn test_every_proper_prefix_is_unexpected_eof() {
    let wire = encode(&Value::array(vec![
        Value::command(&["HSET", "h", "f", "v"]),
        Value::ok(),
        Value::Integer(12),
        Value::error("ERR x"),
    ]));

    for cut in 1..wire.len() {
        assert!(
            matches!(decode(&wire[..cut]), Err(KvError::UnexpectedEndOfStream)),
            "prefix of {} bytes",
            cut
        );
    }
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_unknown_marker() {
    assert!(matches!(decode(b"?what\r\n"), Err(KvError::UnknownType(b'?'))));
}

#[test]
fn test_unknown_marker_inside_array() {
    assert!(matches!(
        decode(b"*2\r\n$1\r\na\r\n#t\r\n"),
        Err(KvError::UnknownType(b'#'))
    ));
}

#[test]
fn test_non_numeric_length() {
    assert!(matches!(decode(b"$abc\r\n"), Err(KvError::Protocol(_))));
    assert!(matches!(decode(b"* 1\r\n"), Err(KvError::Protocol(_))));
}

#[test]
fn test_negative_lengths_other_than_null() {
    assert!(matches!(decode(b"$-2\r\n"), Err(KvError::Protocol(_))));
    assert!(matches!(decode(b"*-5\r\n"), Err(KvError::Protocol(_))));
}

#[test]
fn test_bulk_length_mismatch() {
    // Declared 3, but 5 bytes precede the CRLF
    assert!(matches!(decode(b"$3\r\nhello\r\n"), Err(KvError::Protocol(_))));
}

#[test]
fn test_lf_only_terminator_is_not_accepted() {
    // Without "\r\n" the line never ends
    assert!(matches!(
        decode(b"+OK\n"),
        Err(KvError::UnexpectedEndOfStream)
    ));
}

#[test]
fn test_invalid_utf8_in_simple_string() {
    assert!(matches!(decode(b"+\xff\xfe\r\n"), Err(KvError::Protocol(_))));
}
