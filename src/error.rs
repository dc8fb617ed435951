//! Error types for respkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for respkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Stream ended cleanly at a message boundary
    #[error("end of stream")]
    EndOfStream,

    /// Stream ended in the middle of a message
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    #[error("unknown value type marker: 0x{0:02x}")]
    UnknownType(u8),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // AOF Errors
    // -------------------------------------------------------------------------
    #[error("AOF write failed: {0}")]
    WriteFailure(String),

    #[error("AOF replay failed: {0}")]
    ReplayFailure(String),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    /// Message is already in reply form, e.g. "wrong number of arguments"
    #[error("{0}")]
    Command(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// True for either flavour of end-of-stream
    pub fn is_eof(&self) -> bool {
        matches!(self, KvError::EndOfStream | KvError::UnexpectedEndOfStream)
    }
}
