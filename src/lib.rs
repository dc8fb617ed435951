//! # respkv
//!
//! A small in-memory key-value server with:
//! - A RESP-style textual wire protocol (stream decoder + byte-exact encoder)
//! - An append-only file (AOF) recording every mutating command
//! - Crash recovery by replaying the AOF, tolerating a torn final record
//! - Multi-reader/single-writer store shared by all command handlers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │          (one connection at a time, request → reply)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Decoder → Value
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │         execute (live)          apply_replayed (startup)     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │ SET / HSET              │ every command
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     AOF     │          │    Store    │
//!   │  (Append)   │          │  (RwLock)   │
//!   └──────┬──────┘          └─────────────┘
//!          │ fsync every interval
//!          ▼
//!   ┌─────────────┐
//!   │  Sync task  │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod aof;
pub mod store;
pub mod network;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{AofSyncPolicy, Config};
pub use engine::Engine;
pub use protocol::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of respkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
