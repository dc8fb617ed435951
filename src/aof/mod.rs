//! Append-Only File (AOF) Module
//!
//! Provides durability by recording every mutating command.
//!
//! ## Responsibilities
//! - Append the encoded request of each mutating command
//! - Periodic fsync from a background task (or per write, or never)
//! - Replay on startup to rebuild the in-memory store
//! - Cut a crash-truncated tail back to the last complete record
//!
//! ## File Format
//! No header, no checksum, no index. Records are back-to-back protocol
//! arrays, self-delimiting through their length prefixes:
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ *3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n   │  record 1
//! ├─────────────────────────────────────────────┤
//! │ *4\r\n$4\r\nHSET\r\n$1\r\nh\r\n ...         │  record 2
//! └─────────────────────────────────────────────┘
//! ```

mod file;
mod replay;
mod sync;

pub use file::Aof;
pub use replay::ReplayResult;
