//! Store Module
//!
//! In-memory keyspace that command handlers operate on.
//!
//! ## Responsibilities
//! - String keys (`GET`/`SET`)
//! - Hashes of field → value (`HGET`/`HSET`/`HGETALL`)
//! - Multi-reader/single-writer access for each map
//!
//! ## Data Structure Choice
//! Two independent `HashMap`s, each behind its own `parking_lot::RwLock`:
//! - Readers of one map never wait on writers of the other
//! - A value is replaced as a whole under the write lock, so a reader sees
//!   either the old or the new value, never a mix

mod table;

pub use table::Store;
