//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Non-blocking accept loop, polled so shutdown is noticed promptly
//! - One connection served at a time, strictly request → reply
//! - Requests routed through Engine

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
