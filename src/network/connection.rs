//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::protocol::{write_value, Decoder, Value};

/// Handles a single client connection
pub struct Connection {
    /// Request decoder over the buffered TCP reader
    decoder: Decoder<BufReader<TcpStream>>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the engine
    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and disables Nagle's algorithm
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            decoder: Decoder::new(BufReader::new(read_stream)),
            writer: BufWriter::new(write_stream),
            engine,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 = no timeout)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.decoder.get_ref().get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads one request, executes it, writes one reply, repeat.
    /// Returns when the client disconnects or the stream becomes unreadable.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let request = match self.decoder.read_value() {
                Ok(value) => value,
                Err(KvError::EndOfStream) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(KvError::UnexpectedEndOfStream) => {
                    tracing::debug!(
                        "Client {} disconnected in the middle of a request",
                        self.peer_addr
                    );
                    return Ok(());
                }
                Err(KvError::Io(ref e)) if Self::is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} went away: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(KvError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    // WouldBlock on unix, TimedOut on windows
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    // Framing is lost; tell the client and hang up
                    tracing::warn!("Malformed request from {}: {}", self.peer_addr, e);
                    let _ = self.send_reply(&Value::error(format!(
                        "ERR invalid request - unable to parse: {}",
                        e
                    )));
                    return Ok(());
                }
            };

            tracing::trace!(
                "Received {:?} request from {}",
                request.kind(),
                self.peer_addr
            );

            let reply = self.engine.execute(&request);

            if let Err(e) = self.send_reply(&reply) {
                if let KvError::Io(ref io_err) = e {
                    if Self::is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before reply could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Send a reply to the client
    fn send_reply(&mut self, reply: &Value) -> Result<()> {
        write_value(&mut self.writer, reply)
    }

    fn is_disconnect(kind: ErrorKind) -> bool {
        matches!(
            kind,
            ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe
        )
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
