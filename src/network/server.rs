//! TCP Server
//!
//! Accepts connections and serves them one at a time, in accept order.

use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;

use super::Connection;

/// How long the accept loop sleeps when no client is waiting
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Stops a running [`Server`] from any thread, including signal handlers
///
/// Besides raising the stop flag it shuts down the socket of the client being
/// served, so a blocked read returns instead of waiting for that client.
#[derive(Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    active: Arc<Mutex<Option<TcpStream>>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.requested.store(true, Ordering::SeqCst);
        if let Some(stream) = self.active.lock().as_ref() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Register the connection being served
    fn track(&self, stream: TcpStream) {
        let mut active = self.active.lock();
        // Flag checked under the lock so a concurrent shutdown cannot miss it
        if self.is_shutdown() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        *active = Some(stream);
    }

    fn untrack(&self) {
        self.active.lock().take();
    }
}

/// TCP server for respkv
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: Option<TcpListener>,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Create a new server with the given config and engine
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config,
            engine,
            listener: None,
            shutdown: ShutdownHandle::default(),
        }
    }

    /// Bind the listen address without serving yet
    ///
    /// Returns the bound address, useful with port 0.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(&self.config.listen_addr)?;
        // Non-blocking so the loop can notice shutdown requests
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        tracing::info!("Listening on {}", addr);
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let Some(listener) = self.listener.as_ref() else {
            return Ok(());
        };

        while !self.shutdown.is_shutdown() {
            let (stream, peer) = match listener.accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    continue;
                }
            };

            tracing::info!("Accepted connection from {}", peer);
            if let Err(e) = stream.set_nonblocking(false) {
                tracing::warn!("Failed to configure connection from {}: {}", peer, e);
                continue;
            }

            let tracked = match stream.try_clone() {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("Failed to set up connection from {}: {}", peer, e);
                    continue;
                }
            };

            let mut connection = match Connection::new(stream, Arc::clone(&self.engine)) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Failed to set up connection from {}: {}", peer, e);
                    continue;
                }
            };
            if let Err(e) = connection
                .set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)
            {
                tracing::warn!("Failed to set timeouts for {}: {}", peer, e);
                continue;
            }

            self.shutdown.track(tracked);
            if let Err(e) = connection.handle() {
                tracing::warn!("Connection {} ended with error: {}", peer, e);
            }
            self.shutdown.untrack();
        }

        tracing::info!("Server shut down");
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Handle that stops the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }
}
