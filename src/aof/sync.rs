//! Background fsync task
//!
//! Flushes the AOF on a fixed interval until stopped. Stopping performs one
//! last flush before the thread exits.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, select, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::error::Result;

use super::file::AofFile;

/// Handle to the running sync thread
pub(super) struct SyncTask {
    /// Dropping the sender is the stop signal
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SyncTask {
    pub(super) fn spawn(file: Arc<Mutex<AofFile>>, every: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded(0);
        let handle = thread::Builder::new()
            .name("aof-sync".to_string())
            .spawn(move || run(file, every, stop_rx))?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for its final flush
    pub(super) fn stop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("AOF sync thread panicked");
            }
        }
    }
}

impl Drop for SyncTask {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(file: Arc<Mutex<AofFile>>, every: Duration, stop_rx: Receiver<()>) {
    debug!("AOF sync task started, every {:?}", every);
    let ticker = channel::tick(every);

    loop {
        select! {
            recv(ticker) -> _ => flush(&file),
            recv(stop_rx) -> _ => {
                flush(&file);
                debug!("AOF sync task stopped");
                return;
            }
        }
    }
}

fn flush(file: &Mutex<AofFile>) {
    if let Err(e) = file.lock().sync() {
        error!("AOF fsync failed: {}", e);
    }
}
