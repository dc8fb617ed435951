//! AOF handle
//!
//! Owns the log file. Appends, syncs and replay all go through one mutex, so
//! no reader sees a half-written record and no two writers interleave.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::AofSyncPolicy;
use crate::error::{KvError, Result};
use crate::protocol::{encode, Value};

use super::replay::{replay_records, ReplayResult};
use super::sync::SyncTask;

/// The append-only file
pub struct Aof {
    path: PathBuf,

    policy: AofSyncPolicy,

    /// Shared with the background sync task
    file: Arc<Mutex<AofFile>>,

    /// Present only for interval policies
    sync_task: Option<SyncTask>,
}

/// File handle plus the length of its last complete record
pub(super) struct AofFile {
    file: File,
    len: u64,
}

impl AofFile {
    /// Append one encoded record. On failure the file is cut back to its
    /// previous length so earlier records stay intact.
    fn append(&mut self, bytes: &[u8], sync: bool) -> Result<()> {
        let outcome = self.file.write_all(bytes).and_then(|()| {
            if sync {
                self.file.sync_data()
            } else {
                Ok(())
            }
        });

        if let Err(e) = outcome {
            if let Err(rollback) = self.file.set_len(self.len) {
                error!(
                    "AOF rollback to {} bytes failed after write error: {}",
                    self.len, rollback
                );
            }
            return Err(KvError::WriteFailure(e.to_string()));
        }

        self.len += bytes.len() as u64;
        Ok(())
    }

    pub(super) fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        self.len = len;
        Ok(())
    }
}

impl Aof {
    /// Open or create the AOF at `path`
    ///
    /// Starts the background sync task when the policy is interval based.
    pub fn open(path: &Path, policy: AofSyncPolicy) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let len = file.metadata()?.len();

        let file = Arc::new(Mutex::new(AofFile { file, len }));
        let sync_task = match policy.interval() {
            Some(every) => Some(SyncTask::spawn(Arc::clone(&file), every)?),
            None => None,
        };

        info!(
            "Opened AOF {} ({} bytes, fsync {})",
            path.display(),
            len,
            policy
        );

        Ok(Self {
            path: path.to_path_buf(),
            policy,
            file,
            sync_task,
        })
    }

    /// Append a record
    ///
    /// A failure is reported as `WriteFailure` and leaves the file exactly as
    /// it was before the call.
    pub fn append(&self, value: &Value) -> Result<()> {
        let bytes = encode(value);
        let mut file = self.file.lock();
        file.append(&bytes, self.policy == AofSyncPolicy::Always)?;
        debug!("AOF append: {} bytes, log now {} bytes", bytes.len(), file.len);
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&self) -> Result<()> {
        self.file.lock().sync()
    }

    /// Replay every record from the start of the file
    ///
    /// `callback` runs once per decoded record, in file order. A record cut
    /// short by a crash ends replay cleanly and is removed from the file so
    /// new appends follow the last complete record. Any other decode error is
    /// a `ReplayFailure`.
    pub fn replay<F>(&self, mut callback: F) -> Result<ReplayResult>
    where
        F: FnMut(Value),
    {
        let mut file = self.file.lock();

        let mut reader = file
            .file
            .try_clone()
            .map_err(|e| KvError::ReplayFailure(format!("cannot reopen AOF: {}", e)))?;
        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| KvError::ReplayFailure(format!("cannot rewind AOF: {}", e)))?;

        let mut result = replay_records(BufReader::new(reader), &mut callback)?;

        if result.was_truncated {
            result.bytes_discarded = file.len.saturating_sub(result.bytes_replayed);
            warn!(
                "AOF {} ends with an incomplete record; discarding {} trailing bytes",
                self.path.display(),
                result.bytes_discarded
            );
            file.truncate(result.bytes_replayed)?;
        }

        info!(
            "AOF replay: {} records, {} bytes",
            result.records_replayed, result.bytes_replayed
        );

        Ok(result)
    }

    /// Stop the sync task, flush, and release the file
    pub fn close(mut self) -> Result<()> {
        if let Some(mut task) = self.sync_task.take() {
            task.stop();
        }
        self.file.lock().file.sync_all()?;
        debug!("Closed AOF {}", self.path.display());
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> AofSyncPolicy {
        self.policy
    }

    /// Current length in bytes
    pub fn size(&self) -> u64 {
        self.file.lock().len
    }
}

#[cfg(test)]
impl Aof {
    /// Handle over a read-only descriptor, so every append fails
    pub(crate) fn open_read_only(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        drop(file);
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            policy: AofSyncPolicy::Always,
            file: Arc::new(Mutex::new(AofFile { file, len })),
            sync_task: None,
        })
    }
}
