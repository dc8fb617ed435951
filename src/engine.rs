//! Engine Module
//!
//! Ties the store and the AOF together and dispatches commands.
//!
//! ## Responsibilities
//! - Rebuild the store from the AOF on startup
//! - Log mutating commands before applying them
//! - Keep replay from ever writing to the AOF

use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::aof::{Aof, ReplayResult};
use crate::config::Config;
use crate::error::{KvError, Result};
use crate::protocol::{Command, Value};
use crate::store::Store;

/// The command engine
///
/// ## Entry points
/// - [`Engine::execute`]: live requests. Mutating commands are appended to the
///   AOF first and applied only if the append succeeded.
/// - [`Engine::apply_replayed`]: records read back from the AOF. Never logs.
///
/// ## Concurrency
/// - Reads go straight to the store (shared locks)
/// - Writes hold `write_lock` across append + apply, so the AOF order is the
///   order in which effects became visible
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// In-memory keyspace
    store: Store,

    /// Append-only file
    aof: Aof,

    /// Serializes mutating commands
    write_lock: Mutex<()>,

    /// Outcome of the startup replay
    replay: ReplayResult,
}

impl Engine {
    /// Open the AOF, replay it into a fresh store, and start serving
    pub fn open(config: Config) -> Result<Self> {
        let aof = Aof::open(&config.aof_path, config.aof_sync_policy)?;
        let store = Store::new();

        let replay = aof.replay(|record| {
            Self::apply_to(&store, &record);
        })?;

        info!(
            "Engine ready: {} keys, {} hashes restored from {} records",
            store.key_count(),
            store.hash_count(),
            replay.records_replayed
        );

        Ok(Self {
            config,
            store,
            aof,
            write_lock: Mutex::new(()),
            replay,
        })
    }

    /// Open with an AOF path (convenience method)
    ///
    /// Uses default config with the specified AOF path
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().aof_path(path).build())
    }

    /// Execute a live request and produce its reply
    ///
    /// Never fails: parse errors and AOF failures become Error replies.
    pub fn execute(&self, request: &Value) -> Value {
        let command = match Command::from_value(request) {
            Ok(command) => command,
            Err(e) => return Self::error_reply(e),
        };

        if !command.is_mutating() {
            return Self::run(&self.store, command);
        }

        let _write_guard = self.write_lock.lock();

        // Log first: a mutation is only acknowledged once it is in the AOF
        if let Err(e) = self.aof.append(request) {
            warn!("Refusing {}: {}", command.command_type().name(), e);
            return Self::error_reply(e);
        }

        Self::run(&self.store, command)
    }

    /// Apply one record read back from the AOF
    ///
    /// Returns `false` when the record was skipped. Never touches the AOF.
    pub fn apply_replayed(&self, record: &Value) -> bool {
        Self::apply_to(&self.store, record)
    }

    /// Close the engine gracefully
    ///
    /// Stops the sync task and flushes the AOF
    pub fn close(self) -> Result<()> {
        self.aof.close()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn aof(&self) -> &Aof {
        &self.aof
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stats from the startup replay
    pub fn replay_result(&self) -> &ReplayResult {
        &self.replay
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn apply_to(store: &Store, record: &Value) -> bool {
        match Command::from_value(record) {
            Ok(command) => {
                debug!("Replay {}", command.command_type().name());
                Self::run(store, command);
                true
            }
            Err(e) => {
                warn!("Skipping AOF record: {}", e);
                false
            }
        }
    }

    fn run(store: &Store, command: Command) -> Value {
        match command {
            Command::Ping { message: None } => Value::simple("PONG"),
            // Echoed as Bulk: the argument is arbitrary bytes
            Command::Ping {
                message: Some(message),
            } => Value::Bulk(message),
            Command::Get { key } => store.get(&key).into(),
            Command::Set { key, value } => {
                store.set(key, value);
                Value::ok()
            }
            Command::HGet { hash, field } => store.hget(&hash, &field).into(),
            Command::HSet { hash, field, value } => {
                store.hset(hash, field, value);
                Value::ok()
            }
            // Flat field, value, field, value... so the pairing survives
            Command::HGetAll { hash } => match store.hgetall(&hash) {
                Some(pairs) => Value::Array(
                    pairs
                        .into_iter()
                        .flat_map(|(f, v)| [Value::Bulk(f), Value::Bulk(v)])
                        .collect(),
                ),
                None => Value::Null,
            },
        }
    }

    fn error_reply(e: KvError) -> Value {
        match e {
            KvError::Command(message) => Value::error(message),
            other => Value::error(format!("ERR {}", other)),
        }
    }
}
