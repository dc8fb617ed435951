//! Configuration for respkv
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::KvError;

/// Main configuration for a respkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // AOF Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only file. Parent directories are created on open.
    pub aof_path: PathBuf,

    /// How often the AOF is flushed to stable storage
    pub aof_sync_policy: AofSyncPolicy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// AOF fsync policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AofSyncPolicy {
    /// fsync after every append (safest, slowest)
    Always,

    /// fsync from a background task on a fixed interval. Up to one
    /// interval of appends can be lost on a crash.
    Interval(Duration),

    /// Never fsync explicitly; the OS decides. `close` still syncs.
    Never,
}

impl AofSyncPolicy {
    /// The classic once-per-second policy
    pub const EVERY_SEC: AofSyncPolicy = AofSyncPolicy::Interval(Duration::from_secs(1));

    /// Interval for the background task, if this policy needs one
    pub fn interval(&self) -> Option<Duration> {
        match self {
            AofSyncPolicy::Interval(every) => Some(*every),
            _ => None,
        }
    }
}

impl Default for AofSyncPolicy {
    fn default() -> Self {
        Self::EVERY_SEC
    }
}

impl FromStr for AofSyncPolicy {
    type Err = KvError;

    /// Accepts the appendfsync spellings: `always`, `everysec`, `no`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(AofSyncPolicy::Always),
            "everysec" => Ok(AofSyncPolicy::EVERY_SEC),
            "no" | "never" => Ok(AofSyncPolicy::Never),
            other => Err(KvError::Config(format!(
                "unknown fsync policy '{}' (expected always, everysec or no)",
                other
            ))),
        }
    }
}

impl fmt::Display for AofSyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AofSyncPolicy::Always => write!(f, "always"),
            AofSyncPolicy::Interval(every) if *every == Duration::from_secs(1) => {
                write!(f, "everysec")
            }
            AofSyncPolicy::Interval(every) => write!(f, "every {}ms", every.as_millis()),
            AofSyncPolicy::Never => write!(f, "no"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aof_path: PathBuf::from("./respkv_data/appendonly.aof"),
            aof_sync_policy: AofSyncPolicy::default(),
            listen_addr: "127.0.0.1:6379".to_string(),
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the append-only file path
    pub fn aof_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.aof_path = path.into();
        self
    }

    /// Set the AOF fsync policy
    pub fn aof_sync_policy(mut self, policy: AofSyncPolicy) -> Self {
        self.config.aof_sync_policy = policy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
