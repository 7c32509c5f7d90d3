//! Configuration for matchdb.
//!
//! Pipeline tunables and the database location each have a compile-time
//! default and can be overridden through an environment variable (a `.env`
//! file in the working directory is loaded first). Command-line flags take
//! precedence over both.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_DIR: &str = ".config/matchdb/data";
const DEV_DATA_DIR: &str = "./data";
const DATABASE_FILE: &str = "matches.db";

const DEFAULT_WORKER_COUNT: usize = 4;
const DEFAULT_BATCH_SIZE: usize = 500;
const DEFAULT_FLUSH_INTERVAL_MS: u64 = 100;

/// SQLite takes one writer at a time; past this, extra connections only queue
/// on the busy timeout.
pub const MAX_CONNECTIONS: u32 = 16;

pub const WORKERS_VAR: &str = "MATCHDB_WORKERS";
pub const BATCH_SIZE_VAR: &str = "MATCHDB_BATCH_SIZE";
pub const FLUSH_INTERVAL_VAR: &str = "MATCHDB_FLUSH_INTERVAL_MS";
pub const DATA_DIR_VAR: &str = "MATCHDB_DATA_DIR";

/// Invalid pipeline configuration. Always fatal for a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    Unparseable { name: &'static str, value: String },
    #[error("{name} must be greater than zero")]
    NotPositive { name: &'static str },
}

/// Get the data directory holding the database file.
///
/// Priority:
/// 1. `MATCHDB_DATA_DIR` env variable if set
/// 2. `$HOME/.config/matchdb/data` if HOME is set
/// 3. `./data` as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_VAR) {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Get the SQLite database path inside the data directory.
pub fn get_database_path() -> PathBuf {
    get_data_dir().join(DATABASE_FILE)
}

/// Tunables for the batch writer. Construction validates every field, so a
/// `PipelineConfig` in hand is always usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    worker_count: usize,
    batch_size: usize,
    flush_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
        }
    }
}

impl PipelineConfig {
    pub fn new(
        worker_count: usize,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Result<Self, ConfigError> {
        if worker_count == 0 {
            return Err(ConfigError::NotPositive { name: WORKERS_VAR });
        }
        if batch_size == 0 {
            return Err(ConfigError::NotPositive {
                name: BATCH_SIZE_VAR,
            });
        }
        if flush_interval.is_zero() {
            return Err(ConfigError::NotPositive {
                name: FLUSH_INTERVAL_VAR,
            });
        }
        Ok(Self {
            worker_count,
            batch_size,
            flush_interval,
        })
    }

    /// Read tunables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read tunables through `lookup`; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let worker_count = parse_var(&lookup, WORKERS_VAR)?.unwrap_or(defaults.worker_count);
        let batch_size = parse_var(&lookup, BATCH_SIZE_VAR)?.unwrap_or(defaults.batch_size);
        let flush_interval = parse_var::<u64>(&lookup, FLUSH_INTERVAL_VAR)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.flush_interval);
        Self::new(worker_count, batch_size, flush_interval)
    }

    /// Apply command-line overrides on top of this configuration.
    pub fn with_overrides(
        self,
        worker_count: Option<usize>,
        batch_size: Option<usize>,
        flush_interval_ms: Option<u64>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            worker_count.unwrap_or(self.worker_count),
            batch_size.unwrap_or(self.batch_size),
            flush_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(self.flush_interval),
        )
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Bound of the shared job queue: one full batch per worker.
    pub fn queue_capacity(&self) -> usize {
        self.worker_count * self.batch_size
    }

    /// Database connections for a rebuild: one per worker, plus one for the
    /// truncate and the read queries around it.
    pub fn connection_count(&self) -> u32 {
        u32::try_from(self.worker_count)
            .unwrap_or(u32::MAX)
            .saturating_add(1)
            .min(MAX_CONNECTIONS)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Unparseable { name, value: raw }),
    }
}
