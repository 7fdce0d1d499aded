use crate::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the data-source name
pub const ENV_DSN: &str = "SQL_DSN";
/// Environment variable holding the maximum number of open connections
pub const ENV_MAX_OPEN_CONNS: &str = "SQL_MAX_OPEN_CONNS";
/// Environment variable holding the maximum number of idle connections
pub const ENV_MAX_IDLE_CONNS: &str = "SQL_MAX_IDLE_CONNS";
/// Environment variable holding the maximum connection lifetime in minutes
pub const ENV_MAX_CONN_LIFETIME_MINS: &str = "SQL_MAX_CONN_LIFETIME_MINS";

/// Configuration for the relational record store and its connection pool
///
/// The four pool settings have no defaults and must be supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SqlConfig {
    /// Data-source name: an SQLite database path or `file:` URI
    pub dsn: String,

    /// Upper bound on connections checked out at once (>= 1)
    pub max_open_conns: usize,

    /// Connections kept open while unused (<= max_open_conns)
    pub max_idle_conns: usize,

    /// Connections older than this are closed instead of reused (>= 1)
    pub max_conn_lifetime_mins: u64,

    /// Enable WAL mode
    /// Default: true
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// SQLite synchronous mode
    #[serde(default)]
    pub synchronous: SynchronousMode,

    /// How long a statement waits on a locked database before failing
    /// Default: 5000
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SynchronousMode {
    /// Full fsync (safest, slowest)
    Full,
    /// fsync at critical moments (good balance)
    #[default]
    Normal,
    /// No fsync (fastest, least safe)
    Off,
}

impl SynchronousMode {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            SynchronousMode::Full => "FULL",
            SynchronousMode::Normal => "NORMAL",
            SynchronousMode::Off => "OFF",
        }
    }
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl SqlConfig {
    pub fn new(
        dsn: impl Into<String>,
        max_open_conns: usize,
        max_idle_conns: usize,
        max_conn_lifetime_mins: u64,
    ) -> Self {
        Self {
            dsn: dsn.into(),
            max_open_conns,
            max_idle_conns,
            max_conn_lifetime_mins,
            wal_mode: default_wal_mode(),
            synchronous: SynchronousMode::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    /// Load the pool settings from `SQL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the pool settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key).ok_or_else(|| StoreError::Config(format!("{} is not set", key)))
        };
        let number = |key: &str| -> Result<u64> {
            let raw = require(key)?;
            raw.trim()
                .parse()
                .map_err(|e| StoreError::Config(format!("{} = '{}': {}", key, raw, e)))
        };

        let count = |key: &str| -> Result<usize> {
            let value = number(key)?;
            usize::try_from(value).map_err(|_| {
                StoreError::Config(format!("{} = {} does not fit in usize", key, value))
            })
        };

        let config = Self::new(
            require(ENV_DSN)?,
            count(ENV_MAX_OPEN_CONNS)?,
            count(ENV_MAX_IDLE_CONNS)?,
            number(ENV_MAX_CONN_LIFETIME_MINS)?,
        );
        config.validate()?;
        Ok(config)
    }

    pub fn with_wal_mode(mut self, wal_mode: bool) -> Self {
        self.wal_mode = wal_mode;
        self
    }

    pub fn with_synchronous(mut self, synchronous: SynchronousMode) -> Self {
        self.synchronous = synchronous;
        self
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    pub fn max_conn_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_conn_lifetime_mins.saturating_mul(60))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Check the DSN and the pool limits against each other
    ///
    /// A private in-memory database is rejected: every pooled connection
    /// would open its own empty database.
    pub fn validate(&self) -> Result<()> {
        if self.dsn.trim().is_empty() {
            return Err(StoreError::Config("dsn must not be empty".into()));
        }
        if is_private_memory_dsn(&self.dsn) {
            return Err(StoreError::Config(format!(
                "dsn '{}' is a private in-memory database; use a file path or a \
                 'file:<name>?mode=memory&cache=shared' URI",
                self.dsn
            )));
        }
        if self.max_open_conns == 0 {
            return Err(StoreError::Config("max_open_conns must be at least 1".into()));
        }
        if self.max_idle_conns > self.max_open_conns {
            return Err(StoreError::Config(format!(
                "max_idle_conns ({}) exceeds max_open_conns ({})",
                self.max_idle_conns, self.max_open_conns
            )));
        }
        if self.max_conn_lifetime_mins == 0 {
            return Err(StoreError::Config(
                "max_conn_lifetime_mins must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Whether the DSN names an in-memory database that is not shared between
/// connections
fn is_private_memory_dsn(dsn: &str) -> bool {
    let dsn = dsn.trim();
    if dsn == ":memory:" {
        return true;
    }
    let Some(uri) = dsn.strip_prefix("file:") else {
        return false;
    };

    let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
    let params: Vec<(&str, &str)> = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect();
    let param = |name: &str| {
        params
            .iter()
            .rev()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    };

    let in_memory = path == ":memory:" || param("mode") == Some("memory");
    in_memory && param("cache") != Some("shared")
}
