//! Store configuration loaded from the environment.

use std::time::Duration;

pub const DATABASE_URL_VAR: &str = "STOCKROOM_DATABASE_URL";
pub const MAX_CONNECTIONS_VAR: &str = "STOCKROOM_MAX_CONNECTIONS";

const DEFAULT_DATABASE_URL: &str = "sqlite://stockroom.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// How long a connection waits on a locked database before giving up.
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(DATABASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.database_url = url;
        }

        if let Some(raw) = lookup(MAX_CONNECTIONS_VAR) {
            match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => config.max_connections = n,
                _ => tracing::warn!(
                    var = MAX_CONNECTIONS_VAR,
                    value = %raw,
                    default = DEFAULT_MAX_CONNECTIONS,
                    "invalid connection limit, using default"
                ),
            }
        }

        config
    }

    /// A private in-memory database, dropped with the pool.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}
