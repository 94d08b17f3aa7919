//! `[database]` settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Connections one folder mutation can hold at once: the tree lock and the write.
pub const MIN_POOL_SIZE: u32 = 2;

/// PostgreSQL settings for the folder store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `postgres://medialib@localhost/medialib`.
    pub url: String,
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "DatabaseConfig::default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "DatabaseConfig::default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Seconds before an idle connection is closed; `0` keeps them open.
    #[serde(default = "DatabaseConfig::default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl DatabaseConfig {
    const fn default_max_connections() -> u32 {
        10
    }

    const fn default_min_connections() -> u32 {
        1
    }

    const fn default_connect_timeout() -> u64 {
        10
    }

    const fn default_idle_timeout() -> u64 {
        300
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_seconds > 0).then(|| Duration::from_secs(self.idle_timeout_seconds))
    }

    /// Reject pool sizes that cannot serve a folder mutation.
    pub fn check(&self) -> Result<(), AppError> {
        if self.max_connections < MIN_POOL_SIZE {
            return Err(AppError::configuration(format!(
                "database.max_connections must be at least {MIN_POOL_SIZE}, got {}",
                self.max_connections
            )));
        }
        if self.min_connections > self.max_connections {
            return Err(AppError::configuration(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}
