//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TREE_PATH: &str = "data/tree_of_life.json";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Game server configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Tree document to play on (from MYSTERY_TREE_DATA)
    pub tree_path: PathBuf,
    /// Bind host for the HTTP API (from MYSTERY_TREE_HOST)
    pub host: String,
    /// Bind port for the HTTP API (from MYSTERY_TREE_PORT)
    pub port: u16,
    /// Idle time after which an HTTP session is evicted (from MYSTERY_TREE_SESSION_TTL_SECS)
    pub session_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let tree_path = lookup("MYSTERY_TREE_DATA")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TREE_PATH));

        let host = lookup("MYSTERY_TREE_HOST")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = lookup("MYSTERY_TREE_PORT")
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let session_ttl = lookup("MYSTERY_TREE_SESSION_TTL_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_SESSION_TTL_SECS));

        Self {
            tree_path,
            host,
            port,
            session_ttl,
        }
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, tree_path: Option<PathBuf>, port: Option<u16>) -> Self {
        if let Some(path) = tree_path {
            self.tree_path = path;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
