// ABOUTME: Storage configuration for the SQLite connection pool
// ABOUTME: Database location, journal mode, and pool sizing

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub enable_wal: bool,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
}

impl StorageConfig {
    /// Default settings pointed at a specific database file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: courier_core::database_file(),
            enable_wal: true,
            max_connections: 10,
            busy_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_overrides_only_path() {
        let config = StorageConfig::at("/tmp/elsewhere.db");
        assert_eq!(config.path, PathBuf::from("/tmp/elsewhere.db"));
        assert!(config.enable_wal);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.busy_timeout_seconds, 30);
    }

    #[test]
    fn test_default_path_is_in_courier_dir() {
        let config = StorageConfig::default();
        assert!(config.path.ends_with(".courier/courier.db"));
    }
}
