use courier_storage::StorageConfig;
use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid number for {var}: {source}")]
    InvalidNumber {
        var: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("{var} must be at least 1 (got {value})")]
    OutOfRange { var: &'static str, value: u64 },
    #[error("Invalid boolean for {var}: {value}")]
    InvalidBool { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
    pub enable_wal: bool,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = StorageConfig::default();

        let database_path = lookup("COURIER_DB_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.path);

        let max_connections = match lookup("COURIER_DB_MAX_CONNECTIONS") {
            Some(raw) => {
                let value = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|source| ConfigError::InvalidNumber {
                        var: "COURIER_DB_MAX_CONNECTIONS",
                        source,
                    })?;
                if value == 0 {
                    return Err(ConfigError::OutOfRange {
                        var: "COURIER_DB_MAX_CONNECTIONS",
                        value: 0,
                    });
                }
                value
            }
            None => defaults.max_connections,
        };

        let busy_timeout_seconds = match lookup("COURIER_DB_BUSY_TIMEOUT") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|source| ConfigError::InvalidNumber {
                    var: "COURIER_DB_BUSY_TIMEOUT",
                    source,
                })?,
            None => defaults.busy_timeout_seconds,
        };

        let enable_wal = match lookup("COURIER_DB_WAL") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidBool {
                var: "COURIER_DB_WAL",
                value: raw,
            })?,
            None => defaults.enable_wal,
        };

        let log_filter = lookup("COURIER_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Config {
            database_path,
            max_connections,
            busy_timeout_seconds,
            enable_wal,
            log_filter,
        })
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            path: self.database_path.clone(),
            enable_wal: self.enable_wal,
            max_connections: self.max_connections,
            busy_timeout_seconds: self.busy_timeout_seconds,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
