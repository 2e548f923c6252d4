// ABOUTME: Library side of the courier binary
// ABOUTME: Environment configuration, logging setup, shared storage state, and argument parsing

pub mod args;
pub mod config;
pub mod logging;
pub mod state;

pub use config::{Config, ConfigError};
pub use state::DbState;
