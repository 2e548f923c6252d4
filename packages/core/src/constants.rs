use std::env;
use std::path::PathBuf;

/// File name of the SQLite database inside the Courier directory
pub const DATABASE_FILE_NAME: &str = "courier.db";

/// Get the path to the Courier directory (~/.courier)
pub fn courier_dir() -> PathBuf {
    // HOME first so tests can redirect it
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".courier")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".courier")
    }
}

/// Get the path to the default database file (~/.courier/courier.db)
pub fn database_file() -> PathBuf {
    courier_dir().join(DATABASE_FILE_NAME)
}
