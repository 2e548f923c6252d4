// ABOUTME: Core types, messages, and utilities for Courier
// ABOUTME: Foundational package shared by the storage, records, and CLI packages

pub mod constants;
pub mod messages;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export main types
pub use types::MutationResult;

// Re-export constants
pub use constants::{courier_dir, database_file, DATABASE_FILE_NAME};

// Re-export utilities
pub use utils::generate_id;

// Re-export validation
pub use validation::{truncate, validate_name, ValidationError};
