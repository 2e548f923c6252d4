// ABOUTME: Request records grouped into collections, with a user-defined display order
// ABOUTME: Provides types, the order maintainer, and SQLite-backed storage

pub mod collections;
pub mod order;
pub mod storage;
pub mod types;

// Re-export main types
pub use collections::CollectionStorage;
pub use order::{InProcessSequence, OrderMaintainer, OrderSequence};
pub use storage::RecordStorage;
pub use types::{Collection, CollectionCreateInput, Header, Record};
