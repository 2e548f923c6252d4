// ABOUTME: User-facing failure messages returned in mutation results
// ABOUTME: Kept in one place so callers and tests compare against the same text

/// Returned when a record is created or updated without a name
pub const RECORD_NAME_REQUIRED: &str = "Record name must not be empty";

