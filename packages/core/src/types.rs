// ABOUTME: Result envelope shared by every mutating storage operation
// ABOUTME: Mirrors the {success, message} shape consumed by front-ends

use serde::{Deserialize, Serialize};

/// Outcome of a mutating call.
///
/// `message` is empty on success and carries a human-readable reason on
/// failure. Persistence failures are not reported here; they surface as
/// errors from the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl MutationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
