// ABOUTME: Shared utility functions for Courier
// ABOUTME: Prefixed ID generation

/// Generate a prefixed unique ID, e.g. `rec-V1StGXR8_Z5jdHi6B-myT`
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}
