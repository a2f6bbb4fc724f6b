//! Stable exit codes.

/// Dispatch finished without error.
pub const OK: i32 = 0;
/// Any failure that does not carry its own code.
pub const FAILURE: i32 = 1;
/// The binary was invoked with an unreadable or invalid manifest.
pub const INVALID_MANIFEST: i32 = 2;
/// Help was requested for a command that does not exist.
pub const NO_HELP_TOPIC: i32 = 3;
