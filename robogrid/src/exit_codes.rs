//! Stable exit codes for robogrid CLI commands.

/// Command succeeded, or the run reached the target.
pub const OK: i32 = 0;
/// Command failed: bad config, catalog, program notation or arguments.
pub const INVALID: i32 = 1;
/// `robogrid run` finished without reaching the target.
pub const NOT_REACHED: i32 = 2;
