//! Program execution: the interpreter state machine, the shared handle that
//! drives it with an injected pacing policy, and the per-level session.

pub mod handle;
pub mod interpreter;
pub mod pacer;
pub mod session;

