//! Program-execution engine for a robot-on-a-grid puzzle game.
//!
//! A learner assembles a program from a fixed palette of instructions,
//! optionally nested in counted loops, and runs it against a level. The
//! crate is split the same way the game is:
//!
//! - **[`core`]**: Pure, deterministic logic (levels, the instruction tree,
//!   loop expansion, validation, scoring). No I/O.
//! - **[`engine`]**: The stepwise interpreter, paced run driver and the
//!   per-level [`engine::session::Session`].
//! - **[`io`]**: Config, level catalogs, program notation and text reports.

pub mod core;
pub mod engine;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
