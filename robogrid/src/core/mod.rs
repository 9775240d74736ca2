//! Deterministic, pure game logic.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! levels and programs and return deterministic outputs suitable for tests.

pub mod expand;
pub mod grid;
pub mod invariants;
pub mod program;
pub mod scoring;
pub mod types;
