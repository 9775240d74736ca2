//! I/O helpers for robogrid commands.

pub mod catalog;
pub mod config;
pub mod notation;
pub mod report;
