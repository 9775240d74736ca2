//! Level invariants not expressible via JSON Schema.

use std::collections::HashSet;

use crate::core::grid::Level;

/// Check one level:
/// - `grid_size > 0`
/// - `start` and `target` in bounds and not obstacles
/// - every obstacle in bounds
/// - palette non-empty and free of duplicates
pub fn validate_level(level: &Level) -> Vec<String> {
    let mut errors = Vec::new();
    let label = format!("level {}", level.id);

    if level.grid_size <= 0 {
        errors.push(format!("{}: gridSize must be > 0", label));
    }

    for (name, cell) in [("start", level.start), ("target", level.target)] {
        if !level.in_bounds(cell) {
            errors.push(format!(
                "{}: {} ({}, {}) is out of bounds",
                label, name, cell.x, cell.y
            ));
        } else if level.is_obstacle(cell) {
            errors.push(format!(
                "{}: {} ({}, {}) is an obstacle",
                label, name, cell.x, cell.y
            ));
        }
    }

    for obstacle in &level.obstacles {
        if !level.in_bounds(*obstacle) {
            errors.push(format!(
                "{}: obstacle ({}, {}) is out of bounds",
                label, obstacle.x, obstacle.y
            ));
        }
    }

    if level.commands.is_empty() {
        errors.push(format!("{}: commands must not be empty", label));
    }
    let mut seen = HashSet::new();
    for kind in &level.commands {
        if !seen.insert(*kind) {
            errors.push(format!("{}: duplicate command '{}'", label, kind.as_str()));
        }
    }

    errors
}

/// Check every level plus catalog-wide id uniqueness.
pub fn validate_catalog(levels: &[Level]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for level in levels {
        if !seen.insert(level.id) {
            errors.push(format!("duplicate level id {}", level.id));
        }
        errors.extend(validate_level(level));
    }
    errors
}
