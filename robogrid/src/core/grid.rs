//! Level data and the pure predicates the interpreter validates moves against.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, Direction, InstructionKind};

/// A puzzle level as supplied by the catalog.
///
/// Levels are read-only to the engine. Malformed levels are rejected by
/// [`crate::core::invariants::validate_level`] when the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: u32,
    pub name: String,
    /// Side length; the grid is `grid_size × grid_size`.
    pub grid_size: i32,
    pub start: Cell,
    pub target: Cell,
    /// Initial facing of the robot.
    pub direction: Direction,
    #[serde(default)]
    pub obstacles: BTreeSet<Cell>,
    /// Instruction kinds offered in the palette for this level.
    pub commands: Vec<InstructionKind>,
    /// Move count that earns three stars.
    pub optimal_moves: u32,
    #[serde(default)]
    pub hint: String,
}

impl Level {
    pub fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.grid_size).contains(&cell.x) && (0..self.grid_size).contains(&cell.y)
    }

    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.obstacles.contains(&cell)
    }

    pub fn is_valid_cell(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.is_obstacle(cell)
    }

    pub fn is_target(&self, cell: Cell) -> bool {
        cell == self.target
    }

    /// True if the palette for this level offers `kind`.
    pub fn allows(&self, kind: InstructionKind) -> bool {
        self.commands.contains(&kind)
    }
}
