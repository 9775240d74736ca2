//! Shared deterministic types for the robot simulation.
//!
//! These types define stable contracts between the grid model, the expander
//! and the interpreter. They carry no I/O and serialize to the same shapes the
//! level catalog and run reports use.

use serde::{Deserialize, Serialize};

/// Integer cell coordinate. `y` grows downwards (row 0 is the top row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell reached by taking `steps` steps along `direction`.
    pub fn offset(self, direction: Direction, steps: i32) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx * steps,
            y: self.y + dy * steps,
        }
    }
}

/// Cardinal facing of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Rotation in degrees for this facing (`UP = 0`, clockwise).
    pub fn degrees(self) -> i32 {
        match self {
            Direction::Up => 0,
            Direction::Right => 90,
            Direction::Down => 180,
            Direction::Left => 270,
        }
    }

    /// Resolve a facing from an accumulated rotation.
    ///
    /// The rotation is normalized into `0..360` first. Anything that is not a
    /// multiple of 90 falls back to `Up`.
    pub fn from_rotation(rotation: i32) -> Self {
        match rotation.rem_euclid(360) {
            90 => Direction::Right,
            180 => Direction::Down,
            270 => Direction::Left,
            _ => Direction::Up,
        }
    }

    /// Unit step `(dx, dy)` in grid coordinates.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Right => "RIGHT",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
        }
    }
}

/// Closed set of instruction kinds a learner can place in a program.
///
/// The serialized form is the palette id used by level catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionKind {
    Forward,
    Back,
    TurnLeft,
    TurnRight,
    Wait,
    Jump,
    Loop,
    Stop,
}

impl InstructionKind {
    pub const ALL: [InstructionKind; 8] = [
        InstructionKind::Forward,
        InstructionKind::Back,
        InstructionKind::TurnLeft,
        InstructionKind::TurnRight,
        InstructionKind::Wait,
        InstructionKind::Jump,
        InstructionKind::Loop,
        InstructionKind::Stop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InstructionKind::Forward => "forward",
            InstructionKind::Back => "back",
            InstructionKind::TurnLeft => "turn_left",
            InstructionKind::TurnRight => "turn_right",
            InstructionKind::Wait => "wait",
            InstructionKind::Jump => "jump",
            InstructionKind::Loop => "loop",
            InstructionKind::Stop => "stop",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == id)
    }
}

/// Tag on a history snapshot for effects other than a plain move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Turn,
    Wait,
    Jump,
}

/// One committed world state in the history trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub position: Cell,
    pub rotation: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

/// Lifecycle of the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Complete,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The robot landed on the target.
    Won,
    /// Every unit executed and the robot is not on the target.
    NotReached,
    /// A `stop` instruction ended the run.
    Stopped,
    /// A reset invalidated the run while it was suspended.
    Cancelled,
}

impl RunOutcome {
    pub fn reached_target(self) -> bool {
        self == RunOutcome::Won
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunOutcome::Won => "won",
            RunOutcome::NotReached => "not_reached",
            RunOutcome::Stopped => "stopped",
            RunOutcome::Cancelled => "cancelled",
        }
    }
}
