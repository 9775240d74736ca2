//! Test-only helpers for constructing levels, programs and pacers.

use std::sync::{Mutex, PoisonError};

use crate::core::grid::Level;
use crate::core::program::Program;
use crate::core::types::{Cell, Direction, InstructionKind};
use crate::engine::interpreter::StepView;
use crate::engine::pacer::Pacer;

/// Deterministic 5x5 level: start (2, 4) facing up, target (2, 2), every
/// command offered, plus the given obstacle cells.
pub fn level_with_obstacles(obstacles: &[(i32, i32)]) -> Level {
    Level {
        id: 1,
        name: "Test Walk".to_string(),
        grid_size: 5,
        start: Cell::new(2, 4),
        target: Cell::new(2, 2),
        direction: Direction::Up,
        obstacles: obstacles.iter().map(|&(x, y)| Cell::new(x, y)).collect(),
        commands: InstructionKind::ALL.to_vec(),
        optimal_moves: 2,
        hint: "Walk straight up.".to_string(),
    }
}

/// Flat program of top-level instructions. Loops get the default count
/// and no body.
pub fn program_of(kinds: &[InstructionKind]) -> Program {
    let mut program = Program::new();
    for &kind in kinds {
        program.append(kind, None);
    }
    program
}

type PauseHook = Box<dyn Fn(&StepView) + Send + Sync>;

/// Pacer that records every highlighted step and never sleeps.
///
/// An optional hook runs inside each suspension, after the step is recorded,
/// which is where tests reset the engine to exercise cancellation.
#[derive(Default)]
pub struct RecordingPacer {
    seen: Mutex<Vec<StepView>>,
    hook: Option<PauseHook>,
}

impl RecordingPacer {
    pub fn with_hook(hook: impl Fn(&StepView) + Send + Sync + 'static) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            hook: Some(Box::new(hook)),
        }
    }

    pub fn steps(&self) -> Vec<StepView> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.steps().iter().map(|step| step.index).collect()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, step: &StepView) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*step);
        if let Some(hook) = &self.hook {
            hook(step);
        }
    }
}
