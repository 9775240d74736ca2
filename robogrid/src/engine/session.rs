//! One level being played: its authored program plus the engine driving it.

use crate::core::grid::Level;
use crate::core::program::{NodeId, Program};
use crate::core::scoring::stars;
use crate::core::types::{RunStatus, Snapshot};
use crate::engine::handle::{Engine, RunReport};
use crate::engine::interpreter::{RobotState, StepReport};
use crate::engine::pacer::Pacer;

/// Game session for a single level.
///
/// The session owns the program being authored. The engine handle can be
/// cloned out with [`Session::engine`] for a thread that renders or resets
/// while a run is in flight.
#[derive(Debug)]
pub struct Session {
    level: Level,
    program: Program,
    engine: Engine,
}

impl Session {
    pub fn new(level: Level, max_units: usize) -> Self {
        let engine = Engine::new(max_units);
        engine.load_level(&level);
        Self {
            level,
            program: Program::new(),
            engine,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Authoring access. Edits never reach a run that already started.
    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Run the current program. See [`Engine::run`].
    pub fn run<P: Pacer, F: FnMut(&StepReport)>(
        &self,
        pacer: &P,
        on_step: F,
    ) -> Option<RunReport> {
        self.engine.run(&self.program, Some(&self.level), pacer, on_step)
    }

    /// Reset robot and trace, keeping the program.
    pub fn reset_position(&self) {
        self.engine.reset();
    }

    /// Reset robot and trace and discard the program.
    pub fn reset_game(&mut self) {
        self.program.clear();
        self.engine.reset();
    }

    pub fn position(&self) -> RobotState {
        self.engine.robot()
    }

    /// Accumulated rotation in degrees.
    pub fn rotation(&self) -> i32 {
        self.engine.robot().rotation
    }

    pub fn status(&self) -> RunStatus {
        self.engine.status()
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.engine.highlighted()
    }

    /// Index of the unit being executed, `None` between steps and when idle.
    pub fn current_step(&self) -> Option<usize> {
        self.engine.current_step()
    }

    pub fn trace(&self) -> Vec<Snapshot> {
        self.engine.trace()
    }

    /// Stars earned by `report`, scored on the number of top-level
    /// instructions. Unsolved runs score zero.
    pub fn stars(&self, report: &RunReport) -> u8 {
        if !report.reached_target() {
            return 0;
        }
        stars(self.program.len(), self.level.optimal_moves)
    }
}
