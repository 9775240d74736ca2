//! Shared engine handle and the paced run driver.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;

use crate::core::grid::Level;
use crate::core::program::{NodeId, Program};
use crate::core::types::{RunOutcome, RunStatus, Snapshot};
use crate::engine::interpreter::{Begin, Commit, Interpreter, RobotState, StepReport};
use crate::engine::pacer::Pacer;

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Robot state when the run ended. For a cancelled run this is whatever
    /// the engine holds when the stale ticket is noticed: the reset state, or
    /// the state of a newer run if one was started in the meantime. The same
    /// goes for `trace` and `units_executed`.
    pub final_state: RobotState,
    pub trace: Vec<Snapshot>,
    /// Units committed before the run ended.
    pub units_executed: usize,
    pub expanded_len: usize,
}

impl RunReport {
    pub fn reached_target(&self) -> bool {
        self.outcome.reached_target()
    }
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineView {
    pub status: RunStatus,
    pub robot: RobotState,
    pub highlighted: Option<NodeId>,
    pub current_step: Option<usize>,
    pub trace: Vec<Snapshot>,
}

/// Cloneable handle to one interpreter.
///
/// Clones share state, so a presentation thread can read or reset the engine
/// while another thread is driving a run.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    inner: Arc<Mutex<Interpreter>>,
}

impl Engine {
    pub fn new(max_units: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Interpreter::new(max_units))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Interpreter> {
        // Interpreter methods never panic halfway through a mutation.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bind `level` and reset to its initial state.
    pub fn load_level(&self, level: &Level) {
        self.lock().load_level(level);
    }

    /// Execute `program` on `level`, pausing through `pacer` between each
    /// highlight and its effect.
    ///
    /// Returns `None` when the run is rejected (empty program, absent level,
    /// a run already in progress, or an oversized expansion). `on_step` sees
    /// every committed unit in order.
    pub fn run<P: Pacer, F: FnMut(&StepReport)>(
        &self,
        program: &Program,
        level: Option<&Level>,
        pacer: &P,
        mut on_step: F,
    ) -> Option<RunReport> {
        let ticket = self.lock().start(program, level)?;

        loop {
            let view = {
                let mut interpreter = self.lock();
                match interpreter.begin_step(ticket) {
                    Begin::Highlighted(view) => view,
                    Begin::Finished(outcome) => return Some(report(&interpreter, outcome)),
                    Begin::Stale => return Some(report(&interpreter, RunOutcome::Cancelled)),
                }
            };

            pacer.pause(&view);

            let step = {
                let mut interpreter = self.lock();
                match interpreter.commit_step(ticket) {
                    Commit::Applied(step) => step,
                    Commit::NotHighlighted | Commit::Stale => {
                        debug!(index = view.index, "run cancelled during pause");
                        return Some(report(&interpreter, RunOutcome::Cancelled));
                    }
                }
            };

            on_step(&step);

            if let Some(outcome) = step.outcome {
                return Some(report(&self.lock(), outcome));
            }
        }
    }

    /// Force the engine back to `Idle` at the level's initial state,
    /// cancelling any run in flight.
    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn status(&self) -> RunStatus {
        self.lock().status()
    }

    pub fn robot(&self) -> RobotState {
        self.lock().robot()
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.lock().highlighted()
    }

    pub fn current_step(&self) -> Option<usize> {
        self.lock().current_step()
    }

    pub fn trace(&self) -> Vec<Snapshot> {
        self.lock().trace().to_vec()
    }

    /// Consistent snapshot of everything the presentation layer renders.
    pub fn view(&self) -> EngineView {
        let interpreter = self.lock();
        EngineView {
            status: interpreter.status(),
            robot: interpreter.robot(),
            highlighted: interpreter.highlighted(),
            current_step: interpreter.current_step(),
            trace: interpreter.trace().to_vec(),
        }
    }
}

fn report(interpreter: &Interpreter, outcome: RunOutcome) -> RunReport {
    RunReport {
        outcome,
        final_state: interpreter.robot(),
        trace: interpreter.trace().to_vec(),
        units_executed: interpreter.executed(),
        expanded_len: interpreter.expanded_len(),
    }
}
