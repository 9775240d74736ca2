//! Stepwise interpreter for expanded programs.
//!
//! A run is split into two calls per unit so that pacing lives outside the
//! simulation: [`Interpreter::begin_step`] publishes the highlight, the caller
//! suspends however it likes, and [`Interpreter::commit_step`] applies the
//! effect. Every call carries the [`RunTicket`] returned by
//! [`Interpreter::start`]; a reset bumps the generation so a suspended stale
//! run can no longer touch state.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::core::expand::{ExecutionUnit, expand_bounded};
use crate::core::grid::Level;
use crate::core::program::{NodeId, Program};
use crate::core::types::{
    Action, Cell, Direction, InstructionKind, RunOutcome, RunStatus, Snapshot,
};

/// Default cap on expanded program length.
pub const DEFAULT_MAX_UNITS: usize = 10_000;

/// Position and facing of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RobotState {
    pub position: Cell,
    /// Accumulated rotation in degrees. Only the value mod 360 is meaningful.
    pub rotation: i32,
}

impl RobotState {
    pub fn initial(level: &Level) -> Self {
        Self {
            position: level.start,
            rotation: level.direction.degrees(),
        }
    }

    pub fn facing(&self) -> Direction {
        Direction::from_rotation(self.rotation)
    }

    fn snapshot(&self, action: Option<Action>) -> Snapshot {
        Snapshot {
            position: self.position,
            rotation: self.rotation,
            action,
        }
    }
}

impl Default for RobotState {
    fn default() -> Self {
        Self {
            position: Cell::new(0, 0),
            rotation: 0,
        }
    }
}

/// Proof that a caller owns the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket {
    generation: u64,
}

/// Highlight published before a unit's suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepView {
    /// Index into the expansion.
    pub index: usize,
    pub unit: ExecutionUnit,
}

/// World effect of one committed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Loop marker; nothing happens.
    Marker,
    Moved { to: Cell },
    Jumped { to: Cell },
    /// Move or jump rejected; the robot stays put.
    Blocked { toward: Cell },
    Turned { rotation: i32 },
    Waited,
    Stopped,
}

/// Result of a committed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub unit: ExecutionUnit,
    pub effect: Effect,
    /// Set when this unit ended the run.
    pub outcome: Option<RunOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    /// Suspend, then call [`Interpreter::commit_step`].
    Highlighted(StepView),
    /// The expansion is exhausted.
    Finished(RunOutcome),
    /// The ticket no longer owns the run.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied(StepReport),
    /// Called without a preceding highlight.
    NotHighlighted,
    Stale,
}

/// The simulation state machine: robot state, history trace and run cursor.
#[derive(Debug, Clone)]
pub struct Interpreter {
    level: Option<Arc<Level>>,
    robot: RobotState,
    trace: Vec<Snapshot>,
    status: RunStatus,
    units: Vec<ExecutionUnit>,
    cursor: usize,
    highlighted: Option<StepView>,
    generation: u64,
    max_units: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNITS)
    }
}

impl Interpreter {
    pub fn new(max_units: usize) -> Self {
        Self {
            level: None,
            robot: RobotState::default(),
            trace: Vec::new(),
            status: RunStatus::Idle,
            units: Vec::new(),
            cursor: 0,
            highlighted: None,
            generation: 0,
            max_units,
        }
    }

    /// Bind a level and reset to its initial state.
    pub fn load_level(&mut self, level: &Level) {
        self.level = Some(Arc::new(level.clone()));
        self.reset();
    }

    /// Start a run of `program` on `level`.
    ///
    /// Returns `None` (and changes nothing) when the program is empty, the
    /// level is absent, a run is already in progress, or the program expands
    /// past the configured cap.
    pub fn start(&mut self, program: &Program, level: Option<&Level>) -> Option<RunTicket> {
        let level = level?;
        if program.is_empty() || self.status == RunStatus::Running {
            return None;
        }
        let units = match expand_bounded(program, self.max_units) {
            Ok(units) => units,
            Err(reason) => {
                warn!(level = level.id, %reason, "run rejected");
                return None;
            }
        };

        self.level = Some(Arc::new(level.clone()));
        self.generation += 1;
        self.robot = RobotState::initial(level);
        self.trace = vec![self.robot.snapshot(None)];
        self.status = RunStatus::Running;
        self.units = units;
        self.cursor = 0;
        self.highlighted = None;
        debug!(
            level = level.id,
            units = self.units.len(),
            generation = self.generation,
            "run started"
        );
        Some(RunTicket {
            generation: self.generation,
        })
    }

    /// Back to `Idle` with the bound level's initial state.
    ///
    /// Invalidates any ticket handed out so far.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.robot = self
            .level
            .as_ref()
            .map(|level| RobotState::initial(level))
            .unwrap_or_default();
        self.trace.clear();
        self.status = RunStatus::Idle;
        self.units.clear();
        self.cursor = 0;
        self.highlighted = None;
    }

    fn owns(&self, ticket: RunTicket) -> bool {
        if ticket.generation == self.generation && self.status == RunStatus::Running {
            return true;
        }
        debug!(
            ticket = ticket.generation,
            current = self.generation,
            "stale run ticket"
        );
        false
    }

    /// Publish the next unit as highlighted, or finish the run if none remain.
    pub fn begin_step(&mut self, ticket: RunTicket) -> Begin {
        if !self.owns(ticket) {
            return Begin::Stale;
        }
        if let Some(view) = self.highlighted {
            return Begin::Highlighted(view);
        }
        let Some(unit) = self.units.get(self.cursor).copied() else {
            return Begin::Finished(self.finish_exhausted());
        };
        let view = StepView {
            index: self.cursor,
            unit,
        };
        trace!(index = view.index, id = %unit.id, kind = unit.kind.as_str(), "highlight");
        self.highlighted = Some(view);
        Begin::Highlighted(view)
    }

    /// Apply the effect of the highlighted unit.
    pub fn commit_step(&mut self, ticket: RunTicket) -> Commit {
        if !self.owns(ticket) {
            return Commit::Stale;
        }
        let Some(view) = self.highlighted.take() else {
            return Commit::NotHighlighted;
        };
        let Some(level) = self.level.clone() else {
            return Commit::Stale;
        };
        self.cursor += 1;

        let effect = if view.unit.loop_marker {
            Effect::Marker
        } else {
            self.apply(&level, view.unit.kind)
        };

        let outcome = match effect {
            Effect::Moved { to } | Effect::Jumped { to } if level.is_target(to) => {
                Some(self.finish(RunOutcome::Won, RunStatus::Complete))
            }
            Effect::Stopped => Some(self.finish(RunOutcome::Stopped, RunStatus::Idle)),
            _ => None,
        };
        trace!(index = view.index, ?effect, "committed");

        Commit::Applied(StepReport {
            index: view.index,
            unit: view.unit,
            effect,
            outcome,
        })
    }

    fn apply(&mut self, level: &Level, kind: InstructionKind) -> Effect {
        let facing = self.robot.facing();
        match kind {
            InstructionKind::Forward => self.try_move(level, facing, 1, None),
            InstructionKind::Back => self.try_move(level, facing.opposite(), 1, None),
            InstructionKind::Jump => self.try_move(level, facing, 2, Some(Action::Jump)),
            InstructionKind::TurnLeft => self.turn(-90),
            InstructionKind::TurnRight => self.turn(90),
            InstructionKind::Wait => {
                self.trace.push(self.robot.snapshot(Some(Action::Wait)));
                Effect::Waited
            }
            InstructionKind::Stop => Effect::Stopped,
            // Loops only ever reach the interpreter as markers.
            InstructionKind::Loop => Effect::Marker,
        }
    }

    /// Move `steps` cells along `direction`. Only the landing cell is checked,
    /// which is what lets a jump clear an adjacent obstacle.
    fn try_move(
        &mut self,
        level: &Level,
        direction: Direction,
        steps: i32,
        action: Option<Action>,
    ) -> Effect {
        let to = self.robot.position.offset(direction, steps);
        if !level.is_valid_cell(to) {
            return Effect::Blocked { toward: to };
        }
        self.robot.position = to;
        self.trace.push(self.robot.snapshot(action));
        match action {
            Some(Action::Jump) => Effect::Jumped { to },
            _ => Effect::Moved { to },
        }
    }

    fn turn(&mut self, degrees: i32) -> Effect {
        self.robot.rotation += degrees;
        self.trace.push(self.robot.snapshot(Some(Action::Turn)));
        Effect::Turned {
            rotation: self.robot.rotation,
        }
    }

    /// An exhausted run always goes back to `Idle`; only a landing on the
    /// target marks the level `Complete`. The outcome still reports whether
    /// the robot ends on the target, which is only possible when it never
    /// left a start cell that is also the target.
    fn finish_exhausted(&mut self) -> RunOutcome {
        let reached = self
            .level
            .as_ref()
            .is_some_and(|level| level.is_target(self.robot.position));
        let outcome = if reached {
            RunOutcome::Won
        } else {
            RunOutcome::NotReached
        };
        self.finish(outcome, RunStatus::Idle)
    }

    fn finish(&mut self, outcome: RunOutcome, status: RunStatus) -> RunOutcome {
        self.status = status;
        self.highlighted = None;
        debug!(
            outcome = outcome.as_str(),
            executed = self.cursor,
            trace_len = self.trace.len(),
            "run finished"
        );
        outcome
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn robot(&self) -> RobotState {
        self.robot
    }

    pub fn trace(&self) -> &[Snapshot] {
        &self.trace
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_deref()
    }

    /// Id of the instruction currently highlighted, if a step is suspended.
    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlighted.map(|view| view.unit.id)
    }

    /// Index of the unit currently highlighted, if a step is suspended.
    pub fn current_step(&self) -> Option<usize> {
        self.highlighted.map(|view| view.index)
    }

    /// Units committed so far in the current or last run.
    pub fn executed(&self) -> usize {
        self.cursor
    }

    pub fn expanded_len(&self) -> usize {
        self.units.len()
    }
}
