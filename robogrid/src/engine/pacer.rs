//! Suspension policies injected into the run driver.

use std::thread;
use std::time::Duration;

use crate::engine::interpreter::StepView;

/// Delay between publishing a highlight and applying its effect, in the
/// reference game.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

/// Called once per unit, after the highlight is published and before the
/// effect is applied. The engine lock is not held while pausing, so an
/// implementation may read state or reset the engine.
pub trait Pacer {
    fn pause(&self, step: &StepView);
}

/// Blocks the driving thread for a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct SleepPacer {
    delay: Duration,
}

impl SleepPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl Default for SleepPacer {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DELAY)
    }
}

impl Pacer for SleepPacer {
    fn pause(&self, _step: &StepView) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

/// Runs as fast as possible. Useful for scoring and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn pause(&self, _step: &StepView) {}
}

impl<F: Fn(&StepView)> Pacer for F {
    fn pause(&self, step: &StepView) {
        self(step);
    }
}
