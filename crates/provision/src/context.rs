//! Progress reporting hooks
//!
//! These traits let the engine report progress without depending on a
//! terminal UI.

use crate::error::StepError;
use crate::types::StepOutcome;

/// Progress callback for plan runs
///
/// Site runs may happen on worker threads, so implementations must be `Sync`
/// and use interior mutability for any state.
pub trait ProgressCallback: Send + Sync {
    /// Called before a plan starts
    fn on_plan_start(&self, target: &str, steps: usize);

    /// Called before a single step runs
    fn on_step_start(&self, target: &str, index: usize, description: &str);

    /// Called after a step succeeded
    fn on_step_complete(&self, target: &str, index: usize, outcome: &StepOutcome);

    /// Called after a step failed
    fn on_step_failed(&self, target: &str, index: usize, error: &StepError);

    /// Called when a plan finished, successfully or not
    fn on_plan_complete(&self, target: &str, success: bool);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_plan_start(&self, _target: &str, _steps: usize) {}
    fn on_step_start(&self, _target: &str, _index: usize, _description: &str) {}
    fn on_step_complete(&self, _target: &str, _index: usize, _outcome: &StepOutcome) {}
    fn on_step_failed(&self, _target: &str, _index: usize, _error: &StepError) {}
    fn on_plan_complete(&self, _target: &str, _success: bool) {}
}
