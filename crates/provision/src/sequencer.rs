//! Plans and the sequencer that runs them
//!
//! A plan runs its steps in order and stops at the first failure. Earlier
//! steps are not rolled back. `finally` steps run on every exit path, which
//! is how permission leases get narrowed again after a failed write.

use crate::context::{NoProgress, ProgressCallback};
use crate::error::SequencerError;
use crate::executor::StepExecutor;
use crate::step::ProvisioningStep;
use crate::types::{PlanReport, StepRecord};
use std::path::Path;

/// Ordered steps for one target. Rebuild rather than edit.
#[derive(Debug, Clone)]
pub struct ProvisioningPlan {
    target: String,
    steps: Vec<ProvisioningStep>,
    finally: Vec<ProvisioningStep>,
}

impl ProvisioningPlan {
    pub fn builder(target: impl Into<String>) -> PlanBuilder {
        PlanBuilder {
            plan: Self {
                target: target.into(),
                steps: Vec::new(),
                finally: Vec::new(),
            },
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn steps(&self) -> &[ProvisioningStep] {
        &self.steps
    }

    pub fn finally(&self) -> &[ProvisioningStep] {
        &self.finally
    }

    /// Total number of steps, `finally` included
    pub fn len(&self) -> usize {
        self.steps.len() + self.finally.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.finally.is_empty()
    }
}

/// Builder for [`ProvisioningPlan`]
#[derive(Debug)]
pub struct PlanBuilder {
    plan: ProvisioningPlan,
}

impl PlanBuilder {
    pub fn step(mut self, step: ProvisioningStep) -> Self {
        self.plan.steps.push(step);
        self
    }

    /// Add a step that runs after the main steps whatever their outcome
    pub fn finally(mut self, step: ProvisioningStep) -> Self {
        self.plan.finally.push(step);
        self
    }

    /// Widen `path` to `open` now and narrow it to `close` on every exit path
    pub fn lease_permissions(self, path: impl AsRef<Path>, open: u32, close: u32) -> Self {
        let path = path.as_ref();
        self.step(ProvisioningStep::chmod(path, open))
            .finally(ProvisioningStep::chmod(path, close))
    }

    pub fn build(self) -> ProvisioningPlan {
        self.plan
    }
}

/// Runs plans step by step against an executor
pub struct Sequencer<'a> {
    executor: &'a dyn StepExecutor,
    progress: &'a dyn ProgressCallback,
}

impl<'a> Sequencer<'a> {
    pub fn new(executor: &'a dyn StepExecutor) -> Self {
        Self {
            executor,
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Run `plan`, stopping at the first failing step.
    ///
    /// On failure the error names the failing step's index; `finally` steps
    /// still run, and their own failures are logged rather than replacing the
    /// original error.
    pub fn run(&self, plan: &ProvisioningPlan) -> Result<PlanReport, SequencerError> {
        let target = plan.target();
        self.progress.on_plan_start(target, plan.len());
        log::info!("provisioning {target} ({} steps)", plan.len());

        let mut report = PlanReport::new(target);
        let mut failure = None;

        for (index, step) in plan.steps().iter().enumerate() {
            if let Err(err) = self.run_step(target, index, step, &mut report) {
                failure = Some(err);
                break;
            }
        }

        let offset = plan.steps().len();
        for (i, step) in plan.finally().iter().enumerate() {
            let index = offset + i;
            if let Err(err) = self.run_step(target, index, step, &mut report) {
                if failure.is_none() {
                    failure = Some(err);
                } else {
                    log::warn!("{target}: cleanup step failed after an earlier failure: {err}");
                }
            }
        }

        self.progress.on_plan_complete(target, failure.is_none());
        match failure {
            Some(err) => {
                log::warn!("{target}: {err}");
                Err(err)
            }
            None => Ok(report),
        }
    }

    fn run_step(
        &self,
        target: &str,
        index: usize,
        step: &ProvisioningStep,
        report: &mut PlanReport,
    ) -> Result<(), SequencerError> {
        let description = step.description();
        self.progress.on_step_start(target, index, &description);
        log::debug!("{target}[{index}] {description}");

        match self.executor.execute(step) {
            Ok(outcome) => {
                self.progress.on_step_complete(target, index, &outcome);
                report.steps.push(StepRecord {
                    index,
                    description,
                    outcome,
                });
                Ok(())
            }
            Err(source) => {
                self.progress.on_step_failed(target, index, &source);
                Err(SequencerError {
                    index,
                    step: description,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ConfigMap;
    use crate::error::StepError;
    use crate::executor::StepResult;
    use crate::step::{ContentFn, LineMatcher};
    use crate::types::StepOutcome;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records every call; fails on destinations listed in `fail_on`
    #[derive(Default)]
    pub(crate) struct RecordingExecutor {
        pub calls: Mutex<Vec<String>>,
        pub fail_on: Vec<PathBuf>,
    }

    impl RecordingExecutor {
        pub fn failing_on(paths: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: paths.iter().map(PathBuf::from).collect(),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, kind: &str, path: &Path) -> StepResult {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{kind} {}", path.display()));
            if self.fail_on.iter().any(|p| p == path) {
                Err(StepError::TargetNotFound(path.to_path_buf()))
            } else {
                Ok(StepOutcome::Modified)
            }
        }
    }

    impl StepExecutor for RecordingExecutor {
        fn copy(&self, _source: &Path, destination: &Path) -> StepResult {
            self.record("copy", destination)
        }
        fn chmod(&self, path: &Path, mode: u32) -> StepResult {
            self.record(&format!("chmod {mode:o}"), path)
        }
        fn symlink(&self, _source: &Path, destination: &Path) -> StepResult {
            self.record("symlink", destination)
        }
        fn append_line_unless_matches(
            &self,
            path: &Path,
            _matcher: &LineMatcher,
            _line: &str,
        ) -> StepResult {
            self.record("append", path)
        }
        fn conditional_write(&self, path: &Path, _content: &ContentFn) -> StepResult {
            self.record("write", path)
        }
        fn expand_properties(&self, path: &Path, _properties: &ConfigMap) -> StepResult {
            self.record("expand", path)
        }
        fn ensure_dir(&self, path: &Path) -> StepResult {
            self.record("mkdir", path)
        }
    }

    #[test]
    fn test_fail_fast() {
        let executor = RecordingExecutor::failing_on(&["s2"]);
        let plan = ProvisioningPlan::builder("site")
            .step(ProvisioningStep::copy("src", "s1"))
            .step(ProvisioningStep::copy("src", "s2"))
            .step(ProvisioningStep::copy("src", "s3"))
            .build();

        let err = Sequencer::new(&executor).run(&plan).unwrap_err();

        assert_eq!(err.index, 1);
        assert!(matches!(err.source, StepError::TargetNotFound(_)));
        assert_eq!(executor.calls(), ["copy s1", "copy s2"]);
    }

    #[test]
    fn test_finally_runs_after_failure() {
        let executor = RecordingExecutor::failing_on(&["locals"]);
        let plan = ProvisioningPlan::builder("site")
            .lease_permissions("settings.php", 0o777, 0o644)
            .step(ProvisioningStep::copy("src", "locals"))
            .step(ProvisioningStep::copy("src", "never"))
            .build();

        let err = Sequencer::new(&executor).run(&plan).unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(
            executor.calls(),
            [
                "chmod 777 settings.php",
                "copy locals",
                "chmod 644 settings.php"
            ]
        );
    }

    #[test]
    fn test_finally_failure_on_success_path() {
        let executor = RecordingExecutor::failing_on(&["gone"]);
        let plan = ProvisioningPlan::builder("site")
            .step(ProvisioningStep::copy("src", "a"))
            .finally(ProvisioningStep::chmod("gone", 0o644))
            .build();

        let err = Sequencer::new(&executor).run(&plan).unwrap_err();
        assert_eq!(err.index, 1);
    }

    #[test]
    fn test_original_failure_wins_over_cleanup_failure() {
        let executor = RecordingExecutor::failing_on(&["a", "gone"]);
        let plan = ProvisioningPlan::builder("site")
            .step(ProvisioningStep::copy("src", "a"))
            .finally(ProvisioningStep::chmod("gone", 0o644))
            .build();

        let err = Sequencer::new(&executor).run(&plan).unwrap_err();
        assert_eq!(err.index, 0);
        assert!(err.step.starts_with("copy"));
    }

    #[test]
    fn test_report_lists_steps() {
        let executor = RecordingExecutor::default();
        let plan = ProvisioningPlan::builder("hooks")
            .step(ProvisioningStep::ensure_dir(".git/hooks"))
            .step(ProvisioningStep::symlink("scripts/pre-commit", ".git/hooks/pre-commit"))
            .build();

        let report = Sequencer::new(&executor).run(&plan).unwrap();
        assert_eq!(report.target, "hooks");
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.changes(), 2);
    }

    #[test]
    fn test_empty_plan() {
        let plan = ProvisioningPlan::builder("nothing").build();
        assert!(plan.is_empty());
        let report = Sequencer::new(&RecordingExecutor::default())
            .run(&plan)
            .unwrap();
        assert_eq!(report.changes(), 0);
    }
}
