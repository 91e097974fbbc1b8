//! Progress display for plan runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use provision::{ProgressCallback, StepError, StepOutcome};

use crate::ui;

/// Progress bar advancing once per finished plan
pub struct PlanProgress {
    bar: ProgressBar,
}

impl PlanProgress {
    /// A bar over `plans` plans; hidden when `visible` is false
    pub fn new(plans: usize, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(plans as u64)
        } else {
            ProgressBar::hidden()
        };
        let style =
            ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .map(|style| style.progress_chars("=>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for PlanProgress {
    fn on_plan_start(&self, target: &str, _steps: usize) {
        self.bar.set_message(target.to_string());
    }

    fn on_step_start(&self, target: &str, _index: usize, description: &str) {
        self.bar
            .set_message(format!("{target}: {}", ui::truncate_end(description, 50)));
    }

    fn on_step_complete(&self, _target: &str, _index: usize, _outcome: &StepOutcome) {}

    fn on_step_failed(&self, target: &str, index: usize, error: &StepError) {
        self.bar.suspend(|| {
            eprintln!("  {} {target} step {index}: {error}", "✗".red());
        });
    }

    fn on_plan_complete(&self, _target: &str, _success: bool) {
        self.bar.inc(1);
    }
}
