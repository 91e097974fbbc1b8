//! Core types for step execution and reporting

use serde::{Deserialize, Serialize};

/// Outcome of one successfully executed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The destination did not exist and was created
    Created,
    /// The destination existed and was changed
    Modified,
    /// The destination already matched
    Unchanged,
    /// Nothing was done
    Skipped { reason: String },
}

impl StepOutcome {
    /// Check if the outcome represents a change on disk
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Unchanged => "unchanged",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// Record of one executed step inside a plan run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub description: String,
    pub outcome: StepOutcome,
}

/// Report of a plan that ran to completion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanReport {
    pub target: String,
    pub steps: Vec<StepRecord>,
}

impl PlanReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            steps: Vec::new(),
        }
    }

    /// Number of steps that changed the tree
    pub fn changes(&self) -> usize {
        self.steps.iter().filter(|s| s.outcome.is_change()).count()
    }
}

/// Summary counters across many plan runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified
    }

    /// Add every step of a finished plan
    pub fn add_report(&mut self, report: &PlanReport) {
        for step in &report.steps {
            self.add_outcome(&step.outcome);
        }
    }

    pub fn add_outcome(&mut self, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Created => self.created += 1,
            StepOutcome::Modified => self.modified += 1,
            StepOutcome::Unchanged => self.unchanged += 1,
            StepOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn add_failure(&mut self) {
        self.failed += 1;
    }
}

/// Options for running plans
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Check preconditions only, don't touch the tree
    pub dry_run: bool,
    /// Number of sites provisioned concurrently
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 1,
        }
    }
}
