//! Run summaries
//!
//! Every provisioning command collects one [`TargetResult`] per target
//! (project config, site, behat config, hook, salt file), prints them, then
//! fails when any target failed.

use anyhow::{Result, bail};
use colored::Colorize;
use provision::{ExecuteSummary, PlanReport, StepOutcome, StepRecord};
use serde::Serialize;
use std::fmt::Display;

use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Project,
    Site,
    Behat,
    Hook,
    Salt,
}

impl TargetKind {
    fn label(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Site => "site",
            Self::Behat => "behat",
            Self::Hook => "hook",
            Self::Salt => "salt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Ok,
    Skipped,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct TargetResult {
    pub kind: TargetKind,
    pub name: String,
    pub status: TargetStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Results of one command run
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub targets: Vec<TargetResult>,
    pub totals: ExecuteSummary,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Record the result of a plan run
    pub fn push_plan<E: Display>(
        &mut self,
        kind: TargetKind,
        name: impl Into<String>,
        result: std::result::Result<PlanReport, E>,
    ) {
        match result {
            Ok(report) => {
                self.totals.add_report(&report);
                self.targets.push(TargetResult {
                    kind,
                    name: name.into(),
                    status: TargetStatus::Ok,
                    steps: report.steps,
                    message: None,
                });
            }
            Err(err) => self.push_failure(kind, name, err),
        }
    }

    /// Record the result of a single step run outside a plan
    pub fn push_outcome<E: Display>(
        &mut self,
        kind: TargetKind,
        name: impl Into<String>,
        result: std::result::Result<StepOutcome, E>,
    ) {
        match result {
            Ok(outcome) => {
                self.totals.add_outcome(&outcome);
                self.targets.push(TargetResult {
                    kind,
                    name: name.into(),
                    status: TargetStatus::Ok,
                    steps: Vec::new(),
                    message: Some(outcome.label().to_string()),
                });
            }
            Err(err) => self.push_failure(kind, name, err),
        }
    }

    pub fn push_skipped(&mut self, kind: TargetKind, name: impl Into<String>, reason: &str) {
        self.totals.skipped += 1;
        self.targets.push(TargetResult {
            kind,
            name: name.into(),
            status: TargetStatus::Skipped,
            steps: Vec::new(),
            message: Some(reason.to_string()),
        });
    }

    pub fn push_failure(&mut self, kind: TargetKind, name: impl Into<String>, err: impl Display) {
        self.totals.add_failure();
        self.targets.push(TargetResult {
            kind,
            name: name.into(),
            status: TargetStatus::Failed,
            steps: Vec::new(),
            message: Some(err.to_string()),
        });
    }

    pub fn failures(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| t.status == TargetStatus::Failed)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    /// Print the summary, then fail if any target failed
    pub fn finish(&self, json: bool, verbose: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
        } else {
            self.render(verbose);
        }

        let failures = self.failures();
        if failures > 0 {
            bail!(
                "{failures} of {} target{} failed",
                self.targets.len(),
                if self.targets.len() == 1 { "" } else { "s" }
            );
        }
        Ok(())
    }

    fn render(&self, verbose: bool) {
        ui::section("Summary");
        for target in &self.targets {
            let label = format!("{} {}", target.kind.label(), target.name);
            match target.status {
                TargetStatus::Ok => {
                    let changes = target.steps.iter().filter(|s| s.outcome.is_change()).count();
                    let detail = match &target.message {
                        Some(message) => message.clone(),
                        None if changes == 0 => "up to date".to_string(),
                        None => format!("{changes} changed"),
                    };
                    println!("  {} {label} {}", "✓".green(), format!("({detail})").dimmed());
                }
                TargetStatus::Skipped => {
                    let reason = target.message.as_deref().unwrap_or("skipped");
                    println!("  {} {label} {}", "○".yellow(), format!("({reason})").dimmed());
                }
                TargetStatus::Failed => {
                    let message = target.message.as_deref().unwrap_or("failed");
                    println!("  {} {label}: {}", "✗".red(), message.red());
                }
            }

            if verbose {
                for step in &target.steps {
                    ui::dim(&format!("  {:<9} {}", step.outcome.label(), step.description));
                }
            }
        }

        println!();
        let totals = &self.totals;
        let line = format!(
            "{} created, {} modified, {} unchanged, {} skipped, {} failed",
            totals.created, totals.modified, totals.unchanged, totals.skipped, totals.failed
        );
        if self.is_success() {
            if self.dry_run {
                ui::info(&format!("Dry run: {line}"));
            } else if totals.total_changes() == 0 {
                ui::success(&format!("Already up to date: {line}"));
            } else {
                ui::success(&line);
            }
        } else {
            ui::warn(&line);
        }
    }
}
