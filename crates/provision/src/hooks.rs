//! Git hook installation
//!
//! Each hook is linked from its configured source directory into
//! `.git/hooks`. Hooks are independent: a failing or unconfigured hook does
//! not affect the others.

use crate::config::ConfigMap;
use crate::context::{NoProgress, ProgressCallback};
use crate::error::{Error, Result};
use crate::executor::StepExecutor;
use crate::resolver::{KEY_GIT_HOOKS_PREFIX, KEY_REPO_ROOT, git_hooks_dir};
use crate::sequencer::{ProvisioningPlan, Sequencer};
use crate::step::ProvisioningStep;
use crate::types::PlanReport;
use std::path::Path;

/// Hooks installed, in order
pub const GIT_HOOKS: [&str; 2] = ["pre-commit", "commit-msg"];

/// What happened to one hook
#[derive(Debug)]
pub enum HookStatus {
    Installed(PlanReport),
    /// No source directory is configured for the hook
    Skipped,
    Failed(Error),
}

#[derive(Debug)]
pub struct HookReport {
    pub hook: &'static str,
    pub status: HookStatus,
}

impl HookReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, HookStatus::Failed(_))
    }
}

/// Plan linking `<source_dir>/<hook>` to `<repo_root>/.git/hooks/<hook>`.
///
/// A relative `source_dir` is taken from `repo_root`.
pub fn hook_plan(repo_root: &Path, source_dir: &Path, hook: &str) -> ProvisioningPlan {
    let hooks_dir = git_hooks_dir(repo_root);
    ProvisioningPlan::builder(hook)
        .step(ProvisioningStep::ensure_dir(&hooks_dir))
        .step(ProvisioningStep::symlink(
            repo_root.join(source_dir).join(hook),
            hooks_dir.join(hook),
        ))
        .build()
}

/// Install every hook in [`GIT_HOOKS`] that has a configured source
pub fn install_git_hooks(config: &ConfigMap, executor: &dyn StepExecutor) -> Vec<HookReport> {
    install_git_hooks_with_progress(config, executor, &NoProgress)
}

pub fn install_git_hooks_with_progress(
    config: &ConfigMap,
    executor: &dyn StepExecutor,
    progress: &dyn ProgressCallback,
) -> Vec<HookReport> {
    let sequencer = Sequencer::new(executor).with_progress(progress);

    GIT_HOOKS
        .iter()
        .map(|&hook| {
            let status = match install_hook(config, &sequencer, hook) {
                Ok(Some(report)) => HookStatus::Installed(report),
                Ok(None) => {
                    log::warn!("skipping installation of {hook} git hook");
                    HookStatus::Skipped
                }
                Err(err) => {
                    log::warn!("{hook} git hook failed: {err}");
                    HookStatus::Failed(err)
                }
            };
            HookReport { hook, status }
        })
        .collect()
}

fn install_hook(
    config: &ConfigMap,
    sequencer: &Sequencer<'_>,
    hook: &str,
) -> Result<Option<PlanReport>> {
    let Some(source_dir) = config.get_str(&format!("{KEY_GIT_HOOKS_PREFIX}.{hook}")) else {
        return Ok(None);
    };
    let repo_root = config.require_str(KEY_REPO_ROOT)?;

    let plan = hook_plan(Path::new(repo_root), Path::new(source_dir), hook);
    Ok(Some(sequencer.run(&plan)?))
}
