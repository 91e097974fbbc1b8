use anyhow::Result;
use provision::hooks::install_git_hooks_with_progress;
use provision::{ConfigMap, Error, GIT_HOOKS, HookStatus, StepExecutor};

use crate::Context;
use crate::cli::RunArgs;
use crate::progress::PlanProgress;
use crate::report::{RunSummary, TargetKind};
use crate::ui;

pub fn run(ctx: &Context, args: RunArgs) -> Result<()> {
    let json = args.output.json;
    let loaded = ctx.load_config()?;

    if ctx.show_progress(json) {
        ui::header("Installing Git Hooks");
    }

    let executor = super::executor(args.dry_run);
    let mut summary = RunSummary::new(args.dry_run);
    provision(ctx, &loaded.config, executor.as_ref(), json, &mut summary);
    summary.finish(json, ctx.verbose > 0)
}

/// Link every configured hook; unconfigured hooks are reported as skipped
pub fn provision(
    ctx: &Context,
    config: &ConfigMap,
    executor: &dyn StepExecutor,
    json: bool,
    summary: &mut RunSummary,
) {
    let progress = PlanProgress::new(GIT_HOOKS.len(), ctx.show_progress(json));
    let reports = install_git_hooks_with_progress(config, executor, &progress);
    progress.finish();

    for report in reports {
        match report.status {
            HookStatus::Installed(plan) => {
                summary.push_plan(TargetKind::Hook, report.hook, Ok::<_, Error>(plan));
            }
            HookStatus::Skipped => {
                summary.push_skipped(TargetKind::Hook, report.hook, "not configured");
            }
            HookStatus::Failed(err) => summary.push_failure(TargetKind::Hook, report.hook, err),
        }
    }
}
