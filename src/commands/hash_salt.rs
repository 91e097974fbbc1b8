use anyhow::Result;
use provision::salt::SALT_FILE;
use provision::{ConfigMap, StepExecutor, apply_salt, salt_path};

use crate::Context;
use crate::cli::OutputArgs;
use crate::report::{RunSummary, TargetKind};
use crate::ui;

pub fn run(ctx: &Context, args: OutputArgs) -> Result<()> {
    let loaded = ctx.load_config()?;

    if ctx.show_progress(args.json) {
        ui::header("Hash Salt");
    }

    let executor = super::executor(false);
    let mut summary = RunSummary::new(false);
    provision(&loaded.config, executor.as_ref(), &mut summary);
    summary.finish(args.json, ctx.verbose > 0)
}

/// Write `<repo.root>/salt.txt` unless it already exists
pub fn provision(config: &ConfigMap, executor: &dyn StepExecutor, summary: &mut RunSummary) {
    match salt_path(config) {
        Ok(path) => {
            let result = apply_salt(&path, executor);
            summary.push_outcome(TargetKind::Salt, path.display().to_string(), result);
        }
        Err(err) => summary.push_failure(TargetKind::Salt, SALT_FILE, err),
    }
}
