use anyhow::Result;
use provision::project::BEHAT_TARGET;
use provision::{ConfigMap, Error, Sequencer, StepExecutor, behat_plan};

use crate::Context;
use crate::cli::RunArgs;
use crate::report::{RunSummary, TargetKind};
use crate::ui;

pub fn run(ctx: &Context, args: RunArgs) -> Result<()> {
    let json = args.output.json;
    let loaded = ctx.load_config()?;

    if ctx.show_progress(json) {
        ui::header("Provisioning Behat Config");
    }

    let executor = super::executor(args.dry_run);
    let mut summary = RunSummary::new(args.dry_run);
    provision(&loaded.config, executor.as_ref(), &mut summary);
    summary.finish(json, ctx.verbose > 0)
}

/// Generate the local behat config from its example
pub fn provision(config: &ConfigMap, executor: &dyn StepExecutor, summary: &mut RunSummary) {
    let result = behat_plan(config)
        .and_then(|plan| Sequencer::new(executor).run(&plan).map_err(Error::from));
    summary.push_plan(TargetKind::Behat, BEHAT_TARGET, result);
}
