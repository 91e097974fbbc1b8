use anyhow::{Result, bail};
use provision::project::PROJECT_TARGET;
use provision::resolver::KEY_MULTISITES;
use provision::{
    ConfigMap, ExecuteOptions, MultisiteProvisioner, Sequencer, StepExecutor, local_config_plan,
};

use crate::Context;
use crate::cli::SettingsArgs;
use crate::progress::PlanProgress;
use crate::report::{RunSummary, TargetKind};
use crate::ui;

pub fn run(ctx: &Context, args: SettingsArgs) -> Result<()> {
    let json = args.run.output.json;
    let options = ExecuteOptions {
        dry_run: args.run.dry_run,
        jobs: args.jobs.into(),
    };
    let loaded = ctx.load_config()?;

    if ctx.show_progress(json) {
        ui::header("Provisioning Settings");
        if options.dry_run {
            ui::warn("Dry run - no changes will be made");
        }
    }

    let executor = super::executor(options.dry_run);
    let mut summary = RunSummary::new(options.dry_run);
    provision(
        ctx,
        &loaded.config,
        executor.as_ref(),
        &options,
        &args.sites,
        json,
        &mut summary,
    )?;
    summary.finish(json, ctx.verbose > 0)
}

/// Copy the project local config, then run every selected site's plan.
///
/// An unusable `multisites` value is recorded as a failed target so the
/// caller can go on with other commands.
pub fn provision(
    ctx: &Context,
    config: &ConfigMap,
    executor: &dyn StepExecutor,
    options: &ExecuteOptions,
    only: &[String],
    json: bool,
    summary: &mut RunSummary,
) -> Result<()> {
    let sites = match config.require_list(KEY_MULTISITES) {
        Ok(configured) => Ok(select_sites(configured, only)?),
        Err(err) => Err(err),
    };

    match local_config_plan(config) {
        Some(plan) => summary.push_plan(
            TargetKind::Project,
            PROJECT_TARGET,
            Sequencer::new(executor).run(&plan),
        ),
        None => summary.push_skipped(
            TargetKind::Project,
            PROJECT_TARGET,
            "local config paths not configured",
        ),
    }

    let sites = match sites {
        Ok(sites) => sites,
        Err(err) => {
            log::warn!("cannot provision sites: {err}");
            summary.push_failure(TargetKind::Site, KEY_MULTISITES, err);
            return Ok(());
        }
    };

    let progress = PlanProgress::new(sites.len(), ctx.show_progress(json));
    let report = MultisiteProvisioner::new(executor)
        .with_progress(&progress)
        .with_jobs(options.jobs)
        .provision_all(&sites, config);
    progress.finish();

    for site in report.sites {
        summary.push_plan(TargetKind::Site, site.site, site.result);
    }
    Ok(())
}

/// Sites to provision: all configured ones, or the requested subset
fn select_sites(configured: &[String], only: &[String]) -> Result<Vec<String>> {
    if only.is_empty() {
        return Ok(configured.to_vec());
    }

    for name in only {
        if !configured.contains(name) {
            bail!(
                "Site '{name}' is not listed in multisites ({})",
                configured.join(", ")
            );
        }
    }
    Ok(only.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::TargetStatus;
    use provision::FsExecutor;
    use provision::resolver::{KEY_DOCROOT, KEY_REPO_ROOT, KEY_TOOL_ROOT};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn quiet_ctx() -> Context {
        Context {
            verbose: 0,
            quiet: true,
            repo_root: None,
            config: None,
        }
    }

    fn project(root: &Path, sites: &[&str]) -> ConfigMap {
        let root_str = root.to_string_lossy().into_owned();
        let tool = root.join("vendor/acquia/blt/settings");
        fs::create_dir_all(&tool).unwrap();
        fs::write(tool.join("default.local.settings.php"), "<?php\n// local\n").unwrap();
        fs::write(
            tool.join("default.local.drushrc.php"),
            "<?php\n$uri = '${repo.root}';\n",
        )
        .unwrap();
        for site in sites {
            let dir = root.join("docroot/sites").join(site);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("default.settings.php"), "<?php\n").unwrap();
        }

        ConfigMap::new()
            .with(KEY_REPO_ROOT, root_str.as_str())
            .with(KEY_DOCROOT, format!("{root_str}/docroot"))
            .with(KEY_TOOL_ROOT, format!("{root_str}/vendor/acquia/blt"))
            .with(KEY_MULTISITES, names(sites))
    }

    #[test]
    fn test_select_sites() {
        let configured = names(&["default", "intranet"]);
        assert_eq!(select_sites(&configured, &[]).unwrap(), configured);
        assert_eq!(
            select_sites(&configured, &names(&["intranet"])).unwrap(),
            ["intranet"]
        );
        let err = select_sites(&configured, &names(&["shop"])).unwrap_err();
        assert!(err.to_string().contains("shop"));
    }

    #[test]
    fn test_provision_reports_every_site() {
        let tmp = TempDir::new().unwrap();
        let config = project(tmp.path(), &["default", "intranet"]);
        // break one site
        fs::remove_file(tmp.path().join("docroot/sites/intranet/default.settings.php")).unwrap();

        let mut summary = RunSummary::new(false);
        provision(
            &quiet_ctx(),
            &config,
            &FsExecutor,
            &ExecuteOptions::default(),
            &[],
            true,
            &mut summary,
        )
        .unwrap();

        let statuses: Vec<_> = summary
            .targets
            .iter()
            .map(|t| (t.kind, t.name.as_str(), t.status))
            .collect();
        assert_eq!(
            statuses,
            [
                (TargetKind::Project, "project", TargetStatus::Skipped),
                (TargetKind::Site, "default", TargetStatus::Ok),
                (TargetKind::Site, "intranet", TargetStatus::Failed),
            ]
        );
        assert!(
            tmp.path()
                .join("docroot/sites/default/local.drushrc.php")
                .exists()
        );
    }

    fn provision_with(config: &ConfigMap) -> RunSummary {
        let mut summary = RunSummary::new(false);
        provision(
            &quiet_ctx(),
            config,
            &FsExecutor,
            &ExecuteOptions::default(),
            &[],
            true,
            &mut summary,
        )
        .unwrap();
        summary
    }

    #[test]
    fn test_missing_multisites_is_a_failed_target() {
        let summary = provision_with(&ConfigMap::new());

        let failed = &summary.targets[1];
        assert_eq!(summary.targets.len(), 2);
        assert_eq!((failed.kind, failed.status), (TargetKind::Site, TargetStatus::Failed));
        assert_eq!(failed.name, KEY_MULTISITES);
        assert_eq!(
            failed.message.as_deref(),
            Some("missing configuration key: multisites")
        );
    }

    #[test]
    fn test_multisites_of_the_wrong_type() {
        let tmp = TempDir::new().unwrap();
        let config = project(tmp.path(), &["default"]).with(KEY_MULTISITES, "default");
        let summary = provision_with(&config);

        assert_eq!(summary.failures(), 1);
        let message = summary.targets[1].message.as_deref().unwrap();
        assert_eq!(message, "configuration key multisites must be a list");
        assert!(!tmp.path().join("docroot/sites/default/settings.php").exists());
    }
}
