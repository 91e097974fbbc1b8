use anyhow::Result;
use provision::ExecuteOptions;

use crate::Context;
use crate::cli::AllArgs;
use crate::report::RunSummary;
use crate::ui;

use super::{behat, git_hooks, hash_salt, settings};

/// Settings, behat, git hooks and salt against one executor.
///
/// A failing target does not stop the later commands; the run fails at the
/// end if anything failed.
pub fn run(ctx: &Context, args: AllArgs) -> Result<()> {
    let json = args.run.output.json;
    let options = ExecuteOptions {
        dry_run: args.run.dry_run,
        jobs: args.jobs.into(),
    };
    let loaded = ctx.load_config()?;
    let config = &loaded.config;
    let show = ctx.show_progress(json);

    if show && options.dry_run {
        ui::warn("Dry run - no changes will be made");
    }

    let executor = super::executor(options.dry_run);
    let executor = executor.as_ref();
    let mut summary = RunSummary::new(options.dry_run);

    if show {
        ui::header("Provisioning Settings");
    }
    settings::provision(ctx, config, executor, &options, &[], json, &mut summary)?;

    if show {
        ui::header("Provisioning Behat Config");
    }
    behat::provision(config, executor, &mut summary);

    if show {
        ui::header("Installing Git Hooks");
    }
    git_hooks::provision(ctx, config, executor, json, &mut summary);

    hash_salt::provision(config, executor, &mut summary);

    summary.finish(json, ctx.verbose > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{OutputArgs, RunArgs};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn ctx(root: &Path) -> Context {
        Context {
            verbose: 0,
            quiet: true,
            repo_root: Some(root.to_path_buf()),
            config: None,
        }
    }

    fn args(dry_run: bool) -> AllArgs {
        AllArgs {
            run: RunArgs {
                dry_run,
                output: OutputArgs { json: true },
            },
            jobs: 1,
        }
    }

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "docroot/sites/default/default.settings.php", "<?php\n");
        write(root, "vendor/acquia/blt/settings/default.local.settings.php", "<?php\n");
        write(root, "vendor/acquia/blt/settings/default.local.drushrc.php", "<?php\n");
        write(root, "vendor/acquia/blt/scripts/git-hooks/pre-commit", "#!/bin/sh\n");
        write(root, "vendor/acquia/blt/scripts/git-hooks/commit-msg", "#!/bin/sh\n");
        write(root, "blt/example.local.blt.yml", "env: local\n");
        write(root, "tests/behat/example.local.yml", "root: ${repo.root}\n");
        tmp
    }

    #[cfg(unix)]
    #[test]
    fn test_all_provisions_every_target() {
        let tmp = fixture();
        let root = tmp.path();

        run(&ctx(root), args(false)).unwrap();

        assert!(root.join("blt/local.blt.yml").exists());
        assert!(root.join("docroot/sites/default/settings/local.settings.php").exists());
        assert!(root.join(".git/hooks/pre-commit").exists());
        assert!(root.join(".git/hooks/commit-msg").exists());
        assert_eq!(
            fs::read_to_string(root.join("salt.txt")).unwrap().trim_end().len(),
            provision::salt::SALT_LENGTH
        );
        assert_eq!(
            fs::read_to_string(root.join("tests/behat/local.yml")).unwrap(),
            format!("root: {}\n", root.display())
        );

        // second run is a no-op that still succeeds
        run(&ctx(root), args(false)).unwrap();
    }

    #[test]
    fn test_all_dry_run_touches_nothing() {
        let tmp = fixture();
        let root = tmp.path();

        run(&ctx(root), args(true)).unwrap();

        assert!(!root.join("blt/local.blt.yml").exists());
        assert!(!root.join("docroot/sites/default/settings.php").exists());
        assert!(!root.join(".git").exists());
        assert!(!root.join("salt.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_all_fails_when_a_target_fails() {
        let tmp = fixture();
        let root = tmp.path();
        fs::remove_file(root.join("tests/behat/example.local.yml")).unwrap();

        let err = run(&ctx(root), args(false)).unwrap_err();
        assert!(err.to_string().contains("failed"));
        // later targets still ran
        assert!(root.join("salt.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_all_continues_past_unusable_multisites() {
        let tmp = fixture();
        let root = tmp.path();
        write(root, "sitekit.toml", "multisites = \"default\"\n");

        let err = run(&ctx(root), args(false)).unwrap_err();
        assert_eq!(err.to_string(), "1 of 6 targets failed");

        assert!(!root.join("docroot/sites/default/settings.php").exists());
        assert!(root.join("blt/local.blt.yml").exists());
        assert!(root.join("tests/behat/local.yml").exists());
        assert!(root.join(".git/hooks/pre-commit").exists());
        assert!(root.join("salt.txt").exists());
    }
}
