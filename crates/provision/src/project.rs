//! Project-level configuration files
//!
//! The local tool config and the behat config live outside any site. Both
//! are copied from a committed example file.

use crate::config::ConfigMap;
use crate::error::Result;
use crate::resolver::{
    KEY_BEHAT_EXAMPLE_LOCAL, KEY_BEHAT_LOCAL, KEY_EXAMPLE_LOCAL_CONFIG, KEY_LOCAL_CONFIG,
};
use crate::sequencer::ProvisioningPlan;
use crate::step::ProvisioningStep;
use std::sync::Arc;

/// Target name of the local config plan
pub const PROJECT_TARGET: &str = "project";

/// Target name of the behat plan
pub const BEHAT_TARGET: &str = "behat";

/// Plan copying the example local config into place.
///
/// Returns `None` when either path is not configured.
pub fn local_config_plan(config: &ConfigMap) -> Option<ProvisioningPlan> {
    let (Some(example), Some(local)) = (
        config.get_str(KEY_EXAMPLE_LOCAL_CONFIG),
        config.get_str(KEY_LOCAL_CONFIG),
    ) else {
        log::warn!("local config paths not configured, skipping project config");
        return None;
    };

    Some(
        ProvisioningPlan::builder(PROJECT_TARGET)
            .step(ProvisioningStep::copy(example, local))
            .build(),
    )
}

/// Plan generating the local behat config with properties expanded
pub fn behat_plan(config: &ConfigMap) -> Result<ProvisioningPlan> {
    let example = config.require_str(KEY_BEHAT_EXAMPLE_LOCAL)?;
    let local = config.require_str(KEY_BEHAT_LOCAL)?;

    Ok(ProvisioningPlan::builder(BEHAT_TARGET)
        .step(ProvisioningStep::copy(example, local))
        .step(ProvisioningStep::expand_properties(
            local,
            Arc::new(config.clone()),
        ))
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::executor::FsExecutor;
    use crate::resolver::KEY_REPO_ROOT;
    use crate::sequencer::Sequencer;
    use crate::types::StepOutcome;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_local_config_requires_both_keys() {
        let only_example = ConfigMap::new().with(KEY_EXAMPLE_LOCAL_CONFIG, "example.yml");
        assert!(local_config_plan(&only_example).is_none());

        let empty_local = only_example.clone().with(KEY_LOCAL_CONFIG, "");
        assert!(local_config_plan(&empty_local).is_none());

        let both = only_example.with(KEY_LOCAL_CONFIG, "local.yml");
        let plan = local_config_plan(&both).unwrap();
        assert_eq!(plan.target(), PROJECT_TARGET);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_local_config_copy() {
        let tmp = TempDir::new().unwrap();
        let example = tmp.path().join("example.local.blt.yml");
        let local = tmp.path().join("local.blt.yml");
        fs::write(&example, "drush:\n  alias: self\n").unwrap();

        let config = ConfigMap::new()
            .with(KEY_EXAMPLE_LOCAL_CONFIG, example.to_string_lossy().into_owned())
            .with(KEY_LOCAL_CONFIG, local.to_string_lossy().into_owned());
        let plan = local_config_plan(&config).unwrap();

        let report = Sequencer::new(&FsExecutor).run(&plan).unwrap();
        assert_eq!(report.steps[0].outcome, StepOutcome::Created);
        assert_eq!(
            fs::read_to_string(&local).unwrap(),
            "drush:\n  alias: self\n"
        );
    }

    #[test]
    fn test_behat_config_is_expanded() {
        let tmp = TempDir::new().unwrap();
        let behat_dir = tmp.path().join("tests/behat");
        fs::create_dir_all(&behat_dir).unwrap();
        fs::write(
            behat_dir.join("example.local.yml"),
            "base_url: http://localhost\nroot: ${repo.root}/docroot\nmissing: ${nope}\n",
        )
        .unwrap();

        let root = tmp.path().to_string_lossy().into_owned();
        let config = ConfigMap::new()
            .with(KEY_REPO_ROOT, root.as_str())
            .with(
                KEY_BEHAT_EXAMPLE_LOCAL,
                behat_dir.join("example.local.yml").to_string_lossy().into_owned(),
            )
            .with(
                KEY_BEHAT_LOCAL,
                behat_dir.join("local.yml").to_string_lossy().into_owned(),
            );

        let plan = behat_plan(&config).unwrap();
        Sequencer::new(&FsExecutor).run(&plan).unwrap();

        let written = fs::read_to_string(behat_dir.join("local.yml")).unwrap();
        assert!(written.contains(&format!("root: {root}/docroot")));
        assert!(written.contains("missing: ${nope}"));
    }

    #[test]
    fn test_behat_plan_needs_paths() {
        let err = behat_plan(&ConfigMap::new()).unwrap_err();
        assert!(matches!(err, Error::MissingConfigKey(key) if key == KEY_BEHAT_EXAMPLE_LOCAL));
    }
}
