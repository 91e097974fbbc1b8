//! Per-site settings provisioning
//!
//! Two failure levels apply here. Inside one site the plan is fail-fast:
//! the first failing step ends that site's run. Across sites failures are
//! isolated: every site is attempted and reported on its own.

use crate::config::ConfigMap;
use crate::context::{NoProgress, ProgressCallback};
use crate::error::{Error, Result};
use crate::executor::StepExecutor;
use crate::resolver::{SiteContext, resolve_site};
use crate::sequencer::{ProvisioningPlan, Sequencer};
use crate::step::{LineMatcher, ProvisioningStep};
use crate::types::PlanReport;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Substring identifying the settings include directive
pub const SETTINGS_INCLUDE_PATTERN: &str = "vendor/acquia/blt/settings/blt.settings.php";

/// Line appended to every site's settings file
pub const SETTINGS_INCLUDE_DIRECTIVE: &str =
    r#"require DRUPAL_ROOT . "/../vendor/acquia/blt/settings/blt.settings.php";"#;

/// Mode of the site directory and settings file while they are being written
pub const WRITABLE_MODE: u32 = 0o777;

/// Mode of the site directory once provisioning is done
pub const SITE_DIR_MODE: u32 = 0o755;

/// Mode of the settings file once provisioning is done
pub const SETTINGS_MODE: u32 = 0o644;

/// Build the standard settings plan of one site.
///
/// Every write replaces its file through a rename inside the site
/// directory, so the directory itself is leased writable first. An
/// installed site may have both locked down read-only.
pub fn site_plan(site: &SiteContext, properties: Arc<ConfigMap>) -> ProvisioningPlan {
    ProvisioningPlan::builder(&site.name)
        .lease_permissions(&site.dir, WRITABLE_MODE, SITE_DIR_MODE)
        .step(ProvisioningStep::copy(
            &site.default_settings_file,
            &site.settings_file,
        ))
        .lease_permissions(&site.settings_file, WRITABLE_MODE, SETTINGS_MODE)
        .step(ProvisioningStep::copy(
            &site.tool_local_settings_file,
            &site.default_local_settings_file,
        ))
        .step(ProvisioningStep::copy(
            &site.default_local_settings_file,
            &site.local_settings_file,
        ))
        .step(ProvisioningStep::copy(
            &site.tool_local_drush_file,
            &site.default_local_drush_file,
        ))
        .step(ProvisioningStep::copy(
            &site.default_local_drush_file,
            &site.local_drush_file,
        ))
        .step(ProvisioningStep::expand_properties(
            &site.local_drush_file,
            properties,
        ))
        .step(ProvisioningStep::append_line_unless_matches(
            &site.settings_file,
            LineMatcher::literal(SETTINGS_INCLUDE_PATTERN),
            SETTINGS_INCLUDE_DIRECTIVE,
        ))
        .build()
}

/// Outcome of one site
#[derive(Debug)]
pub struct SiteReport {
    pub site: String,
    pub result: Result<PlanReport>,
}

impl SiteReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of every site, in the order they were requested
#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub sites: Vec<SiteReport>,
}

impl ProvisionReport {
    pub fn get(&self, site: &str) -> Option<&SiteReport> {
        self.sites.iter().find(|r| r.site == site)
    }

    pub fn is_success(&self) -> bool {
        self.sites.iter().all(SiteReport::is_success)
    }
}

/// Runs the settings plan of every configured site
pub struct MultisiteProvisioner<'a> {
    executor: &'a dyn StepExecutor,
    progress: &'a dyn ProgressCallback,
    jobs: usize,
}

impl<'a> MultisiteProvisioner<'a> {
    pub fn new(executor: &'a dyn StepExecutor) -> Self {
        Self {
            executor,
            progress: &NoProgress,
            jobs: 1,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Number of sites provisioned at once; site paths never overlap
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Provision every site in `sites`, isolating failures per site.
    ///
    /// Repeated names are provisioned once, at their first position.
    pub fn provision_all(&self, sites: &[String], config: &ConfigMap) -> ProvisionReport {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = sites.iter().filter(|s| seen.insert(s.as_str())).collect();
        let properties = Arc::new(config.clone());

        let run = |name: &&String| self.run_site(name, config, Arc::clone(&properties));

        let sites: Vec<SiteReport> = if self.jobs > 1 && unique.len() > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
            {
                Ok(pool) => pool.install(|| unique.par_iter().map(run).collect()),
                Err(e) => {
                    log::warn!("falling back to sequential provisioning: {e}");
                    unique.iter().map(run).collect()
                }
            }
        } else {
            unique.iter().map(run).collect()
        };

        ProvisionReport { sites }
    }

    fn run_site(&self, name: &str, config: &ConfigMap, properties: Arc<ConfigMap>) -> SiteReport {
        let result = resolve_site(config, name).and_then(|site| {
            let plan = site_plan(&site, properties);
            Sequencer::new(self.executor)
                .with_progress(self.progress)
                .run(&plan)
                .map_err(Error::from)
        });

        match &result {
            Ok(report) => log::info!("site {name}: {} changed", report.changes()),
            Err(err) => log::warn!("site {name} failed: {err}"),
        }

        SiteReport {
            site: name.to_string(),
            result,
        }
    }
}
