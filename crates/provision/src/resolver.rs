//! Path resolution from configuration keys
//!
//! Turns the symbolic keys of a [`ConfigMap`] into the concrete paths a plan
//! operates on. Everything here is pure: no filesystem access.

use crate::config::ConfigMap;
use crate::error::{Error, Result};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

pub const KEY_REPO_ROOT: &str = "repo.root";
pub const KEY_DOCROOT: &str = "docroot";
pub const KEY_TOOL_ROOT: &str = "blt.root";
pub const KEY_MULTISITES: &str = "multisites";
pub const KEY_EXAMPLE_LOCAL_CONFIG: &str = "blt.config-files.example-local";
pub const KEY_LOCAL_CONFIG: &str = "blt.config-files.local";
pub const KEY_BEHAT_EXAMPLE_LOCAL: &str = "behat.example-local";
pub const KEY_BEHAT_LOCAL: &str = "behat.local";

/// Prefix of the per-hook source directory keys (`git.hooks.<hook>`)
pub const KEY_GIT_HOOKS_PREFIX: &str = "git.hooks";

/// Directory under the docroot holding one directory per site
pub const SITES_DIR: &str = "sites";
/// Directory under the tool root holding the local settings defaults
pub const TOOL_SETTINGS_DIR: &str = "settings";

const DEFAULT_SETTINGS_FILE: &str = "default.settings.php";
const SETTINGS_FILE: &str = "settings.php";
const LOCAL_SETTINGS_DIR: &str = "settings";
const DEFAULT_LOCAL_SETTINGS_FILE: &str = "default.local.settings.php";
const LOCAL_SETTINGS_FILE: &str = "local.settings.php";
const DEFAULT_LOCAL_DRUSH_FILE: &str = "default.local.drushrc.php";
const LOCAL_DRUSH_FILE: &str = "local.drushrc.php";

/// Project-wide paths every plan needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPaths {
    pub repo_root: PathBuf,
    pub docroot: PathBuf,
    pub tool_root: PathBuf,
    pub multisites: Vec<String>,
}

impl ProjectPaths {
    /// Resolve the required keys: repo root, docroot, tool root and the site list
    pub fn from_config(config: &ConfigMap) -> Result<Self> {
        Ok(Self {
            repo_root: PathBuf::from(config.require_str(KEY_REPO_ROOT)?),
            docroot: PathBuf::from(config.require_str(KEY_DOCROOT)?),
            tool_root: PathBuf::from(config.require_str(KEY_TOOL_ROOT)?),
            multisites: config.require_list(KEY_MULTISITES)?.to_vec(),
        })
    }

    /// Derive the context of one site
    pub fn site(&self, name: &str) -> Result<SiteContext> {
        validate_site_name(name)?;

        let dir = self.docroot.join(SITES_DIR).join(name);
        let tool_settings = self.tool_root.join(TOOL_SETTINGS_DIR);

        Ok(SiteContext {
            name: name.to_string(),
            default_settings_file: dir.join(DEFAULT_SETTINGS_FILE),
            settings_file: dir.join(SETTINGS_FILE),
            default_local_settings_file: dir
                .join(LOCAL_SETTINGS_DIR)
                .join(DEFAULT_LOCAL_SETTINGS_FILE),
            local_settings_file: dir.join(LOCAL_SETTINGS_DIR).join(LOCAL_SETTINGS_FILE),
            default_local_drush_file: dir.join(DEFAULT_LOCAL_DRUSH_FILE),
            local_drush_file: dir.join(LOCAL_DRUSH_FILE),
            tool_local_settings_file: tool_settings.join(DEFAULT_LOCAL_SETTINGS_FILE),
            tool_local_drush_file: tool_settings.join(DEFAULT_LOCAL_DRUSH_FILE),
            dir,
        })
    }

    pub fn git_hooks_dir(&self) -> PathBuf {
        git_hooks_dir(&self.repo_root)
    }
}

/// `.git/hooks` under the repository root
pub fn git_hooks_dir(repo_root: &Path) -> PathBuf {
    repo_root.join(".git").join("hooks")
}

/// All paths of one multisite target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteContext {
    pub name: String,
    pub dir: PathBuf,
    pub default_settings_file: PathBuf,
    pub settings_file: PathBuf,
    pub default_local_settings_file: PathBuf,
    pub local_settings_file: PathBuf,
    pub default_local_drush_file: PathBuf,
    pub local_drush_file: PathBuf,
    pub tool_local_settings_file: PathBuf,
    pub tool_local_drush_file: PathBuf,
}

/// Resolve the context of `site` straight from configuration
pub fn resolve_site(config: &ConfigMap, site: &str) -> Result<SiteContext> {
    ProjectPaths::from_config(config)?.site(site)
}

/// A site name must be a single normal path component
fn validate_site_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(Error::InvalidSiteName(name.to_string())),
    }
}
