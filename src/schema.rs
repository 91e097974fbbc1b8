//! Configuration loading
//!
//! `sitekit.toml` is read as a TOML table and flattened into the dotted keys
//! the provisioning engine understands:
//!
//! ```toml
//! multisites = ["default", "intranet"]
//!
//! [git.hooks]
//! commit-msg = ""   # disable this hook
//! ```
//!
//! File values are layered over [`defaults`], `${key}` references are
//! resolved, then `~` and `$VAR` are expanded.

use anyhow::{Context, Result};
use provision::resolver::{
    KEY_BEHAT_EXAMPLE_LOCAL, KEY_BEHAT_LOCAL, KEY_DOCROOT, KEY_EXAMPLE_LOCAL_CONFIG,
    KEY_GIT_HOOKS_PREFIX, KEY_LOCAL_CONFIG, KEY_MULTISITES, KEY_REPO_ROOT, KEY_TOOL_ROOT,
};
use provision::{ConfigMap, ConfigValue, GIT_HOOKS};
use std::path::{Path, PathBuf};

use crate::paths;

/// Resolved configuration and where it came from
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: ConfigMap,
    pub file: Option<PathBuf>,
}

/// Load the configuration of the project at `repo_root`.
///
/// An explicit `--repo-root` wins over a `repo.root` set in the file.
pub fn load(repo_root_arg: Option<&Path>, config_arg: Option<&Path>) -> Result<LoadedConfig> {
    let repo_root = paths::repo_root(repo_root_arg)?;
    let file = paths::config_file(&repo_root, config_arg)?;

    let mut config = defaults(&repo_root);
    if let Some(path) = &file {
        log::info!("Loading config from {}", path.display());
        config.merge(read_file(path)?);
    }
    if repo_root_arg.is_some() {
        config.insert(KEY_REPO_ROOT, repo_root.to_string_lossy().into_owned());
    }

    config.interpolate();
    Ok(LoadedConfig {
        config: expand_values(&config),
        file,
    })
}

/// Built-in values every project starts from
pub fn defaults(repo_root: &Path) -> ConfigMap {
    let mut config = ConfigMap::new()
        .with(KEY_REPO_ROOT, repo_root.to_string_lossy().into_owned())
        .with(KEY_DOCROOT, "${repo.root}/docroot")
        .with(KEY_TOOL_ROOT, "${repo.root}/vendor/acquia/blt")
        .with(KEY_MULTISITES, vec!["default".to_string()])
        .with(KEY_EXAMPLE_LOCAL_CONFIG, "${repo.root}/blt/example.local.blt.yml")
        .with(KEY_LOCAL_CONFIG, "${repo.root}/blt/local.blt.yml")
        .with(KEY_BEHAT_EXAMPLE_LOCAL, "${repo.root}/tests/behat/example.local.yml")
        .with(KEY_BEHAT_LOCAL, "${repo.root}/tests/behat/local.yml");

    for hook in GIT_HOOKS {
        config.insert(
            format!("{KEY_GIT_HOOKS_PREFIX}.{hook}"),
            "${blt.root}/scripts/git-hooks",
        );
    }
    config
}

/// Read and flatten one TOML file
pub fn read_file(path: &Path) -> Result<ConfigMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read config file: {}", path.display()))?;
    parse(&content).with_context(|| format!("Invalid TOML format in {}", path.display()))
}

/// Parse TOML text into a flat map
pub fn parse(content: &str) -> Result<ConfigMap> {
    let table: toml::Table = toml::from_str(content)?;
    let mut config = ConfigMap::new();
    flatten("", &table, &mut config);
    Ok(config)
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut ConfigMap) {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            toml::Value::Table(inner) => flatten(&key, inner, out),
            toml::Value::Array(items) => {
                out.insert(key, items.iter().map(scalar_text).collect::<Vec<_>>());
            }
            other => out.insert(key, scalar_text(other)),
        }
    }
}

/// Strings as written; other scalars in their TOML spelling
fn scalar_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn expand_values(config: &ConfigMap) -> ConfigMap {
    let mut expanded = ConfigMap::new();
    for (key, value) in config.iter() {
        let value = match value {
            ConfigValue::Text(text) => ConfigValue::Text(paths::expand_str(text)),
            ConfigValue::List(items) => {
                ConfigValue::List(items.iter().map(|item| paths::expand_str(item)).collect())
            }
        };
        expanded.insert(key.clone(), value);
    }
    expanded
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_resolve_against_repo_root() {
        let mut config = defaults(Path::new("/srv/app"));
        config.interpolate();

        assert_eq!(config.get_str(KEY_DOCROOT), Some("/srv/app/docroot"));
        assert_eq!(config.get_str(KEY_TOOL_ROOT), Some("/srv/app/vendor/acquia/blt"));
        assert_eq!(
            config.get_str("git.hooks.commit-msg"),
            Some("/srv/app/vendor/acquia/blt/scripts/git-hooks")
        );
        assert_eq!(config.get_list(KEY_MULTISITES), Some(&["default".to_string()][..]));
    }

    #[test]
    fn test_parse_flattens_tables() {
        let config = parse(
            r#"
            multisites = ["default", "intranet"]
            docroot = "${repo.root}/web"

            [blt]
            root = "/opt/blt"

            [git.hooks]
            pre-commit = "/opt/hooks"
            commit-msg = ""

            [behat]
            example-local = "behat.example.yml"

            [drush]
            port = 8080
            strict = true
            "#,
        )
        .unwrap();

        assert_eq!(config.get_str(KEY_TOOL_ROOT), Some("/opt/blt"));
        assert_eq!(config.get_str("git.hooks.pre-commit"), Some("/opt/hooks"));
        assert_eq!(config.get_str("git.hooks.commit-msg"), None);
        assert!(config.contains_key("git.hooks.commit-msg"));
        assert_eq!(config.get_str("drush.port"), Some("8080"));
        assert_eq!(config.get_str("drush.strict"), Some("true"));
        assert_eq!(config.get_list(KEY_MULTISITES).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_error() {
        assert!(parse("multisites = [").is_err());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let loaded = load(Some(tmp.path()), None).unwrap();

        assert!(loaded.file.is_none());
        let root = tmp.path().to_string_lossy().into_owned();
        assert_eq!(loaded.config.get_str(KEY_REPO_ROOT), Some(root.as_str()));
        assert_eq!(
            loaded.config.get_str(KEY_BEHAT_LOCAL),
            Some(format!("{root}/tests/behat/local.yml").as_str())
        );
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(paths::CONFIG_FILE),
            "docroot = \"${repo.root}/web\"\nmultisites = [\"a\", \"b\"]\n\n[git.hooks]\ncommit-msg = \"\"\n",
        )
        .unwrap();

        let loaded = load(Some(tmp.path()), None).unwrap();
        let root = tmp.path().to_string_lossy().into_owned();

        assert_eq!(loaded.file, Some(tmp.path().join(paths::CONFIG_FILE)));
        assert_eq!(
            loaded.config.get_str(KEY_DOCROOT),
            Some(format!("{root}/web").as_str())
        );
        assert_eq!(loaded.config.get_str("git.hooks.commit-msg"), None);
        assert!(loaded.config.get_str("git.hooks.pre-commit").is_some());
    }

    #[test]
    fn test_load_reports_bad_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(paths::CONFIG_FILE), "docroot = ").unwrap();

        let err = load(Some(tmp.path()), None).unwrap_err();
        assert!(format!("{err:#}").contains(paths::CONFIG_FILE));
    }
}
