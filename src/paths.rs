//! Path resolution for sitekit
//!
//! # Environment Variables
//!
//! - `SITEKIT_CONFIG` - Configuration file used when `--config` is not given
//!
//! # Config File Resolution Priority
//!
//! 1. `--config <FILE>`
//! 2. `SITEKIT_CONFIG` environment variable
//! 3. `sitekit.toml` in the repository root, if present
//!
//! An explicitly named file must exist. Without one the built-in defaults apply.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Environment variable for config file override
pub const ENV_CONFIG: &str = "SITEKIT_CONFIG";

/// Config file looked up in the repository root
pub const CONFIG_FILE: &str = "sitekit.toml";

/// Absolute repository root: the given directory, or the current one
pub fn repo_root(arg: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    let root = match arg {
        Some(dir) => cwd.join(expand(&dir.to_string_lossy())),
        None => cwd,
    };
    log::debug!("Using repository root: {}", root.display());
    Ok(root)
}

/// Locate the config file for `repo_root`
pub fn config_file(repo_root: &Path, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let named = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::var(ENV_CONFIG)
            .ok()
            .filter(|value| !value.is_empty())
            .map(|value| {
                log::debug!("Using config file from {ENV_CONFIG}");
                PathBuf::from(value)
            }),
    };

    if let Some(path) = named {
        let path = repo_root.join(expand(&path.to_string_lossy()));
        if !path.is_file() {
            bail!("Config file not found: {}", path.display());
        }
        return Ok(Some(path));
    }

    let default = repo_root.join(CONFIG_FILE);
    if default.is_file() {
        Ok(Some(default))
    } else {
        log::debug!("No {CONFIG_FILE} in {}, using defaults", repo_root.display());
        Ok(None)
    }
}

/// Expand ~ and environment variables in a path string.
///
/// Text that fails to expand (an unset variable, say) is returned as written.
pub fn expand_str(text: &str) -> String {
    match shellexpand::full(text) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => {
            log::trace!("Leaving {text:?} unexpanded: {e}");
            text.to_string()
        }
    }
}

/// [`expand_str`] into a path
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(expand_str(path))
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
    fn test_expand_tilde() {
        let expanded = expand("~/project");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().ends_with("project"));
    }

    #[test]
    fn test_expand_unset_variable_is_kept() {
        assert_eq!(
            expand_str("$SITEKIT_SURELY_UNSET_VAR/x"),
            "$SITEKIT_SURELY_UNSET_VAR/x"
        );
    }

    #[test]
    fn test_expand_plain_path() {
        assert_eq!(expand("/srv/app"), PathBuf::from("/srv/app"));
    }

    #[test]
    fn test_repo_root_absolute() {
        let root = repo_root(Some(Path::new("/srv/app"))).unwrap();
        assert_eq!(root, PathBuf::from("/srv/app"));
        assert!(repo_root(None).unwrap().is_absolute());
    }

    #[test]
    fn test_config_file_default_location() {
        let tmp = TempDir::new().unwrap();
        assert!(config_file(tmp.path(), None).unwrap().is_none());

        fs::write(tmp.path().join(CONFIG_FILE), "").unwrap();
        assert_eq!(
            config_file(tmp.path(), None).unwrap(),
            Some(tmp.path().join(CONFIG_FILE))
        );
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let tmp = TempDir::new().unwrap();
        let err = config_file(tmp.path(), Some(Path::new("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));

        fs::write(tmp.path().join("custom.toml"), "").unwrap();
        assert_eq!(
            config_file(tmp.path(), Some(Path::new("custom.toml"))).unwrap(),
            Some(tmp.path().join("custom.toml"))
        );
    }
}
