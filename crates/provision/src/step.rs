//! Provisioning steps
//!
//! A step is one filesystem operation confined to its destination path.
//! Plans are ordered lists of steps; the executor interprets them.

use crate::config::ConfigMap;
use crate::error::StepError;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Produces the content of a file created by [`ProvisioningStep::ConditionalWrite`]
pub type ContentFn = Arc<dyn Fn() -> String + Send + Sync>;

/// How an existing line is recognised by [`ProvisioningStep::AppendLineUnlessMatches`]
#[derive(Debug, Clone)]
pub enum LineMatcher {
    /// The line contains this substring
    Literal(String),
    /// The line matches this regular expression
    Regex(Regex),
}

impl LineMatcher {
    pub fn literal(needle: impl Into<String>) -> Self {
        Self::Literal(needle.into())
    }

    /// Compile a regular expression matcher
    pub fn regex(pattern: &str) -> Result<Self, StepError> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|source| StepError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn is_match(&self, line: &str) -> bool {
        match self {
            Self::Literal(needle) => line.contains(needle.as_str()),
            Self::Regex(re) => re.is_match(line),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(needle) => needle,
            Self::Regex(re) => re.as_str(),
        }
    }
}

/// One provisioning operation
#[derive(Clone)]
pub enum ProvisioningStep {
    /// Replace `destination` with the content of `source`
    Copy {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Set permission bits on an existing path
    Chmod { path: PathBuf, mode: u32 },
    /// Point `destination` at `source`, replacing whatever link or file is there
    Symlink {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Append `line` unless some existing line matches
    AppendLineUnlessMatches {
        path: PathBuf,
        matcher: LineMatcher,
        line: String,
    },
    /// Create `path` from `content` only if it does not exist yet
    ConditionalWrite { path: PathBuf, content: ContentFn },
    /// Replace `${key}` placeholders with configuration values
    ExpandProperties {
        path: PathBuf,
        properties: Arc<ConfigMap>,
    },
    /// Create a directory and its parents
    EnsureDir { path: PathBuf },
}

impl ProvisioningStep {
    pub fn copy(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Self {
        Self::Copy {
            source: source.as_ref().to_path_buf(),
            destination: destination.as_ref().to_path_buf(),
        }
    }

    pub fn chmod(path: impl AsRef<Path>, mode: u32) -> Self {
        Self::Chmod {
            path: path.as_ref().to_path_buf(),
            mode,
        }
    }

    pub fn symlink(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Self {
        Self::Symlink {
            source: source.as_ref().to_path_buf(),
            destination: destination.as_ref().to_path_buf(),
        }
    }

    pub fn append_line_unless_matches(
        path: impl AsRef<Path>,
        matcher: LineMatcher,
        line: impl Into<String>,
    ) -> Self {
        Self::AppendLineUnlessMatches {
            path: path.as_ref().to_path_buf(),
            matcher,
            line: line.into(),
        }
    }

    pub fn conditional_write<F>(path: impl AsRef<Path>, content: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::ConditionalWrite {
            path: path.as_ref().to_path_buf(),
            content: Arc::new(content),
        }
    }

    pub fn expand_properties(path: impl AsRef<Path>, properties: Arc<ConfigMap>) -> Self {
        Self::ExpandProperties {
            path: path.as_ref().to_path_buf(),
            properties,
        }
    }

    pub fn ensure_dir(path: impl AsRef<Path>) -> Self {
        Self::EnsureDir {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The path this step is allowed to change
    pub fn destination(&self) -> &Path {
        match self {
            Self::Copy { destination, .. } | Self::Symlink { destination, .. } => destination,
            Self::Chmod { path, .. }
            | Self::AppendLineUnlessMatches { path, .. }
            | Self::ConditionalWrite { path, .. }
            | Self::ExpandProperties { path, .. }
            | Self::EnsureDir { path } => path,
        }
    }

    /// The path this step reads from, if any
    pub fn source(&self) -> Option<&Path> {
        match self {
            Self::Copy { source, .. } | Self::Symlink { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Step kind name, stable across runs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Copy { .. } => "copy",
            Self::Chmod { .. } => "chmod",
            Self::Symlink { .. } => "symlink",
            Self::AppendLineUnlessMatches { .. } => "append_line",
            Self::ConditionalWrite { .. } => "conditional_write",
            Self::ExpandProperties { .. } => "expand_properties",
            Self::EnsureDir { .. } => "ensure_dir",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Copy {
                source,
                destination,
            } => format!("copy {} -> {}", source.display(), destination.display()),
            Self::Chmod { path, mode } => format!("chmod {mode:o} {}", path.display()),
            Self::Symlink {
                source,
                destination,
            } => format!("symlink {} -> {}", destination.display(), source.display()),
            Self::AppendLineUnlessMatches { path, matcher, .. } => format!(
                "append to {} unless /{}/ matches",
                path.display(),
                matcher.as_str()
            ),
            Self::ConditionalWrite { path, .. } => format!("write {} if absent", path.display()),
            Self::ExpandProperties { path, .. } => {
                format!("expand properties in {}", path.display())
            }
            Self::EnsureDir { path } => format!("mkdir -p {}", path.display()),
        }
    }

    /// Check the shape invariants: a non-empty destination, and a non-empty
    /// source for copies and symlinks
    pub fn validate(&self) -> Result<(), StepError> {
        if self.destination().as_os_str().is_empty() {
            return Err(StepError::InvalidStep(format!(
                "{} step has an empty destination",
                self.kind()
            )));
        }
        if let Some(source) = self.source()
            && source.as_os_str().is_empty()
        {
            return Err(StepError::InvalidStep(format!(
                "{} step has an empty source",
                self.kind()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningStep")
            .field("kind", &self.kind())
            .field("description", &self.description())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_matcher() {
        let m = LineMatcher::literal("vendor/acquia/blt/settings/blt.settings.php");
        assert!(m.is_match(
            r#"require DRUPAL_ROOT . "/../vendor/acquia/blt/settings/blt.settings.php";"#
        ));
        assert!(!m.is_match("require 'other.php';"));
    }

    #[test]
    fn test_regex_matcher() {
        let m = LineMatcher::regex(r"^\s*require .*blt\.settings\.php").unwrap();
        assert!(m.is_match("  require 'blt.settings.php';"));
        assert!(!m.is_match("// require nothing"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = LineMatcher::regex("(unclosed").unwrap_err();
        assert!(matches!(err, StepError::InvalidPattern { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        assert!(ProvisioningStep::copy("a", "").validate().is_err());
        assert!(ProvisioningStep::symlink("", "b").validate().is_err());
        assert!(ProvisioningStep::chmod("", 0o644).validate().is_err());
        assert!(ProvisioningStep::copy("a", "b").validate().is_ok());
    }

    #[test]
    fn test_description_and_kind() {
        let step = ProvisioningStep::chmod("sites/default/settings.php", 0o644);
        assert_eq!(step.kind(), "chmod");
        assert_eq!(step.description(), "chmod 644 sites/default/settings.php");
        assert_eq!(step.destination(), Path::new("sites/default/settings.php"));
        assert!(step.source().is_none());
    }
}
