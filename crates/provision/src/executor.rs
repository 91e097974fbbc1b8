//! Step executors - interpret provisioning steps against a file tree
//!
//! [`StepExecutor`] exposes one operation per step kind. [`FsExecutor`]
//! performs the real I/O; [`DryRunExecutor`] checks preconditions and
//! reports what would happen without touching anything.

use crate::atomic;
use crate::config::ConfigMap;
use crate::error::StepError;
use crate::step::{ContentFn, LineMatcher, ProvisioningStep};
use crate::types::StepOutcome;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Result of a single step
pub type StepResult = Result<StepOutcome, StepError>;

/// Operations a plan can be built from.
///
/// Implementations must confine side effects to the destination argument.
pub trait StepExecutor: Send + Sync {
    /// Replace `destination` with the content of `source` (last write wins)
    fn copy(&self, source: &Path, destination: &Path) -> StepResult;

    /// Set permission bits; a missing path is `TargetNotFound`
    fn chmod(&self, path: &Path, mode: u32) -> StepResult;

    /// Point `destination` at `source`, replacing any file or link already there
    fn symlink(&self, source: &Path, destination: &Path) -> StepResult;

    /// Append `line` unless a line of `path` matches `matcher`
    fn append_line_unless_matches(
        &self,
        path: &Path,
        matcher: &LineMatcher,
        line: &str,
    ) -> StepResult;

    /// Write `content()` to `path` only if `path` does not exist
    fn conditional_write(&self, path: &Path, content: &ContentFn) -> StepResult;

    /// Replace `${key}` placeholders in `path` with values from `properties`
    fn expand_properties(&self, path: &Path, properties: &ConfigMap) -> StepResult;

    /// Create a directory and its parents
    fn ensure_dir(&self, path: &Path) -> StepResult;

    /// Validate and dispatch a step
    fn execute(&self, step: &ProvisioningStep) -> StepResult {
        step.validate()?;
        match step {
            ProvisioningStep::Copy {
                source,
                destination,
            } => self.copy(source, destination),
            ProvisioningStep::Chmod { path, mode } => self.chmod(path, *mode),
            ProvisioningStep::Symlink {
                source,
                destination,
            } => self.symlink(source, destination),
            ProvisioningStep::AppendLineUnlessMatches {
                path,
                matcher,
                line,
            } => self.append_line_unless_matches(path, matcher, line),
            ProvisioningStep::ConditionalWrite { path, content } => {
                self.conditional_write(path, content)
            }
            ProvisioningStep::ExpandProperties { path, properties } => {
                self.expand_properties(path, properties)
            }
            ProvisioningStep::EnsureDir { path } => self.ensure_dir(path),
        }
    }
}

/// True for anything at `path`, including dangling symlinks
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn ensure_parent(path: &Path) -> Result<(), StepError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.is_dir()
    {
        fs::create_dir_all(parent).map_err(|e| StepError::write(parent, e))?;
    }
    Ok(())
}

fn read_target(path: &Path) -> Result<String, StepError> {
    if !path.is_file() {
        return Err(StepError::TargetNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| StepError::read(path, e))
}

fn not_a_directory(path: &Path) -> StepError {
    StepError::write(
        path,
        io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
    )
}

/// Executor that applies steps to the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsExecutor;

impl FsExecutor {
    pub fn new() -> Self {
        Self
    }

    fn link(source: &Path, link: &Path) -> io::Result<()> {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(source, link)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::{symlink_dir, symlink_file};

            if source.is_dir() {
                symlink_dir(source, link)
            } else {
                symlink_file(source, link)
            }
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = (source, link);
            Err(io::Error::other("symlinks not supported on this platform"))
        }
    }
}

impl StepExecutor for FsExecutor {
    fn copy(&self, source: &Path, destination: &Path) -> StepResult {
        if !source.is_file() {
            return Err(StepError::SourceNotFound(source.to_path_buf()));
        }
        let contents = fs::read(source).map_err(|e| StepError::read(source, e))?;

        let existed = occupied(destination);
        if existed && fs::read(destination).is_ok_and(|current| current == contents) {
            log::debug!("{} already up to date", destination.display());
            return Ok(StepOutcome::Unchanged);
        }

        ensure_parent(destination)?;
        atomic::replace_file(destination, &contents)?;
        log::debug!("copied {} -> {}", source.display(), destination.display());

        Ok(if existed {
            StepOutcome::Modified
        } else {
            StepOutcome::Created
        })
    }

    fn chmod(&self, path: &Path, mode: u32) -> StepResult {
        let meta = fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StepError::TargetNotFound(path.to_path_buf()),
            _ => StepError::write(path, e),
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            if meta.permissions().mode() & 0o7777 == mode {
                return Ok(StepOutcome::Unchanged);
            }
            fs::set_permissions(path, fs::Permissions::from_mode(mode))
                .map_err(|e| StepError::write(path, e))?;
        }

        #[cfg(not(unix))]
        {
            let readonly = mode & 0o200 == 0;
            let mut permissions = meta.permissions();
            if permissions.readonly() == readonly {
                return Ok(StepOutcome::Unchanged);
            }
            permissions.set_readonly(readonly);
            fs::set_permissions(path, permissions).map_err(|e| StepError::write(path, e))?;
        }

        log::debug!("chmod {mode:o} {}", path.display());
        Ok(StepOutcome::Modified)
    }

    fn symlink(&self, source: &Path, destination: &Path) -> StepResult {
        // A relative link target resolves against the link's directory, not the cwd
        let source = std::path::absolute(source).map_err(|e| StepError::read(source, e))?;
        let source = source.as_path();
        if !source.exists() {
            return Err(StepError::SourceNotFound(source.to_path_buf()));
        }

        let existing = fs::symlink_metadata(destination).ok();
        if let Some(meta) = &existing {
            if meta.file_type().is_symlink() {
                if fs::read_link(destination).is_ok_and(|current| current == source) {
                    return Ok(StepOutcome::Unchanged);
                }
            } else if meta.is_dir() {
                return Err(StepError::write(
                    destination,
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "a directory occupies the link destination",
                    ),
                ));
            }
        }

        ensure_parent(destination)?;

        // Stage the link under a sibling name, then rename it over the destination
        let file_name = destination.file_name().ok_or_else(|| {
            StepError::InvalidStep(format!("{} has no file name", destination.display()))
        })?;
        let staging = destination.with_file_name(format!(
            ".{}.tmp-{}",
            file_name.to_string_lossy(),
            std::process::id()
        ));
        if occupied(&staging) {
            fs::remove_file(&staging).map_err(|e| StepError::write(&staging, e))?;
        }
        Self::link(source, &staging).map_err(|e| StepError::write(destination, e))?;
        if let Err(e) = fs::rename(&staging, destination) {
            let _ = fs::remove_file(&staging);
            return Err(StepError::write(destination, e));
        }

        log::debug!("linked {} -> {}", destination.display(), source.display());
        Ok(if existing.is_some() {
            StepOutcome::Modified
        } else {
            StepOutcome::Created
        })
    }

    fn append_line_unless_matches(
        &self,
        path: &Path,
        matcher: &LineMatcher,
        line: &str,
    ) -> StepResult {
        let mut contents = read_target(path)?;
        if contents.lines().any(|existing| matcher.is_match(existing)) {
            return Ok(StepOutcome::Unchanged);
        }

        if !contents.is_empty() && !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push_str(line);
        contents.push('\n');

        atomic::replace_file(path, contents.as_bytes())?;
        log::debug!("appended line to {}", path.display());
        Ok(StepOutcome::Modified)
    }

    fn conditional_write(&self, path: &Path, content: &ContentFn) -> StepResult {
        if occupied(path) {
            return Ok(StepOutcome::Unchanged);
        }

        ensure_parent(path)?;
        if atomic::create_file(path, content().as_bytes())? {
            log::debug!("wrote {}", path.display());
            Ok(StepOutcome::Created)
        } else {
            Ok(StepOutcome::Unchanged)
        }
    }

    fn expand_properties(&self, path: &Path, properties: &ConfigMap) -> StepResult {
        let contents = read_target(path)?;
        let expanded = properties.expand(&contents);
        if expanded == contents {
            return Ok(StepOutcome::Unchanged);
        }

        atomic::replace_file(path, expanded.as_bytes())?;
        log::debug!("expanded properties in {}", path.display());
        Ok(StepOutcome::Modified)
    }

    fn ensure_dir(&self, path: &Path) -> StepResult {
        if path.is_dir() {
            return Ok(StepOutcome::Unchanged);
        }
        if occupied(path) {
            return Err(not_a_directory(path));
        }
        fs::create_dir_all(path).map_err(|e| StepError::write(path, e))?;
        Ok(StepOutcome::Created)
    }
}

/// Executor that checks preconditions without changing anything.
///
/// Paths an earlier step would have created count as present, so a dry run
/// of a plan against an unprovisioned tree reports the same failures a real
/// run would.
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    planned: Mutex<HashSet<PathBuf>>,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn exists(&self, path: &Path) -> bool {
        occupied(path) || self.planned().contains(path)
    }

    fn plan(&self, path: &Path) {
        self.planned().insert(path.to_path_buf());
    }

    fn planned(&self) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
        // A poisoned set only means another dry run panicked; the data is still usable
        self.planned
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn skipped() -> StepResult {
        Ok(StepOutcome::Skipped {
            reason: "dry run".to_string(),
        })
    }
}

impl StepExecutor for DryRunExecutor {
    fn copy(&self, source: &Path, destination: &Path) -> StepResult {
        if !self.exists(source) {
            return Err(StepError::SourceNotFound(source.to_path_buf()));
        }
        self.plan(destination);
        Self::skipped()
    }

    fn chmod(&self, path: &Path, _mode: u32) -> StepResult {
        if !self.exists(path) {
            return Err(StepError::TargetNotFound(path.to_path_buf()));
        }
        Self::skipped()
    }

    fn symlink(&self, source: &Path, destination: &Path) -> StepResult {
        if !self.exists(source) {
            return Err(StepError::SourceNotFound(source.to_path_buf()));
        }
        self.plan(destination);
        Self::skipped()
    }

    fn append_line_unless_matches(
        &self,
        path: &Path,
        _matcher: &LineMatcher,
        _line: &str,
    ) -> StepResult {
        if !self.exists(path) {
            return Err(StepError::TargetNotFound(path.to_path_buf()));
        }
        Self::skipped()
    }

    fn conditional_write(&self, path: &Path, _content: &ContentFn) -> StepResult {
        if occupied(path) {
            return Ok(StepOutcome::Unchanged);
        }
        self.plan(path);
        Self::skipped()
    }

    fn expand_properties(&self, path: &Path, _properties: &ConfigMap) -> StepResult {
        if !self.exists(path) {
            return Err(StepError::TargetNotFound(path.to_path_buf()));
        }
        Self::skipped()
    }

    fn ensure_dir(&self, path: &Path) -> StepResult {
        if path.is_dir() {
            return Ok(StepOutcome::Unchanged);
        }
        if occupied(path) {
            return Err(not_a_directory(path));
        }
        self.plan(path);
        Self::skipped()
    }
}
