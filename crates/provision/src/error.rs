use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single provisioning step.
///
/// Every variant aborts the remainder of the plan the step belongs to.
#[derive(Debug, Error)]
pub enum StepError {
    /// A file the step reads from does not exist
    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),

    /// The file the step modifies in place does not exist
    #[error("target not found: {0}")]
    TargetNotFound(PathBuf),

    /// A file the step needs could not be read as text
    #[error("read failed for {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The underlying filesystem write or permission change failed
    #[error("write failed for {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line pattern that does not compile as a regular expression
    #[error("invalid line pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A step that violates its own shape (empty destination and the like)
    #[error("invalid step: {0}")]
    InvalidStep(String),
}

impl StepError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ReadFailure {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }
}

/// The first failing step of a plan.
#[derive(Debug, Error)]
#[error("step {index} ({step}) failed: {source}")]
pub struct SequencerError {
    /// Position of the failing step; `finally` steps continue the numbering
    pub index: usize,
    /// Description of the failing step
    pub step: String,
    #[source]
    pub source: StepError,
}

/// Errors surfaced by plan construction and plan runs.
#[derive(Debug, Error)]
pub enum Error {
    /// A required configuration value is absent
    #[error("missing configuration key: {0}")]
    MissingConfigKey(String),

    /// A configuration value of the wrong shape
    #[error("configuration key {key} must be {expected}")]
    InvalidConfigValue { key: String, expected: &'static str },

    /// A site name that cannot be used as a directory under `sites/`
    #[error("invalid site name: '{0}'")]
    InvalidSiteName(String),

    /// A step could not be constructed
    #[error(transparent)]
    Step(#[from] StepError),

    /// A plan stopped at a failing step
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

/// Result type for provisioning operations
pub type Result<T> = std::result::Result<T, Error>;
