//! Hash salt generation

use crate::config::ConfigMap;
use crate::error::{self, StepError};
use crate::executor::{StepExecutor, StepResult};
use crate::resolver::KEY_REPO_ROOT;
use crate::step::ProvisioningStep;
use crate::types::StepOutcome;
use rand::Rng;
use rand::distr::Alphanumeric;
use std::path::{Path, PathBuf};

/// Salt file name under the repository root
pub const SALT_FILE: &str = "salt.txt";

/// Number of characters in a generated salt
pub const SALT_LENGTH: usize = 55;

/// Random `[A-Za-z0-9]` string of `length` characters
pub fn generate_salt(length: usize) -> String {
    let mut rng = rand::rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// `<repo.root>/salt.txt`
pub fn salt_path(config: &ConfigMap) -> error::Result<PathBuf> {
    Ok(Path::new(config.require_str(KEY_REPO_ROOT)?).join(SALT_FILE))
}

/// The step that creates the salt file when it is absent
pub fn salt_step(path: impl AsRef<Path>) -> ProvisioningStep {
    ProvisioningStep::conditional_write(path, || format!("{}\n", generate_salt(SALT_LENGTH)))
}

/// Create the salt file at `path` unless it exists, reporting what happened
pub fn apply_salt(path: &Path, executor: &dyn StepExecutor) -> StepResult {
    let outcome = executor.execute(&salt_step(path))?;
    match outcome {
        StepOutcome::Created => log::info!("wrote hash salt to {}", path.display()),
        StepOutcome::Unchanged => log::debug!("hash salt already present at {}", path.display()),
        StepOutcome::Modified | StepOutcome::Skipped { .. } => {}
    }
    Ok(outcome)
}

/// Make sure a salt file exists at `path`.
///
/// Existence is the only check: an existing file is never read or rewritten.
/// Returns `true` both when the file was already there and when it was created.
pub fn ensure_salt(path: &Path, executor: &dyn StepExecutor) -> Result<bool, StepError> {
    apply_salt(path, executor).map(|_| true)
}
