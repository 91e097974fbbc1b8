//! # Provision
//!
//! Declarative provisioning of a site's local files.
//!
//! Every change to the tree is described as a typed [`ProvisioningStep`],
//! grouped into an ordered [`ProvisioningPlan`] and applied by a
//! [`StepExecutor`]. Steps check the tree before acting, so running a plan
//! twice leaves the tree as the first run did.
//!
//! ## Core Concepts
//!
//! - **ConfigMap**: Flat key/value configuration with `${key}` expansion
//! - **SiteContext**: Every path one site needs, resolved from the config
//! - **ProvisioningStep**: Copy, chmod, symlink, append, conditional write,
//!   property expansion and directory creation
//! - **Sequencer**: Runs one plan, fail-fast, with `finally` cleanup steps
//! - **MultisiteProvisioner**: Runs the settings plan of every site, isolating
//!   failures per site
//!
//! ## Example
//!
//! ```ignore
//! use provision::{ConfigMap, FsExecutor, MultisiteProvisioner};
//!
//! let config = ConfigMap::new()
//!     .with("repo.root", "/srv/app")
//!     .with("docroot", "/srv/app/docroot")
//!     .with("blt.root", "/srv/app/vendor/acquia/blt")
//!     .with("multisites", vec!["default".to_string()]);
//!
//! let sites = config.require_list("multisites")?.to_vec();
//! let report = MultisiteProvisioner::new(&FsExecutor).provision_all(&sites, &config);
//! assert!(report.is_success());
//! ```
//!
//! ## Executors
//!
//! - [`FsExecutor`]: Applies steps to the real filesystem with atomic writes
//! - [`DryRunExecutor`]: Checks preconditions and reports what would run

mod atomic;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod multisite;
pub mod project;
pub mod resolver;
pub mod salt;
pub mod sequencer;
pub mod step;
pub mod types;

// Re-export main types at crate root
pub use config::{ConfigMap, ConfigValue};
pub use context::{NoProgress, ProgressCallback};
pub use error::{Error, Result, SequencerError, StepError};
pub use executor::{DryRunExecutor, FsExecutor, StepExecutor, StepResult};
pub use hooks::{GIT_HOOKS, HookReport, HookStatus, install_git_hooks};
pub use multisite::{MultisiteProvisioner, ProvisionReport, SiteReport, site_plan};
pub use project::{behat_plan, local_config_plan};
pub use resolver::{ProjectPaths, SiteContext, resolve_site};
pub use salt::{apply_salt, ensure_salt, generate_salt, salt_path};
pub use sequencer::{PlanBuilder, ProvisioningPlan, Sequencer};
pub use step::{ContentFn, LineMatcher, ProvisioningStep};
pub use types::{ExecuteOptions, ExecuteSummary, PlanReport, StepOutcome, StepRecord};
