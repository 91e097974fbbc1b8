//! Command implementations
//!
//! Each provisioning command has a `run` entry point for the CLI and a
//! `provision` function that adds its targets to a shared [`RunSummary`],
//! so `all` can chain them against one executor.
//!
//! [`RunSummary`]: crate::report::RunSummary

pub mod all;
pub mod behat;
pub mod config;
pub mod git_hooks;
pub mod hash_salt;
pub mod settings;

use provision::{DryRunExecutor, FsExecutor, StepExecutor};

/// Executor for a run: real I/O, or precondition checks only
pub fn executor(dry_run: bool) -> Box<dyn StepExecutor> {
    if dry_run {
        Box::new(DryRunExecutor::new())
    } else {
        Box::new(FsExecutor)
    }
}
