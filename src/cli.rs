use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitekit")]
#[command(version)]
#[command(about = "Provision local settings, git hooks and hash salt for multisite projects", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Repository root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub repo_root: Option<PathBuf>,

    /// Configuration file (defaults to sitekit.toml in the repository root)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate local settings for every multisite
    Settings(SettingsArgs),

    /// Generate the local behat configuration
    Behat(RunArgs),

    /// Link git hooks into .git/hooks
    GitHooks(RunArgs),

    /// Write a hash salt file unless one exists
    HashSalt(OutputArgs),

    /// Run settings, behat, git-hooks and hash-salt in one go
    All(AllArgs),

    /// Print the resolved configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared Args
// ============================================================================

#[derive(Args, Clone, Copy, Default)]
pub struct OutputArgs {
    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Copy, Default)]
pub struct RunArgs {
    /// Show what would change without touching the tree
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Clone, Default)]
pub struct SettingsArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Number of sites to provision in parallel
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Only provision these sites (must be listed in multisites)
    #[arg(long = "site", value_name = "NAME")]
    pub sites: Vec<String>,
}

#[derive(Args, Clone, Copy, Default)]
pub struct AllArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Number of sites to provision in parallel
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,
}
