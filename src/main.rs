mod cli;
mod commands;
mod paths;
mod progress;
mod report;
mod schema;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub repo_root: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl Context {
    /// Load the project configuration for this invocation
    pub fn load_config(&self) -> Result<schema::LoadedConfig> {
        schema::load(self.repo_root.as_deref(), self.config.as_deref())
    }

    /// Whether headers and progress bars go to the terminal
    pub fn show_progress(&self, json: bool) -> bool {
        !self.quiet && !json
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        repo_root: cli.repo_root,
        config: cli.config,
    };

    match cli.command {
        Command::Settings(args) => commands::settings::run(&ctx, args),
        Command::Behat(args) => commands::behat::run(&ctx, args),
        Command::GitHooks(args) => commands::git_hooks::run(&ctx, args),
        Command::HashSalt(args) => commands::hash_salt::run(&ctx, args),
        Command::All(args) => commands::all::run(&ctx, args),
        Command::Config { json } => commands::config::run(&ctx, json),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sitekit", &mut io::stdout());
            Ok(())
        }
    }
}
