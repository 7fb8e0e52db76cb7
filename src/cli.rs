//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use copycat::output::{ColorChoice, Output};

use crate::commands;

/// copycat - Apply the project patches contributed by installed packages
#[derive(Parser, Debug)]
#[command(name = "copycat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Root of the project to patch (defaults to the current directory)
    #[arg(long, global = true, value_name = "PATH", env = "COPYCAT_PROJECT_ROOT")]
    project_root: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply the directives of every installed unit
    Install(commands::install::InstallArgs),

    /// Revert the directives of one package
    Uninstall(commands::uninstall::UninstallArgs),

    /// List discovered units and whether they carry directives
    List(commands::list::ListArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Settings shared by every command.
#[derive(Debug)]
pub struct GlobalArgs {
    pub project_root: PathBuf,
    pub output: Output,
}

impl GlobalArgs {
    fn new(project_root: Option<PathBuf>, color: &str) -> Result<Self> {
        let choice: ColorChoice = color.parse()?;
        let project_root = match project_root {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        Ok(Self {
            project_root,
            output: Output::new(choice),
        })
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::new()
            .parse_filters(&self.log_level)
            .format_timestamp(None)
            .format_target(false)
            .target(env_logger::Target::Stderr)
            .try_init()
            .ok();

        match self.command {
            Commands::Install(args) => {
                commands::install::execute(args, &GlobalArgs::new(self.project_root, &self.color)?)
            }
            Commands::Uninstall(args) => {
                commands::uninstall::execute(args, &GlobalArgs::new(self.project_root, &self.color)?)
            }
            Commands::List(args) => {
                commands::list::execute(args, &GlobalArgs::new(self.project_root, &self.color)?)
            }
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
