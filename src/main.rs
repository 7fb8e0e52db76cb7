//! # copycat CLI
//!
//! Binary entry point for the `copycat` command-line tool. It parses the
//! arguments, sets up logging and hands off to the command implementations.
//! All patching logic lives in the library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
