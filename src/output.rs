//! # Output Styling
//!
//! Colors for the command-line report. The `--color` flag decides, with
//! `auto` falling back to the environment:
//! - `NO_COLOR` (any value) disables colors
//! - `CLICOLOR=0` disables colors
//! - `CLICOLOR_FORCE=1` forces colors even when stdout is not a terminal
//! - `TERM=dumb` disables colors
//!
//! Otherwise colors follow the terminal capabilities reported by `console`.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use console::style;

use crate::error::{Error, Result};

/// Value of the `--color` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for ColorChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            other => Err(Error::Config {
                message: format!("unknown color mode '{}'", other),
                hint: Some("use one of: auto, always, never".to_string()),
            }),
        }
    }
}

/// Styles report text according to the color choice.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    color: bool,
}

impl Output {
    pub fn new(choice: ColorChoice) -> Self {
        let color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => detect_color_support(),
        };
        Self { color }
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn heading(&self, text: impl Display) -> String {
        style(text).bold().force_styling(self.color).to_string()
    }

    pub fn success(&self, text: impl Display) -> String {
        style(text).green().force_styling(self.color).to_string()
    }

    pub fn failure(&self, text: impl Display) -> String {
        style(text).red().force_styling(self.color).to_string()
    }

    pub fn muted(&self, text: impl Display) -> String {
        style(text).dim().force_styling(self.color).to_string()
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

fn detect_color_support() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return false;
    }
    if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
        return true;
    }
    if env::var("TERM").is_ok_and(|v| v == "dumb") {
        return false;
    }
    console::Term::stdout().features().colors_supported()
}
