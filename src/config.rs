//! Run configuration.
//!
//! [`HarnessConfig`] is what the rest of the CLI consumes; it is built from
//! parsed arguments so defaults live in one place.

use std::path::PathBuf;
use std::time::Duration;

use termcolor::ColorChoice;

use crate::cli::args::{ColorMode, HarnessArgs};
use crate::plan::DEFAULT_PLAN_FILE;
use crate::supervisor::DEFAULT_POLL_INTERVAL;

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub plan_path: PathBuf,
    pub poll_interval: Duration,
    pub color: ColorChoice,
    pub verbosity: u8,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            plan_path: PathBuf::from(DEFAULT_PLAN_FILE),
            poll_interval: DEFAULT_POLL_INTERVAL,
            color: color_choice(ColorMode::Auto),
            verbosity: 0,
        }
    }
}

impl HarnessConfig {
    pub fn from_args(args: &HarnessArgs) -> Self {
        Self {
            plan_path: args.plan.clone(),
            poll_interval: Duration::from_millis(args.poll_interval_ms),
            color: color_choice(args.color),
            verbosity: args.verbose,
        }
    }
}

/// Resolves `auto` against whether stdout is a terminal.
pub fn color_choice(mode: ColorMode) -> ColorChoice {
    match mode {
        ColorMode::Always => ColorChoice::Always,
        ColorMode::Never => ColorChoice::Never,
        ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
        ColorMode::Auto => ColorChoice::Never,
    }
}
