//! Defines the command-line arguments for the harness.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::plan::DEFAULT_PLAN_FILE;

/// Spelling of the child-mode flag accepted for compatibility with older scripts.
pub const LEGACY_LOAD_TEST_FLAG: &str = "-load-test";

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "collector-harness",
    version,
    about = "Conformance and load test harness for data-source collectors."
)]
pub struct HarnessArgs {
    /// The plan file describing the checks to run.
    #[arg(default_value = DEFAULT_PLAN_FILE)]
    pub plan: PathBuf,

    /// Run only the sampling step of one load test (used for child runs).
    #[arg(long, value_name = "INDEX", hide = true)]
    pub load_test: Option<usize>,

    /// Parse the plan, print it and exit.
    #[arg(long, value_name = "FORMAT", conflicts_with_all = ["load_test", "list_collectors"])]
    pub print_plan: Option<PrintFormat>,

    /// List the registered collectors and exit.
    #[arg(long, conflicts_with = "load_test")]
    pub list_collectors: bool,

    /// Interval between two observations of a load test child.
    #[arg(
        long,
        value_name = "MS",
        env = "COLLECTOR_HARNESS_POLL_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// When to colour the console output.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Raise the log level (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl HarnessArgs {
    /// Parses arguments after rewriting legacy flag spellings.
    pub fn parse_normalized<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(normalize_legacy_flags(args))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrintFormat {
    /// Canonical plan text
    Text,
    /// The parsed plan as JSON
    Json,
}

/// Rewrites `-load-test` (any case) to `--load-test`.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some(text) if text.eq_ignore_ascii_case(LEGACY_LOAD_TEST_FLAG) => {
                OsString::from("--load-test")
            }
            _ => arg,
        })
        .collect()
}
