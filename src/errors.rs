//! Harness error handling.
//!
//! Every failure the harness reports is a [`HarnessError`]. Nothing is
//! retried: errors travel up to [`crate::cli`], are rendered once through
//! `miette` and end the process with a non-zero exit status.

use std::io;
use std::path::PathBuf;

use miette::{Diagnostic, Report};
use thiserror::Error;

use crate::assertions::Violation;
use crate::plan::MalformedPlan;
use crate::supervisor::{BudgetBreach, ChildExit};

/// Result alias used across the crate.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Unified error type for every way a harness run can fail.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("could not read plan file '{}'", path.display())]
    #[diagnostic(
        code(harness::plan::unreadable),
        help("pass the plan path as the last argument or create test_harness.config in the working directory")
    )]
    PlanUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    MalformedPlan(#[from] MalformedPlan),

    #[error("could not render plan as JSON")]
    #[diagnostic(code(harness::plan::render))]
    PlanRender(#[source] serde_json::Error),

    #[error("collector '{name}' is not available")]
    #[diagnostic(code(harness::collector::unavailable))]
    PluginUnavailable {
        name: String,
        #[help]
        help: Option<String>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Conformance(#[from] Violation),

    #[error("load test #{index} on '{collection}.{entity}' exceeded its budget: {breach}")]
    #[diagnostic(code(harness::load::budget_exceeded))]
    LoadBudgetExceeded {
        index: usize,
        collection: String,
        entity: String,
        breach: BudgetBreach,
    },

    #[error("failed to start child process for load test #{index}")]
    #[diagnostic(code(harness::load::launch))]
    ChildProcessLaunch {
        index: usize,
        #[source]
        source: io::Error,
    },

    #[error("lost track of the child process for load test #{index}")]
    #[diagnostic(code(harness::load::monitor))]
    ChildMonitor {
        index: usize,
        #[source]
        source: io::Error,
    },

    #[error("child process for load test #{index} did not finish cleanly ({exit})")]
    #[diagnostic(
        code(harness::load::child_failed),
        help("the child output above shows why the sampling run failed")
    )]
    LoadChildFailed { index: usize, exit: ChildExit },

    #[error("load test #{index} does not exist; the plan defines {count} load test(s)")]
    #[diagnostic(code(harness::load::index))]
    LoadTestIndexOutOfRange { index: usize, count: usize },
}

impl HarnessError {
    /// Builds the error for a collector name the registry does not know.
    pub fn plugin_unavailable<'a>(
        name: &str,
        registered: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let registered: Vec<&str> = registered.into_iter().collect();
        let help = if registered.is_empty() {
            None
        } else {
            Some(format!("registered collectors: {}", registered.join(", ")))
        };
        HarnessError::PluginUnavailable {
            name: name.to_string(),
            help,
        }
    }
}

/// Prints a harness error with full miette diagnostics.
pub fn print_error(error: HarnessError) {
    let report = Report::new(error);
    eprintln!("{report:?}");
}
