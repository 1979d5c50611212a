//! Load-test supervision.
//!
//! Every load test runs the harness itself again in `--load-test <index>`
//! mode. The parent polls the child until it exits, killing it as soon as it
//! runs longer or grows larger than the budgets of its plan record. Load
//! tests run one after another and the first failure stops the rest.

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::assertions::{CheckKind, Violation};
use crate::cli::output::{Outcome, OutputSink};
use crate::collector::{Collector, DataContainer, DataEntity};
use crate::errors::{HarnessError, HarnessResult};
use crate::plan::{LoadTestCheck, TestPlan};

pub mod memory;
pub mod process;

pub use process::{ChildExit, ChildLauncher, MonitoredProcess, OsChild, SelfRelaunch};

/// Time between two observations of a running child.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

const BYTES_PER_MB: u64 = 1024 * 1024;

/// The budget a child broke before it exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetBreach {
    RunTime { elapsed: Duration, budget_sec: u64 },
    Memory { observed_bytes: u64, budget_mb: u64 },
}

impl fmt::Display for BudgetBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetBreach::RunTime {
                elapsed,
                budget_sec,
            } => write!(
                f,
                "process ran for {:.1}s, which is more than the maximum of {budget_sec} seconds",
                elapsed.as_secs_f64()
            ),
            BudgetBreach::Memory {
                observed_bytes,
                budget_mb,
            } => write!(
                f,
                "process consumes {observed_bytes} bytes, which is more than the maximum of {budget_mb} MB"
            ),
        }
    }
}

/// Compares one observation of a child with the budgets of `check`.
///
/// Run time is checked before memory. Memory is compared in whole megabytes,
/// so a budget of 1 MB is only broken from 2 MB of resident memory on.
pub fn evaluate_budgets(
    check: &LoadTestCheck,
    elapsed: Duration,
    resident_bytes: Option<u64>,
) -> Option<BudgetBreach> {
    if let Some(budget) = check.run_time_budget() {
        if elapsed > budget {
            return Some(BudgetBreach::RunTime {
                elapsed,
                budget_sec: check.max_run_time_sec,
            });
        }
    }
    if let (Some(budget_mb), Some(bytes)) = (check.memory_budget_mb(), resident_bytes) {
        if bytes / BYTES_PER_MB > budget_mb {
            return Some(BudgetBreach::Memory {
                observed_bytes: bytes,
                budget_mb,
            });
        }
    }
    None
}

// ============================================================================
// SUPERVISOR
// ============================================================================

/// Runs the load tests of a plan through a [`ChildLauncher`].
pub struct LoadTestSupervisor<L: ChildLauncher> {
    launcher: L,
    poll_interval: Duration,
}

impl<L: ChildLauncher> LoadTestSupervisor<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs every load test of `plan` in order, stopping at the first failure.
    pub fn run_all(&self, plan: &TestPlan, out: &mut dyn OutputSink) -> HarnessResult<()> {
        const STEP: &str = "Testing memory usage";
        if plan.load_tests.is_empty() {
            out.outcome(STEP, Outcome::Skipped);
            return Ok(());
        }
        if !memory::is_supported() && plan.load_tests.iter().any(|c| c.max_memory_mb > 0) {
            warn!("resident memory cannot be observed on this platform; memory budgets are not enforced");
        }

        out.emit(STEP);
        for (index, check) in plan.load_tests.iter().enumerate() {
            out.emit(&format!("#{index}. Loading {} samples...", check.sample_size));
            self.run_one(index, check)?;
            out.outcome(&format!("#{index}."), Outcome::Success);
        }
        out.emit("All load tests passed.");
        out.emit("");
        Ok(())
    }

    /// Launches and watches the child for load test `index`.
    pub fn run_one(&self, index: usize, check: &LoadTestCheck) -> HarnessResult<()> {
        let mut child = self
            .launcher
            .launch(index)
            .map_err(|source| HarnessError::ChildProcessLaunch { index, source })?;
        info!(index, pid = child.pid(), "load test started");

        loop {
            let exit = child
                .poll_exit()
                .map_err(|source| HarnessError::ChildMonitor { index, source })?;
            if let Some(exit) = exit {
                debug!(index, %exit, elapsed = ?child.elapsed(), "load test child exited");
                return if exit.success() {
                    Ok(())
                } else {
                    Err(HarnessError::LoadChildFailed { index, exit })
                };
            }

            let elapsed = child.elapsed();
            let resident = child.resident_memory_bytes();
            debug!(index, ?elapsed, ?resident, "load test child running");
            if let Some(breach) = evaluate_budgets(check, elapsed, resident) {
                warn!(index, %breach, "killing load test child");
                child.terminate();
                return Err(HarnessError::LoadBudgetExceeded {
                    index,
                    collection: check.collection.clone(),
                    entity: check.entity.clone(),
                    breach,
                });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

// ============================================================================
// CHILD MODE
// ============================================================================

/// Body of a `--load-test <index>` child run: one `collect_sample` call.
///
/// Returns the number of collected values.
pub fn run_child_entry(
    collector: &dyn Collector,
    plan: &TestPlan,
    index: usize,
    out: &mut dyn OutputSink,
) -> HarnessResult<usize> {
    let check = plan
        .load_test(index)
        .ok_or(HarnessError::LoadTestIndexOutOfRange {
            index,
            count: plan.load_tests.len(),
        })?;

    let container = DataContainer::new(plan.connection_string.clone());
    let entity = DataEntity::named(&container, &check.collection, &check.entity);
    let samples = collector
        .collect_sample(&entity, check.sample_size)
        .map_err(|source| {
            HarnessError::from(Violation::CollectorFailed {
                check: CheckKind::CollectSample,
                operation: "collect_sample",
                source,
            })
        })?;

    out.emit(&format!(
        "Load testing... - success, collected {} samples.",
        samples.len()
    ));
    out.emit("");
    Ok(samples.len())
}
