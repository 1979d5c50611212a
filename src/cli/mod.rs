//! The harness command-line interface.
//!
//! This module is the main entry point of the binary. It parses arguments,
//! sets up logging, and dispatches to plan printing, child mode, or a full
//! conformance run.

use std::process;

use tracing::{debug, info};

use crate::assertions::AssertionEngine;
use crate::cli::args::{HarnessArgs, PrintFormat};
use crate::cli::output::{ConsoleSink, OutputSink};
use crate::collector::{build_default_registry, CollectorRegistry};
use crate::config::HarnessConfig;
use crate::errors::{print_error, HarnessError, HarnessResult};
use crate::logging::init_logging;
use crate::plan::load_plan;
use crate::supervisor::{run_child_entry, LoadTestSupervisor, SelfRelaunch};

pub mod args;
pub mod output;

/// The main entry point for the CLI, using the bundled collectors.
pub fn run() {
    run_with_registry(build_default_registry());
}

/// Runs the CLI against a caller-supplied collector registry.
///
/// Load tests relaunch the running executable, so a binary built around this
/// function sees the same registry in its child runs.
pub fn run_with_registry(registry: CollectorRegistry) {
    let args = HarnessArgs::parse_normalized(std::env::args_os());
    let config = HarnessConfig::from_args(&args);
    init_logging(config.verbosity);

    let mut out = ConsoleSink::new(config.color);
    if let Err(e) = dispatch(&args, &config, &registry, &mut out) {
        print_error(e);
        process::exit(1);
    }
}

/// Executes one invocation and reports progress to `out`.
pub fn dispatch(
    args: &HarnessArgs,
    config: &HarnessConfig,
    registry: &CollectorRegistry,
    out: &mut dyn OutputSink,
) -> HarnessResult<()> {
    if args.list_collectors {
        for name in registry.names() {
            out.emit(name);
        }
        return Ok(());
    }

    let plan = load_plan(&config.plan_path)?;
    debug!(
        path = %config.plan_path.display(),
        records = plan.record_count(),
        "plan loaded"
    );

    if let Some(format) = args.print_plan {
        let text = match format {
            PrintFormat::Text => plan.to_string(),
            PrintFormat::Json => {
                serde_json::to_string_pretty(&plan).map_err(HarnessError::PlanRender)?
            }
        };
        out.emit(text.trim_end());
        return Ok(());
    }

    out.emit(&format!(
        "{} v.{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    out.emit(&format!("   loading {}...", config.plan_path.display()));
    let collector = registry.resolve(&plan.collector_name)?;

    if let Some(index) = args.load_test {
        info!(index, "running load test child");
        run_child_entry(collector.as_ref(), &plan, index, out)?;
        return Ok(());
    }

    out.emit(&format!("Testing {}", plan.collector_name));
    out.emit("");
    AssertionEngine::new(collector.as_ref(), &plan).run(out)?;

    LoadTestSupervisor::new(SelfRelaunch::new(&config.plan_path))
        .with_poll_interval(config.poll_interval)
        .run_all(&plan, out)?;

    out.emit("All tests passed.");
    Ok(())
}
