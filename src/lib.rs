//! Conformance harness for data-source collectors.
//!
//! A collector connects to a data store, reports its schema, samples values
//! from its entities and reports storage metrics. The harness reads a
//! declarative plan file, runs the collector through an ordered sequence of
//! contract checks and then supervises load tests in child processes.
//!
//! The pipeline, leaf first:
//! 1. [`plan`] parses the plan file into a [`TestPlan`]
//! 2. [`collector`] defines the contract and resolves collectors by name
//! 3. [`assertions`] runs the ordered checks, stopping at the first violation
//! 4. [`supervisor`] runs each load test in a monitored child process
//! 5. [`cli`] wires everything to the command line

pub use crate::errors::{HarnessError, HarnessResult};
pub use crate::plan::TestPlan;

pub mod assertions;
pub mod cli;
pub mod collector;
pub mod config;
pub mod errors;
pub mod logging;
pub mod plan;
pub mod supervisor;
