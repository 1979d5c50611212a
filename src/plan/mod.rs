//! Declarative test plans.
//!
//! A plan file names the collector under test, its connection string and a
//! list of pipe-delimited records, one per check:
//!
//! ```text
//! # comments and blank lines are ignored
//! CsvCollector
//! /var/data/warehouse
//! getschema|3|12
//! collectsample|people|name|5|Ada|Grace
//! randomsample|people|name|5
//! datacollectionmetrics|people|100|12.340|5.1
//! loadtest|people|name|100000|512|30
//! ```
//!
//! [`parse_plan`] turns the text into a [`TestPlan`]; the `Display` impl in
//! [`render`] turns it back into canonical plan text.

pub mod model;
pub mod parser;
pub mod render;

pub use model::{
    CollectSampleCheck, LoadTestCheck, MetricsCheck, RandomSampleCheck, RecordKind,
    SchemaExpectation, TestPlan,
};
pub use parser::{load_plan, parse_plan, MalformedPlan, RecordRef, DEFAULT_PLAN_FILE};
