//! Typed representation of a parsed plan file.
//!
//! A [`TestPlan`] is built once per run and only read afterwards.

use std::fmt;
use std::time::Duration;

use bigdecimal::BigDecimal;
use serde::Serialize;

// ============================================================================
// PLAN ROOT
// ============================================================================

/// Everything a plan file asks the harness to verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestPlan {
    /// Registry name of the collector under test.
    pub collector_name: String,
    /// Opaque target string handed to the collector unmodified.
    pub connection_string: String,
    /// Expected schema shape; `None` skips the schema check.
    pub schema: Option<SchemaExpectation>,
    pub collect_samples: Vec<CollectSampleCheck>,
    pub random_samples: Vec<RandomSampleCheck>,
    pub metrics: Vec<MetricsCheck>,
    pub load_tests: Vec<LoadTestCheck>,
}

impl TestPlan {
    /// Creates a plan with no checks configured.
    pub fn new(collector_name: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            collector_name: collector_name.into(),
            connection_string: connection_string.into(),
            schema: None,
            collect_samples: Vec::new(),
            random_samples: Vec::new(),
            metrics: Vec::new(),
            load_tests: Vec::new(),
        }
    }

    /// Returns the load test at `index`, if the plan defines one.
    pub fn load_test(&self, index: usize) -> Option<&LoadTestCheck> {
        self.load_tests.get(index)
    }

    /// Number of configured check records, the schema expectation included.
    pub fn record_count(&self) -> usize {
        usize::from(self.schema.is_some())
            + self.collect_samples.len()
            + self.random_samples.len()
            + self.metrics.len()
            + self.load_tests.len()
    }
}

// ============================================================================
// CHECK RECORDS
// ============================================================================

/// Expected counts reported by `get_schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaExpectation {
    pub table_count: usize,
    pub entity_count: usize,
}

/// A sample of exactly `sample_size` values that must contain every expected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectSampleCheck {
    pub collection: String,
    pub entity: String,
    pub sample_size: usize,
    /// May be empty, in which case only the sample size is asserted.
    pub expected_values: Vec<String>,
}

/// Three samples of the same size that must not all be identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RandomSampleCheck {
    pub collection: String,
    pub entity: String,
    pub sample_size: usize,
}

/// Expected storage metrics for one data collection.
///
/// Reported sizes are rounded to the precision of the plan literal before
/// they are compared, so `5.1` in the plan accepts anything that rounds to
/// `5.1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsCheck {
    pub collection: String,
    pub row_count: i64,
    pub total_size: BigDecimal,
    pub total_size_precision: u32,
    pub used_size: BigDecimal,
    pub used_size_precision: u32,
}

/// Sampling run executed in a child process under memory and time budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadTestCheck {
    pub collection: String,
    pub entity: String,
    pub sample_size: usize,
    /// Resident memory ceiling in MB; 0 is unbounded.
    pub max_memory_mb: u64,
    /// Wall-clock ceiling in seconds; 0 is unbounded.
    pub max_run_time_sec: u64,
}

impl LoadTestCheck {
    pub fn memory_budget_mb(&self) -> Option<u64> {
        (self.max_memory_mb > 0).then_some(self.max_memory_mb)
    }

    pub fn run_time_budget(&self) -> Option<Duration> {
        (self.max_run_time_sec > 0).then(|| Duration::from_secs(self.max_run_time_sec))
    }
}

// ============================================================================
// RECORD KINDS
// ============================================================================

/// The record kinds a plan line can select with its first field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    GetSchema,
    CollectSample,
    RandomSample,
    DataCollectionMetrics,
    LoadTest,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::GetSchema,
        RecordKind::CollectSample,
        RecordKind::RandomSample,
        RecordKind::DataCollectionMetrics,
        RecordKind::LoadTest,
    ];

    /// Resolves a record tag, ignoring case and surrounding whitespace.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
    }

    /// The canonical lower-case tag.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordKind::GetSchema => "getschema",
            RecordKind::CollectSample => "collectsample",
            RecordKind::RandomSample => "randomsample",
            RecordKind::DataCollectionMetrics => "datacollectionmetrics",
            RecordKind::LoadTest => "loadtest",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
