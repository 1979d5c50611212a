//! Conformance violations reported by the assertion engine.

use std::fmt;

use bigdecimal::BigDecimal;
use miette::Diagnostic;
use thiserror::Error;

use crate::collector::CollectorError;

/// The step of the assertion sequence a violation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Capability,
    Connectivity,
    Schema,
    CollectSample,
    RandomSample,
    Metrics,
}

impl CheckKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::Capability => "capability",
            CheckKind::Connectivity => "connectivity",
            CheckKind::Schema => "schema",
            CheckKind::CollectSample => "collect sample",
            CheckKind::RandomSample => "random sample",
            CheckKind::Metrics => "metrics",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which reported size a metrics violation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMeasure {
    Used,
    Total,
}

impl fmt::Display for SizeMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeMeasure::Used => f.write_str("used size"),
            SizeMeasure::Total => f.write_str("total size"),
        }
    }
}

/// A collector behaved differently from what the plan expects.
#[derive(Debug, Error, Diagnostic)]
pub enum Violation {
    #[error("[{}] no data store types reported", CheckKind::Capability)]
    #[diagnostic(
        code(harness::conformance::no_store_types),
        help("a collector must report at least one supported data store type")
    )]
    NoStoreTypes,

    #[error("[{}] could not connect to data store using '{connection_string}'", CheckKind::Connectivity)]
    #[diagnostic(code(harness::conformance::connection))]
    ConnectionFailed { connection_string: String },

    #[error("[{}] table count ({actual}) does not match the expected value of {expected}", CheckKind::Schema)]
    #[diagnostic(code(harness::conformance::table_count))]
    TableCount { actual: usize, expected: usize },

    #[error("[{}] entity count ({actual}) does not match the expected value of {expected}", CheckKind::Schema)]
    #[diagnostic(code(harness::conformance::entity_count))]
    EntityCount { actual: usize, expected: usize },

    #[error("[{check}] the number of samples ({actual}) from '{collection}.{entity}' does not match the expected value of {expected}")]
    #[diagnostic(code(harness::conformance::sample_size))]
    SampleSize {
        check: CheckKind,
        collection: String,
        entity: String,
        actual: usize,
        expected: usize,
    },

    #[error("[{}] the sample value '{value}' was not found in the samples from '{collection}.{entity}'", CheckKind::CollectSample)]
    #[diagnostic(code(harness::conformance::missing_value))]
    MissingSampleValue {
        collection: String,
        entity: String,
        value: String,
        #[help]
        preview: Option<String>,
    },

    #[error("[{}] samples from '{collection}.{entity}' are equal after {attempts} read attempts", CheckKind::RandomSample)]
    #[diagnostic(
        code(harness::conformance::not_random),
        help("collect_sample must pick a different subset on repeated calls")
    )]
    SamplesNotRandom {
        collection: String,
        entity: String,
        attempts: usize,
    },

    #[error("[{}] metric for data collection '{collection}' is not found", CheckKind::Metrics)]
    #[diagnostic(code(harness::conformance::metric_missing))]
    MetricMissing {
        collection: String,
        #[help]
        reported: Option<String>,
    },

    #[error("[{}] row count for '{collection}' ({actual}) does not match the expected value of {expected}", CheckKind::Metrics)]
    #[diagnostic(code(harness::conformance::row_count))]
    RowCount {
        collection: String,
        actual: i64,
        expected: i64,
    },

    #[error("[{}] {measure} for '{collection}' ({rounded}, rounded from {reported}) does not match the expected value of {expected}", CheckKind::Metrics)]
    #[diagnostic(code(harness::conformance::size))]
    SizeMismatch {
        measure: SizeMeasure,
        collection: String,
        rounded: BigDecimal,
        reported: BigDecimal,
        expected: BigDecimal,
    },

    #[error("[{check}] collector call {operation} failed")]
    #[diagnostic(code(harness::conformance::collector_error))]
    CollectorFailed {
        check: CheckKind,
        operation: &'static str,
        #[source]
        source: CollectorError,
    },
}

impl Violation {
    /// The step of the assertion sequence that failed.
    pub fn check(&self) -> CheckKind {
        match self {
            Violation::NoStoreTypes => CheckKind::Capability,
            Violation::ConnectionFailed { .. } => CheckKind::Connectivity,
            Violation::TableCount { .. } | Violation::EntityCount { .. } => CheckKind::Schema,
            Violation::SampleSize { check, .. } | Violation::CollectorFailed { check, .. } => {
                *check
            }
            Violation::MissingSampleValue { .. } => CheckKind::CollectSample,
            Violation::SamplesNotRandom { .. } => CheckKind::RandomSample,
            Violation::MetricMissing { .. }
            | Violation::RowCount { .. }
            | Violation::SizeMismatch { .. } => CheckKind::Metrics,
        }
    }
}
