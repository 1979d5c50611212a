//! The ordered conformance checks.
//!
//! [`AssertionEngine::run`] drives a collector through the plan in a fixed
//! order and stops at the first [`Violation`]:
//!
//! 1. capability: at least one data store type is reported
//! 2. connectivity: `test_connection` succeeds
//! 3. schema: table and entity counts match (skipped without expectation)
//! 4. deterministic sampling: sizes match and expected values are present
//! 5. non-determinism: repeated samples are not all the same set
//! 6. metrics: row counts and rounded sizes match
//!
//! Steps with nothing configured are reported as skipped.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::cli::output::{Outcome, OutputSink};
use crate::collector::{Collector, CollectorError, DataContainer, DataEntity};
use crate::plan::{
    CollectSampleCheck, MetricsCheck, RandomSampleCheck, SchemaExpectation, TestPlan,
};

pub mod rounding;
pub mod violation;

pub use rounding::round_half_even;
pub use violation::{CheckKind, SizeMeasure, Violation};

/// Number of draws the non-determinism check makes per record.
pub const RANDOM_SAMPLE_ATTEMPTS: usize = 3;

const MISSING_VALUE_PREVIEW: usize = 10;

type CheckResult = Result<(), Violation>;

/// Runs the conformance checks of one plan against one collector.
pub struct AssertionEngine<'a> {
    collector: &'a dyn Collector,
    plan: &'a TestPlan,
    container: DataContainer,
}

impl<'a> AssertionEngine<'a> {
    pub fn new(collector: &'a dyn Collector, plan: &'a TestPlan) -> Self {
        Self {
            collector,
            plan,
            container: DataContainer::new(plan.connection_string.clone()),
        }
    }

    /// Runs every check in order, returning the first violation.
    pub fn run(&self, out: &mut dyn OutputSink) -> CheckResult {
        self.check_store_types(out)?;
        self.check_connection(out)?;
        self.check_schema(out)?;
        self.check_collect_samples(out)?;
        self.check_random_samples(out)?;
        self.check_metrics(out)?;
        info!(collector = %self.plan.collector_name, "core checks passed");
        Ok(())
    }

    // ========================================================================
    // CHECKS
    // ========================================================================

    pub fn check_store_types(&self, out: &mut dyn OutputSink) -> CheckResult {
        let types = self.collector.data_store_types();
        if types.is_empty() {
            return Err(Violation::NoStoreTypes);
        }
        out.emit(if types.len() == 1 {
            "Data store type supported:"
        } else {
            "Data store types supported:"
        });
        for store_type in &types {
            out.emit(store_type);
        }
        out.emit("");
        Ok(())
    }

    pub fn check_connection(&self, out: &mut dyn OutputSink) -> CheckResult {
        let connected = self
            .collector
            .test_connection(&self.container)
            .map_err(|source| collector_failed(CheckKind::Connectivity, "test_connection", source))?;
        if !connected {
            return Err(Violation::ConnectionFailed {
                connection_string: self.container.connection_string.clone(),
            });
        }
        out.emit("Connection to data store succeeded");
        out.emit("");
        Ok(())
    }

    pub fn check_schema(&self, out: &mut dyn OutputSink) -> CheckResult {
        const STEP: &str = "Testing get_schema()";
        let Some(SchemaExpectation {
            table_count,
            entity_count,
        }) = self.plan.schema
        else {
            out.outcome(STEP, Outcome::Skipped);
            return Ok(());
        };

        let schema = self
            .collector
            .get_schema(&self.container)
            .map_err(|source| collector_failed(CheckKind::Schema, "get_schema", source))?;
        debug!(
            tables = schema.tables.len(),
            entities = schema.entities.len(),
            "schema reported"
        );
        if schema.tables.len() != table_count {
            return Err(Violation::TableCount {
                actual: schema.tables.len(),
                expected: table_count,
            });
        }
        if schema.entities.len() != entity_count {
            return Err(Violation::EntityCount {
                actual: schema.entities.len(),
                expected: entity_count,
            });
        }
        out.outcome(STEP, Outcome::Success);
        Ok(())
    }

    pub fn check_collect_samples(&self, out: &mut dyn OutputSink) -> CheckResult {
        const STEP: &str = "Testing collect_sample()";
        if self.plan.collect_samples.is_empty() {
            out.outcome(STEP, Outcome::Skipped);
            return Ok(());
        }
        for check in &self.plan.collect_samples {
            self.check_collect_sample(check)?;
        }
        out.outcome(STEP, Outcome::Success);
        Ok(())
    }

    fn check_collect_sample(&self, check: &CollectSampleCheck) -> CheckResult {
        let entity = self.entity(&check.collection, &check.entity);
        let samples = self.sample(CheckKind::CollectSample, &entity, check.sample_size)?;

        // Containment only: neither order nor multiplicity matters.
        if let Some(missing) = check
            .expected_values
            .iter()
            .find(|value| !samples.contains(value))
        {
            return Err(Violation::MissingSampleValue {
                collection: check.collection.clone(),
                entity: check.entity.clone(),
                value: missing.clone(),
                preview: preview(&samples),
            });
        }
        Ok(())
    }

    pub fn check_random_samples(&self, out: &mut dyn OutputSink) -> CheckResult {
        const STEP: &str = "Testing collect_sample() - random sampling method";
        if self.plan.random_samples.is_empty() {
            out.outcome(STEP, Outcome::Skipped);
            return Ok(());
        }
        for check in &self.plan.random_samples {
            self.check_random_sample(check)?;
        }
        out.outcome(STEP, Outcome::Success);
        Ok(())
    }

    fn check_random_sample(&self, check: &RandomSampleCheck) -> CheckResult {
        let entity = self.entity(&check.collection, &check.entity);
        let mut draws = Vec::with_capacity(RANDOM_SAMPLE_ATTEMPTS);
        for _ in 0..RANDOM_SAMPLE_ATTEMPTS {
            draws.push(self.sample(CheckKind::RandomSample, &entity, check.sample_size)?);
        }

        let sets: Vec<BTreeSet<&str>> = draws
            .iter()
            .map(|draw| draw.iter().map(String::as_str).collect())
            .collect();
        if sets.windows(2).all(|pair| pair[0] == pair[1]) {
            return Err(Violation::SamplesNotRandom {
                collection: check.collection.clone(),
                entity: check.entity.clone(),
                attempts: RANDOM_SAMPLE_ATTEMPTS,
            });
        }
        Ok(())
    }

    pub fn check_metrics(&self, out: &mut dyn OutputSink) -> CheckResult {
        const STEP: &str = "Testing collection_metrics()";
        if self.plan.metrics.is_empty() {
            out.outcome(STEP, Outcome::Skipped);
            return Ok(());
        }

        let metrics = self
            .collector
            .collection_metrics(&self.container)
            .map_err(|source| collector_failed(CheckKind::Metrics, "collection_metrics", source))?;
        for check in &self.plan.metrics {
            let Some(metric) = metrics.iter().find(|m| m.name == check.collection) else {
                let names: Vec<&str> = metrics.iter().map(|m| m.name.as_str()).collect();
                return Err(Violation::MetricMissing {
                    collection: check.collection.clone(),
                    reported: (!names.is_empty())
                        .then(|| format!("reported collections: {}", names.join(", "))),
                });
            };
            if metric.row_count != check.row_count {
                return Err(Violation::RowCount {
                    collection: check.collection.clone(),
                    actual: metric.row_count,
                    expected: check.row_count,
                });
            }
            compare_size(check, SizeMeasure::Used, &metric.used_space_kb)?;
            compare_size(check, SizeMeasure::Total, &metric.total_space_kb)?;
        }
        out.outcome(STEP, Outcome::Success);
        Ok(())
    }

    // ========================================================================
    // PRIVATE HELPERS
    // ========================================================================

    fn entity(&self, collection: &str, entity: &str) -> DataEntity {
        DataEntity::named(&self.container, collection, entity)
    }

    /// One `collect_sample` call whose length must equal `expected`.
    fn sample(
        &self,
        check: CheckKind,
        entity: &DataEntity,
        expected: usize,
    ) -> Result<Vec<String>, Violation> {
        let samples = self
            .collector
            .collect_sample(entity, expected)
            .map_err(|source| collector_failed(check, "collect_sample", source))?;
        debug!(
            %check,
            collection = %entity.collection.name,
            entity = %entity.name,
            count = samples.len(),
            "sample collected"
        );
        if samples.len() != expected {
            return Err(Violation::SampleSize {
                check,
                collection: entity.collection.name.clone(),
                entity: entity.name.clone(),
                actual: samples.len(),
                expected,
            });
        }
        Ok(samples)
    }
}

fn compare_size(
    check: &MetricsCheck,
    measure: SizeMeasure,
    reported: &bigdecimal::BigDecimal,
) -> CheckResult {
    let (expected, precision) = match measure {
        SizeMeasure::Used => (&check.used_size, check.used_size_precision),
        SizeMeasure::Total => (&check.total_size, check.total_size_precision),
    };
    let rounded = round_half_even(reported, precision);
    if &rounded != expected {
        return Err(Violation::SizeMismatch {
            measure,
            collection: check.collection.clone(),
            rounded,
            reported: reported.clone(),
            expected: expected.clone(),
        });
    }
    Ok(())
}

fn collector_failed(check: CheckKind, operation: &'static str, source: CollectorError) -> Violation {
    Violation::CollectorFailed {
        check,
        operation,
        source,
    }
}

fn preview(samples: &[String]) -> Option<String> {
    if samples.is_empty() {
        return None;
    }
    let shown: Vec<&str> = samples
        .iter()
        .take(MISSING_VALUE_PREVIEW)
        .map(String::as_str)
        .collect();
    let more = samples.len().saturating_sub(shown.len());
    Some(if more > 0 {
        format!("sample was: {} (and {more} more)", shown.join(", "))
    } else {
        format!("sample was: {}", shown.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_samples() {
        let samples: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        let text = preview(&samples).unwrap();
        assert!(text.ends_with("8, 9 (and 2 more)"));
        assert_eq!(preview(&[]), None);
    }
}
