//! Canonical plan text.
//!
//! Rendering a [`TestPlan`] produces text that [`super::parse_plan`] reads
//! back into an identical plan. Records are emitted grouped by kind in the
//! order the assertion engine runs them.

use std::fmt;

use bigdecimal::BigDecimal;

use super::model::{RecordKind, TestPlan};

const SEP: char = '|';

impl fmt::Display for TestPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.collector_name)?;
        writeln!(f, "{}", self.connection_string)?;

        if let Some(schema) = &self.schema {
            writeln!(
                f,
                "{}{SEP}{}{SEP}{}",
                RecordKind::GetSchema,
                schema.table_count,
                schema.entity_count
            )?;
        }
        for check in &self.collect_samples {
            write!(
                f,
                "{}{SEP}{}{SEP}{}{SEP}{}",
                RecordKind::CollectSample,
                check.collection,
                check.entity,
                check.sample_size
            )?;
            for value in &check.expected_values {
                write!(f, "{SEP}{value}")?;
            }
            writeln!(f)?;
        }
        for check in &self.random_samples {
            writeln!(
                f,
                "{}{SEP}{}{SEP}{}{SEP}{}",
                RecordKind::RandomSample,
                check.collection,
                check.entity,
                check.sample_size
            )?;
        }
        for check in &self.metrics {
            writeln!(
                f,
                "{}{SEP}{}{SEP}{}{SEP}{}{SEP}{}",
                RecordKind::DataCollectionMetrics,
                check.collection,
                check.row_count,
                literal(&check.total_size, check.total_size_precision),
                literal(&check.used_size, check.used_size_precision)
            )?;
        }
        for check in &self.load_tests {
            writeln!(
                f,
                "{}{SEP}{}{SEP}{}{SEP}{}{SEP}{}{SEP}{}",
                RecordKind::LoadTest,
                check.collection,
                check.entity,
                check.sample_size,
                check.max_memory_mb,
                check.max_run_time_sec
            )?;
        }
        Ok(())
    }
}

/// Renders a decimal in fixed-point form with exactly `precision` fractional
/// digits. `Display` on `BigDecimal` switches to exponent notation for small
/// values, which plan text does not accept.
fn literal(value: &BigDecimal, precision: u32) -> String {
    let (unscaled, _) = value.with_scale(i64::from(precision)).as_bigint_and_exponent();
    let text = unscaled.to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", text.as_str()),
    };

    let scale = precision as usize;
    if scale == 0 {
        return format!("{sign}{digits}");
    }
    let digits = format!("{digits:0>width$}", width = scale + 1);
    let (whole, fraction) = digits.split_at(digits.len() - scale);
    format!("{sign}{whole}.{fraction}")
}
