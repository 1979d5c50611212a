//! Line-oriented plan parser.
//!
//! Blank lines and `#` comments are skipped and do not count as positions.
//! The first remaining line is the collector name, the second the connection
//! string, every further line a `|`-delimited record. Unknown record kinds
//! are skipped so newer plans keep working with older harness builds.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;
use tracing::{debug, warn};

use super::model::{
    CollectSampleCheck, LoadTestCheck, MetricsCheck, RandomSampleCheck, RecordKind,
    SchemaExpectation, TestPlan,
};
use crate::errors::{HarnessError, HarnessResult};

/// Plan file used when none is given on the command line.
pub const DEFAULT_PLAN_FILE: &str = "test_harness.config";

const FIELD_SEPARATOR: char = '|';
const COMMENT_PREFIX: char = '#';

// ============================================================================
// ERRORS
// ============================================================================

/// Identifies a record by kind and 1-based position among records of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRef {
    pub kind: RecordKind,
    pub occurrence: usize,
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} record #{}", self.kind, self.occurrence)
    }
}

/// The plan text violates the grammar.
#[derive(Debug, Error, Diagnostic)]
#[error("malformed plan at line {line}{}: {reason}", describe_record(.record))]
#[diagnostic(code(harness::plan::malformed))]
pub struct MalformedPlan {
    /// 1-based physical line number, comments included.
    pub line: usize,
    /// The offending record, when the failure is inside one.
    pub record: Option<RecordRef>,
    pub reason: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("offending line")]
    span: SourceSpan,
}

fn describe_record(record: &Option<RecordRef>) -> String {
    record.map(|r| format!(" ({r})")).unwrap_or_default()
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Reads and parses the plan file at `path`.
pub fn load_plan(path: &Path) -> HarnessResult<TestPlan> {
    let text = fs::read_to_string(path).map_err(|source| HarnessError::PlanUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let plan = parse_plan(&text, &path.display().to_string())?;
    Ok(plan)
}

/// Parses plan text. `source_name` only labels diagnostics.
pub fn parse_plan(text: &str, source_name: &str) -> Result<TestPlan, MalformedPlan> {
    PlanParser::new(text, source_name).parse()
}

// ============================================================================
// PARSER
// ============================================================================

/// One physical line of the plan with its position.
struct PlanLine<'a> {
    number: usize,
    content: &'a str,
    span: SourceSpan,
}

impl PlanLine<'_> {
    fn is_comment(&self) -> bool {
        let trimmed = self.content.trim();
        trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX)
    }
}

fn plan_lines(text: &str) -> impl Iterator<Item = PlanLine<'_>> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .enumerate()
        .map(move |(index, raw)| {
            let start = offset;
            offset += raw.len();
            let content = raw.strip_suffix('\n').unwrap_or(raw);
            let content = content.strip_suffix('\r').unwrap_or(content);
            PlanLine {
                number: index + 1,
                content,
                span: (start, content.len()).into(),
            }
        })
}

struct PlanParser<'a> {
    text: &'a str,
    source_name: &'a str,
    occurrences: HashMap<RecordKind, usize>,
}

impl<'a> PlanParser<'a> {
    fn new(text: &'a str, source_name: &'a str) -> Self {
        Self {
            text,
            source_name,
            occurrences: HashMap::new(),
        }
    }

    fn parse(mut self) -> Result<TestPlan, MalformedPlan> {
        let mut lines = plan_lines(self.text).filter(|line| !line.is_comment());

        let name_line = lines
            .next()
            .ok_or_else(|| self.error_at_end("expected the collector name on the first line"))?;
        let conn_line = lines.next().ok_or_else(|| {
            self.error_at_end("expected the connection string on the line after the collector name")
        })?;
        let mut plan = TestPlan::new(name_line.content.trim(), conn_line.content);

        for line in lines {
            self.parse_record(&line, &mut plan)?;
        }

        debug!(
            collector = %plan.collector_name,
            records = plan.record_count(),
            "parsed plan {}",
            self.source_name
        );
        Ok(plan)
    }

    fn parse_record(&mut self, line: &PlanLine<'_>, plan: &mut TestPlan) -> Result<(), MalformedPlan> {
        let mut parts = line.content.split(FIELD_SEPARATOR);
        let tag = parts.next().unwrap_or_default();
        let Some(kind) = RecordKind::from_tag(tag) else {
            warn!(line = line.number, tag = tag.trim(), "skipping unknown plan record");
            return Ok(());
        };

        let occurrence = self.occurrences.entry(kind).or_insert(0);
        *occurrence += 1;
        let record = RecordRef {
            kind,
            occurrence: *occurrence,
        };
        let fields = Fields {
            values: parts.collect(),
        };

        let applied = match kind {
            RecordKind::GetSchema => fields.schema().map(|schema| plan.schema = Some(schema)),
            RecordKind::CollectSample => fields
                .collect_sample()
                .map(|check| plan.collect_samples.push(check)),
            RecordKind::RandomSample => fields
                .random_sample()
                .map(|check| plan.random_samples.push(check)),
            RecordKind::DataCollectionMetrics => {
                fields.metrics().map(|check| plan.metrics.push(check))
            }
            RecordKind::LoadTest => fields.load_test().map(|check| plan.load_tests.push(check)),
        };
        applied.map_err(|reason| self.error(line.number, line.span, Some(record), reason))
    }

    fn error(
        &self,
        line: usize,
        span: SourceSpan,
        record: Option<RecordRef>,
        reason: String,
    ) -> MalformedPlan {
        MalformedPlan {
            line,
            record,
            reason,
            src: NamedSource::new(self.source_name, self.text.to_string()),
            span,
        }
    }

    fn error_at_end(&self, reason: &str) -> MalformedPlan {
        let line = self.text.lines().count().max(1);
        self.error(line, (self.text.len(), 0).into(), None, reason.to_string())
    }
}

// ============================================================================
// FIELD ACCESS
// ============================================================================

/// The fields of a record after its kind tag. Index 0 is plan field 2.
struct Fields<'a> {
    values: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn raw(&self, index: usize, name: &str) -> Result<&'a str, String> {
        self.values
            .get(index)
            .copied()
            .map(str::trim)
            .ok_or_else(|| format!("missing field {} ({name})", index + 2))
    }

    fn name(&self, index: usize, what: &str) -> Result<String, String> {
        let value = self.raw(index, what)?;
        if value.is_empty() {
            return Err(format!("field {} ({what}) is empty", index + 2));
        }
        Ok(value.to_string())
    }

    fn number<T: FromStr>(&self, index: usize, what: &str, expects: &str) -> Result<T, String> {
        let value = self.raw(index, what)?;
        value
            .parse()
            .map_err(|_| format!("field {} ({what}) expects {expects}, found '{value}'", index + 2))
    }

    fn count(&self, index: usize, what: &str) -> Result<usize, String> {
        self.number(index, what, "a non-negative integer")
    }

    fn budget(&self, index: usize, what: &str) -> Result<u64, String> {
        self.number(index, what, "a non-negative integer (0 for unbounded)")
    }

    fn decimal(&self, index: usize, what: &str) -> Result<(BigDecimal, u32), String> {
        let value = self.raw(index, what)?;
        let invalid = || format!("field {} ({what}) expects a decimal number, found '{value}'", index + 2);
        if !is_plain_decimal(value) {
            return Err(invalid());
        }
        let parsed = BigDecimal::from_str(value).map_err(|_| invalid())?;
        Ok((parsed, precision_of(value)))
    }

    fn rest(&self, index: usize) -> Vec<String> {
        self.values
            .iter()
            .skip(index)
            .map(|value| value.trim().to_string())
            .collect()
    }

    fn schema(&self) -> Result<SchemaExpectation, String> {
        Ok(SchemaExpectation {
            table_count: self.count(0, "table count")?,
            entity_count: self.count(1, "entity count")?,
        })
    }

    fn collect_sample(&self) -> Result<CollectSampleCheck, String> {
        Ok(CollectSampleCheck {
            collection: self.name(0, "collection")?,
            entity: self.name(1, "entity")?,
            sample_size: self.count(2, "sample size")?,
            expected_values: self.rest(3),
        })
    }

    fn random_sample(&self) -> Result<RandomSampleCheck, String> {
        Ok(RandomSampleCheck {
            collection: self.name(0, "collection")?,
            entity: self.name(1, "entity")?,
            sample_size: self.count(2, "sample size")?,
        })
    }

    fn metrics(&self) -> Result<MetricsCheck, String> {
        let collection = self.name(0, "collection")?;
        let row_count = self.number(1, "row count", "an integer")?;
        let (total_size, total_size_precision) = self.decimal(2, "total size")?;
        let (used_size, used_size_precision) = self.decimal(3, "used size")?;
        Ok(MetricsCheck {
            collection,
            row_count,
            total_size,
            total_size_precision,
            used_size,
            used_size_precision,
        })
    }

    fn load_test(&self) -> Result<LoadTestCheck, String> {
        Ok(LoadTestCheck {
            collection: self.name(0, "collection")?,
            entity: self.name(1, "entity")?,
            sample_size: self.count(2, "sample size")?,
            max_memory_mb: self.budget(3, "max memory MB")?,
            max_run_time_sec: self.budget(4, "max run time seconds")?,
        })
    }
}

/// Accepts `[+-]digits[.digits]`; exponent notation is rejected so the
/// precision read from the literal always matches its value.
fn is_plain_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix(|c| c == '+' || c == '-').unwrap_or(text);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    !(whole.is_empty() && fraction.is_empty()) && all_digits(whole) && all_digits(fraction)
}

/// Number of characters after the first `.` of a literal, 0 without one.
pub(crate) fn precision_of(literal: &str) -> u32 {
    literal
        .split_once('.')
        .map_or(0, |(_, fraction)| u32::try_from(fraction.chars().count()).unwrap_or(u32::MAX))
}
