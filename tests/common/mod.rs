//! # Shared test fixtures
//!
//! A scriptable in-memory collector that records every call it receives.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use collector_harness::collector::{
    CollectionMetrics, Collector, CollectorError, DataCollection, DataContainer, DataEntity,
    DataType, Schema,
};
use collector_harness::plan::{parse_plan, TestPlan};

/// Collector whose answers are set up by the test.
#[derive(Debug, Default)]
pub struct StubCollector {
    pub store_types: Vec<String>,
    pub connects: bool,
    pub tables: usize,
    pub entities: usize,
    /// Draws returned by successive `collect_sample` calls; the last one repeats.
    pub draws: RefCell<VecDeque<Vec<String>>>,
    pub metrics: Vec<CollectionMetrics>,
    pub calls: RefCell<Vec<String>>,
}

impl StubCollector {
    /// A collector that passes capability and connectivity checks.
    pub fn healthy() -> Self {
        Self {
            store_types: vec!["STUB".to_string()],
            connects: true,
            ..Self::default()
        }
    }

    pub fn with_schema(mut self, tables: usize, entities: usize) -> Self {
        self.tables = tables;
        self.entities = entities;
        self
    }

    pub fn with_draws(self, draws: &[&[&str]]) -> Self {
        *self.draws.borrow_mut() = draws
            .iter()
            .map(|draw| draw.iter().map(|v| v.to_string()).collect())
            .collect();
        self
    }

    pub fn with_metric(mut self, name: &str, rows: i64, used_kb: &str, total_kb: &str) -> Self {
        self.metrics.push(CollectionMetrics {
            name: name.to_string(),
            row_count: rows,
            used_space_kb: decimal(used_kb),
            total_space_kb: decimal(total_kb),
        });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, operation: &str) -> bool {
        self.calls.borrow().iter().any(|call| call == operation)
    }

    fn record(&self, operation: &str) {
        self.calls.borrow_mut().push(operation.to_string());
    }
}

impl Collector for StubCollector {
    fn data_store_types(&self) -> Vec<String> {
        self.record("data_store_types");
        self.store_types.clone()
    }

    fn test_connection(&self, _container: &DataContainer) -> Result<bool, CollectorError> {
        self.record("test_connection");
        Ok(self.connects)
    }

    fn get_schema(&self, container: &DataContainer) -> Result<Schema, CollectorError> {
        self.record("get_schema");
        let tables: Vec<DataCollection> = (0..self.tables)
            .map(|i| DataCollection::new(container.clone(), format!("t{i}")))
            .collect();
        let entities = (0..self.entities)
            .map(|i| {
                let owner = DataCollection::new(container.clone(), "t0");
                DataEntity::new(owner, format!("e{i}"), DataType::String, "text")
            })
            .collect();
        Ok(Schema { tables, entities })
    }

    fn collect_sample(
        &self,
        _entity: &DataEntity,
        _sample_size: usize,
    ) -> Result<Vec<String>, CollectorError> {
        self.record("collect_sample");
        let mut draws = self.draws.borrow_mut();
        let draw = if draws.len() > 1 {
            draws.pop_front()
        } else {
            draws.front().cloned()
        };
        draw.ok_or_else(|| CollectorError::Other("no sample scripted".to_string()))
    }

    fn collection_metrics(
        &self,
        _container: &DataContainer,
    ) -> Result<Vec<CollectionMetrics>, CollectorError> {
        self.record("collection_metrics");
        Ok(self.metrics.clone())
    }
}

pub fn decimal(text: &str) -> BigDecimal {
    BigDecimal::from_str(text).unwrap()
}

/// Parses a plan for the stub collector; `records` follow the header lines.
pub fn stub_plan(records: &str) -> TestPlan {
    parse_plan(&format!("StubCollector\nstub://memory\n{records}"), "test").unwrap()
}
