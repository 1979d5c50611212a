//! Collector resolution by name.
//!
//! The registry maps the collector name written in a plan to a factory that
//! builds a fresh instance. The default registry holds the collectors that
//! ship with the harness; a collector crate builds its own registry and
//! hands it to [`crate::cli::run_with_registry`].
//!
//! ## Usage
//! ```rust
//! use collector_harness::collector::build_default_registry;
//! let registry = build_default_registry();
//! assert!(registry.contains("CsvCollector"));
//! let collector = registry.resolve("CsvCollector").unwrap();
//! assert_eq!(collector.data_store_types(), vec!["CSV".to_string()]);
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use super::csv;
use super::Collector;
use crate::errors::{HarnessError, HarnessResult};

/// Builds a new collector instance.
pub type CollectorFactory = fn() -> Box<dyn Collector>;

/// Name to factory table, iterated in name order.
#[derive(Debug, Default, Clone)]
pub struct CollectorRegistry {
    factories: BTreeMap<String, CollectorFactory>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, returning the factory it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: CollectorFactory,
    ) -> Option<CollectorFactory> {
        self.factories.insert(name.into(), factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiates the collector registered under `name` (exact match).
    ///
    /// # Errors
    /// Returns [`HarnessError::PluginUnavailable`] for an unregistered name.
    pub fn resolve(&self, name: &str) -> HarnessResult<Box<dyn Collector>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| HarnessError::plugin_unavailable(name, self.names()))?;
        debug!(collector = name, "instantiating collector");
        Ok(factory())
    }
}

/// Registry holding every collector bundled with the harness.
pub fn build_default_registry() -> CollectorRegistry {
    let mut registry = CollectorRegistry::new();
    registry.register(csv::NAME, csv::factory);
    registry
}
