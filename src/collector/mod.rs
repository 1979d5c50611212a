//! The collector contract.
//!
//! A collector is the pluggable component under test. The harness only talks
//! to it through the [`Collector`] trait and the data types in this module.
//! Collectors are resolved by name from a [`CollectorRegistry`].

use std::io;
use std::path::PathBuf;

use bigdecimal::BigDecimal;
use thiserror::Error;

pub mod csv;
pub mod registry;

pub use registry::{build_default_registry, CollectorFactory, CollectorRegistry};

// ============================================================================
// CONTRACT
// ============================================================================

/// Capabilities every collector must provide.
///
/// Calls are issued one at a time from a single thread, in the order the
/// assertion engine runs its checks.
pub trait Collector {
    /// Names of the data store types this collector understands.
    fn data_store_types(&self) -> Vec<String>;

    /// Whether the store behind `container` is reachable.
    fn test_connection(&self, container: &DataContainer) -> Result<bool, CollectorError>;

    /// Tables and entities (columns, fields) of the store.
    fn get_schema(&self, container: &DataContainer) -> Result<Schema, CollectorError>;

    /// Up to `sample_size` values of `entity`; a conforming collector
    /// returns exactly `sample_size` values when the store holds enough.
    fn collect_sample(
        &self,
        entity: &DataEntity,
        sample_size: usize,
    ) -> Result<Vec<String>, CollectorError>;

    /// Row counts and storage sizes for every data collection.
    fn collection_metrics(
        &self,
        container: &DataContainer,
    ) -> Result<Vec<CollectionMetrics>, CollectorError>;
}

/// Failure reported by a collector call.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unknown data collection '{0}'")]
    UnknownCollection(String),
    #[error("data collection name '{0}' is not a plain name")]
    InvalidCollectionName(String),
    #[error("unknown data entity '{collection}.{entity}'")]
    UnknownEntity { collection: String, entity: String },
    #[error("{0}")]
    Other(String),
}

// ============================================================================
// DATA TYPES
// ============================================================================

/// The store a collector connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataContainer {
    /// Opaque, collector-specific target description.
    pub connection_string: String,
}

impl DataContainer {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }
}

/// A table, file or other grouping of entities inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCollection {
    pub container: DataContainer,
    pub name: String,
}

impl DataCollection {
    pub fn new(container: DataContainer, name: impl Into<String>) -> Self {
        Self {
            container,
            name: name.into(),
        }
    }
}

/// Declared value type of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Unknown,
}

/// A column or field whose values can be sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntity {
    pub name: String,
    pub data_type: DataType,
    /// Type name as the store reports it.
    pub db_data_type: String,
    pub collection: DataCollection,
}

impl DataEntity {
    pub fn new(
        collection: DataCollection,
        name: impl Into<String>,
        data_type: DataType,
        db_data_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            db_data_type: db_data_type.into(),
            collection,
        }
    }

    /// Entity handle the harness builds from plan records, which carry names only.
    pub fn named(container: &DataContainer, collection: &str, name: &str) -> Self {
        let collection = DataCollection::new(container.clone(), collection);
        Self::new(collection, name, DataType::String, "string")
    }

    pub fn container(&self) -> &DataContainer {
        &self.collection.container
    }
}

/// Result of [`Collector::get_schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub tables: Vec<DataCollection>,
    pub entities: Vec<DataEntity>,
}

/// Storage metrics of one data collection. Sizes are in KB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionMetrics {
    pub name: String,
    pub row_count: i64,
    pub used_space_kb: BigDecimal,
    pub total_space_kb: BigDecimal,
}
