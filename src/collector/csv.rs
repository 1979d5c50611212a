//! Reference collector over a directory of CSV files.
//!
//! The connection string is a directory path. Every `*.csv` file in it is a
//! data collection named after the file stem, and every header column is an
//! entity. Fields are split on `,`; quoted fields are not supported.

use std::fs;
use std::path::{Path, PathBuf};

use bigdecimal::BigDecimal;
use rand::seq::index;
use tracing::trace;

use super::{
    CollectionMetrics, Collector, CollectorError, DataCollection, DataContainer, DataEntity,
    DataType, Schema,
};

/// Registry name of the CSV collector.
pub const NAME: &str = "CsvCollector";

const STORE_TYPE: &str = "CSV";
const EXTENSION: &str = "csv";
const BYTES_PER_KB: u32 = 1024;

/// Registry factory for [`CsvCollector`].
pub fn factory() -> Box<dyn Collector> {
    Box::new(CsvCollector::new())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvCollector;

impl CsvCollector {
    pub fn new() -> Self {
        Self
    }

    fn root(container: &DataContainer) -> PathBuf {
        PathBuf::from(container.connection_string.trim())
    }

    /// All CSV files under the container root, sorted by name.
    fn table_paths(container: &DataContainer) -> Result<Vec<PathBuf>, CollectorError> {
        let root = Self::root(container);
        let entries = fs::read_dir(&root).map_err(|source| CollectorError::Io {
            path: root.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| CollectorError::Io {
                    path: root.clone(),
                    source,
                })?
                .path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION));
            if path.is_file() && is_csv {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Path of the file backing `collection`. The name must be a single
    /// path component so lookups stay inside the container root.
    fn collection_path(collection: &DataCollection) -> Result<PathBuf, CollectorError> {
        let name = collection.name.as_str();
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && Path::new(name).components().count() == 1;
        if !plain {
            return Err(CollectorError::InvalidCollectionName(name.to_string()));
        }
        Ok(Self::root(&collection.container).join(format!("{name}.{EXTENSION}")))
    }
}

impl Collector for CsvCollector {
    fn data_store_types(&self) -> Vec<String> {
        vec![STORE_TYPE.to_string()]
    }

    fn test_connection(&self, container: &DataContainer) -> Result<bool, CollectorError> {
        Ok(Self::root(container).is_dir())
    }

    fn get_schema(&self, container: &DataContainer) -> Result<Schema, CollectorError> {
        let mut schema = Schema::default();
        for path in Self::table_paths(container)? {
            let table = CsvTable::read(&path)?;
            let collection = DataCollection::new(container.clone(), table_name(&path));
            for column in &table.header {
                schema.entities.push(DataEntity::new(
                    collection.clone(),
                    column.as_str(),
                    DataType::String,
                    "string",
                ));
            }
            schema.tables.push(collection);
        }
        Ok(schema)
    }

    fn collect_sample(
        &self,
        entity: &DataEntity,
        sample_size: usize,
    ) -> Result<Vec<String>, CollectorError> {
        let path = Self::collection_path(&entity.collection)?;
        if !path.is_file() {
            return Err(CollectorError::UnknownCollection(entity.collection.name.clone()));
        }
        let table = CsvTable::read(&path)?;
        let column = table
            .column(&entity.name)
            .ok_or_else(|| CollectorError::UnknownEntity {
                collection: entity.collection.name.clone(),
                entity: entity.name.clone(),
            })?;

        let values: Vec<&str> = table.column_values(column).collect();
        let amount = sample_size.min(values.len());
        let mut picked = index::sample(&mut rand::thread_rng(), values.len(), amount).into_vec();
        picked.sort_unstable();
        trace!(
            collection = %entity.collection.name,
            entity = %entity.name,
            rows = values.len(),
            picked = picked.len(),
            "sampled csv column"
        );
        Ok(picked.into_iter().map(|i| values[i].to_string()).collect())
    }

    fn collection_metrics(
        &self,
        container: &DataContainer,
    ) -> Result<Vec<CollectionMetrics>, CollectorError> {
        Self::table_paths(container)?
            .iter()
            .map(|path| {
                let table = CsvTable::read(path)?;
                Ok(CollectionMetrics {
                    name: table_name(path),
                    row_count: i64::try_from(table.rows.len()).unwrap_or(i64::MAX),
                    used_space_kb: kilobytes(table.total_bytes - table.header_bytes),
                    total_space_kb: kilobytes(table.total_bytes),
                })
            })
            .collect()
    }
}

// ============================================================================
// FILE ACCESS
// ============================================================================

/// A CSV file held in memory.
struct CsvTable {
    header: Vec<String>,
    rows: Vec<String>,
    header_bytes: u64,
    total_bytes: u64,
}

impl CsvTable {
    fn read(path: &Path) -> Result<Self, CollectorError> {
        let text = fs::read_to_string(path).map_err(|source| CollectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let header_len = text.find('\n').map_or(text.len(), |newline| newline + 1);
        let (header_line, body) = text.split_at(header_len);
        let header = split_fields(header_line.trim_end_matches(['\r', '\n']))
            .map(str::to_string)
            .collect();
        let rows = body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            header,
            rows,
            header_bytes: header_len as u64,
            total_bytes: text.len() as u64,
        })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column == name)
    }

    fn column_values(&self, column: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| split_fields(row).nth(column).unwrap_or_default())
    }
}

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(str::trim)
}

fn table_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn kilobytes(bytes: u64) -> BigDecimal {
    BigDecimal::from(bytes) / BigDecimal::from(BYTES_PER_KB)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::str::FromStr;

    use super::*;

    fn people_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut people = String::from("id,name\n");
        for i in 0..20 {
            people.push_str(&format!("{i},person{i}\n"));
        }
        fs::write(dir.path().join("people.csv"), people).unwrap();
        fs::write(dir.path().join("orders.csv"), "order_id,amount,customer\n1,9.5,3\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        dir
    }

    fn container(dir: &tempfile::TempDir) -> DataContainer {
        DataContainer::new(dir.path().display().to_string())
    }

    #[test]
    fn connection_requires_existing_directory() {
        let dir = people_dir();
        let collector = CsvCollector::new();
        assert!(collector.test_connection(&container(&dir)).unwrap());
        let missing = DataContainer::new(dir.path().join("nope").display().to_string());
        assert!(!collector.test_connection(&missing).unwrap());
    }

    #[test]
    fn schema_lists_files_and_columns() {
        let dir = people_dir();
        let schema = CsvCollector::new().get_schema(&container(&dir)).unwrap();
        let tables: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tables, vec!["orders", "people"]);
        assert_eq!(schema.entities.len(), 5);
        assert_eq!(schema.entities[3].collection.name, "people");
    }

    #[test]
    fn sample_is_a_subset_of_the_column() {
        let dir = people_dir();
        let entity = DataEntity::named(&container(&dir), "people", "name");
        let sample = CsvCollector::new().collect_sample(&entity, 5).unwrap();
        assert_eq!(sample.len(), 5);
        let distinct: BTreeSet<&String> = sample.iter().collect();
        assert_eq!(distinct.len(), 5);
        assert!(sample.iter().all(|v| v.starts_with("person")));
    }

    #[test]
    fn oversized_sample_returns_every_row() {
        let dir = people_dir();
        let entity = DataEntity::named(&container(&dir), "orders", "amount");
        let sample = CsvCollector::new().collect_sample(&entity, 10).unwrap();
        assert_eq!(sample, vec!["9.5"]);
    }

    #[test]
    fn unknown_entity_is_an_error() {
        let dir = people_dir();
        let entity = DataEntity::named(&container(&dir), "people", "age");
        let err = CsvCollector::new().collect_sample(&entity, 1).unwrap_err();
        assert!(matches!(err, CollectorError::UnknownEntity { .. }));
    }

    #[test]
    fn collection_names_cannot_leave_the_root() {
        let dir = people_dir();
        let nested = dir.path().join("inner");
        fs::create_dir(&nested).unwrap();
        let inner = DataContainer::new(nested.display().to_string());
        let collector = CsvCollector::new();

        for name in ["../people", "..", "sub/people", "sub\\people", ""] {
            let entity = DataEntity::named(&inner, name, "name");
            let err = collector.collect_sample(&entity, 1).unwrap_err();
            assert!(
                matches!(err, CollectorError::InvalidCollectionName(ref n) if n == name),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn metrics_report_rows_and_kilobytes() {
        let dir = people_dir();
        let metrics = CsvCollector::new().collection_metrics(&container(&dir)).unwrap();
        let orders = metrics.iter().find(|m| m.name == "orders").unwrap();
        assert_eq!(orders.row_count, 1);
        // 25 header bytes + 8 data bytes
        assert_eq!(orders.total_space_kb, BigDecimal::from_str("0.0322265625").unwrap());
        assert_eq!(orders.used_space_kb, BigDecimal::from_str("0.0078125").unwrap());
    }
}
