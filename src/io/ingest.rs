//! Dataset ingestion.
//!
//! Reads the raw dataset, keeps a verbatim copy under the artifacts
//! directory, and writes a seeded train/test split next to it:
//!
//! ```text
//! artifacts/
//!   data.csv    raw copy
//!   train.csv   ~80% of rows, shuffled order
//!   test.csv    ~20% of rows, shuffled order
//! ```
//!
//! Any failure is fatal; there are no retries.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use crate::data::{Table, train_test_split};
use crate::domain::IngestionConfig;
use crate::error::{AppError, ErrorKind};

/// Row counts of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    pub rows_read: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Paths and counts produced by ingestion.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub stats: IngestionStats,
}

pub struct DataIngestion {
    config: IngestionConfig,
}

impl DataIngestion {
    pub fn new(config: IngestionConfig) -> Self {
        Self { config }
    }

    /// Run ingestion and return `(train_path, test_path)`.
    pub fn initiate_data_ingestion(&self) -> Result<(PathBuf, PathBuf), AppError> {
        let out = self.ingest()?;
        Ok((out.train_path, out.test_path))
    }

    /// Run ingestion and return paths plus row counts.
    pub fn ingest(&self) -> Result<IngestedData, AppError> {
        tracing::info!("Entered the data ingestion component");
        let source = &self.config.source_path;
        let artifacts = &self.config.artifacts;

        let table = Table::read_csv(source).map_err(|e| {
            AppError::wrap(
                ErrorKind::Ingestion,
                format!("Failed to read dataset '{}'", source.display()),
                e,
            )
        })?;
        if table.is_empty() {
            return Err(AppError::new(
                ErrorKind::Ingestion,
                format!("Dataset '{}' has no rows.", source.display()),
            ));
        }
        tracing::info!("Read {} rows from {}", table.len(), source.display());

        create_dir_all(&artifacts.dir).map_err(|e| {
            AppError::wrap(
                ErrorKind::Ingestion,
                format!("Failed to create artifacts dir '{}'", artifacts.dir.display()),
                e,
            )
        })?;

        write_table(&table, &artifacts.raw_data)?;
        tracing::info!("Raw data saved at {}", artifacts.raw_data.display());

        tracing::info!("Initiating train/test split");
        let split = train_test_split(table.len(), self.config.test_size, self.config.seed)?;
        let train = table.select_rows(&split.train);
        let test = table.select_rows(&split.test);

        write_table(&train, &artifacts.train_data)?;
        write_table(&test, &artifacts.test_data)?;
        tracing::info!("Training data saved at {}", artifacts.train_data.display());
        tracing::info!("Testing data saved at {}", artifacts.test_data.display());
        tracing::info!("Data ingestion completed");

        Ok(IngestedData {
            train_path: artifacts.train_data.clone(),
            test_path: artifacts.test_data.clone(),
            stats: IngestionStats {
                rows_read: table.len(),
                train_rows: train.len(),
                test_rows: test.len(),
            },
        })
    }
}

fn write_table(table: &Table, path: &Path) -> Result<(), AppError> {
    table.write_csv(path).map_err(|e| {
        AppError::wrap(
            ErrorKind::Ingestion,
            format!("Failed to write '{}'", path.display()),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use crate::data::generate_students;
    use crate::domain::ArtifactPaths;

    fn config_in(dir: &Path) -> IngestionConfig {
        IngestionConfig {
            source_path: dir.join("stud.csv"),
            artifacts: ArtifactPaths::new(dir.join("artifacts")),
            test_size: 0.2,
            seed: 42,
        }
    }

    #[test]
    fn writes_raw_copy_and_disjoint_split() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let raw = generate_students(101, 5).unwrap();
        raw.write_csv(&config.source_path).unwrap();

        let out = DataIngestion::new(config.clone()).ingest().unwrap();
        assert_eq!(out.stats.rows_read, 101);
        assert_eq!(out.stats.test_rows, 21);
        assert_eq!(out.stats.train_rows, 80);

        let copy = Table::read_csv(&config.artifacts.raw_data).unwrap();
        assert_eq!(copy, raw);

        let train = Table::read_csv(&out.train_path).unwrap();
        let test = Table::read_csv(&out.test_path).unwrap();
        assert_eq!(train.len() + test.len(), raw.len());
        assert_eq!(train.headers(), raw.headers());

        // Rows may repeat in the raw data, so compare multiplicities.
        let mut all: Vec<_> = train.rows().iter().chain(test.rows()).cloned().collect();
        let mut expected = raw.rows().to_vec();
        all.sort();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn fixed_seed_is_reproducible_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        generate_students(60, 2).unwrap().write_csv(&config.source_path).unwrap();

        let ingestion = DataIngestion::new(config);
        let (train_path, test_path) = ingestion.initiate_data_ingestion().unwrap();
        let first = (
            Table::read_csv(&train_path).unwrap(),
            Table::read_csv(&test_path).unwrap(),
        );

        ingestion.initiate_data_ingestion().unwrap();
        let second = (
            Table::read_csv(&train_path).unwrap(),
            Table::read_csv(&test_path).unwrap(),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn split_rows_keep_their_identity() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let rows = (0..20).map(|i| vec![format!("id{i}")]).collect();
        Table::new(vec!["id".into()], rows)
            .unwrap()
            .write_csv(&config.source_path)
            .unwrap();

        let out = DataIngestion::new(config).ingest().unwrap();
        let train: HashSet<String> = Table::read_csv(&out.train_path)
            .unwrap()
            .column("id")
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        let test: HashSet<String> = Table::read_csv(&out.test_path)
            .unwrap()
            .column("id")
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(train.len(), 16);
        assert_eq!(test.len(), 4);
        assert!(train.is_disjoint(&test));
    }

    #[test]
    fn missing_or_malformed_source_is_an_ingestion_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let err = DataIngestion::new(config.clone()).ingest().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ingestion);
        assert!(!config.artifacts.train_data.exists());

        std::fs::write(&config.source_path, "a,b\n1,2\n3\n").unwrap();
        let err = DataIngestion::new(config.clone()).ingest().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ingestion);

        std::fs::write(&config.source_path, "a,b\n").unwrap();
        let err = DataIngestion::new(config).ingest().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ingestion);
    }
}
