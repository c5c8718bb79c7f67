//! Data transformation stage.
//!
//! Fits the [`Preprocessor`] on the training split, encodes both splits
//! into dense arrays (features followed by the target as the last column)
//! and persists the fitted preprocessor for serving.

pub mod preprocessor;

pub use preprocessor::Preprocessor;

use std::path::{Path, PathBuf};

use nalgebra::DMatrix;

use crate::data::Table;
use crate::domain::TARGET_COLUMN;
use crate::error::{AppError, ErrorKind};
use crate::io::save_object;

/// Encoded splits plus where the preprocessor was written.
#[derive(Debug, Clone)]
pub struct TransformedData {
    pub train: DMatrix<f64>,
    pub test: DMatrix<f64>,
    pub preprocessor_path: PathBuf,
}

pub struct DataTransformation {
    preprocessor_path: PathBuf,
}

impl DataTransformation {
    pub fn new(preprocessor_path: impl Into<PathBuf>) -> Self {
        Self {
            preprocessor_path: preprocessor_path.into(),
        }
    }

    pub fn initiate_data_transformation(&self, train_path: &Path, test_path: &Path) -> Result<TransformedData, AppError> {
        let train_df = read_split(train_path)?;
        let test_df = read_split(test_path)?;
        tracing::info!("Read train and test data completed");

        tracing::info!("Obtaining preprocessing object");
        let preprocessor = Preprocessor::fit(&train_df)?;

        tracing::info!("Applying preprocessing object on training dataframe and testing dataframe");
        let train = with_target(preprocessor.transform(&train_df)?, &train_df)?;
        let test = with_target(preprocessor.transform(&test_df)?, &test_df)?;

        save_object(&self.preprocessor_path, &preprocessor)?;
        tracing::info!("Saved preprocessing object to {}", self.preprocessor_path.display());

        Ok(TransformedData {
            train,
            test,
            preprocessor_path: self.preprocessor_path.clone(),
        })
    }
}

fn read_split(path: &Path) -> Result<Table, AppError> {
    Table::read_csv(path).map_err(|e| {
        AppError::wrap(
            ErrorKind::Transformation,
            format!("Failed to read '{}'", path.display()),
            e,
        )
    })
}

/// Parse the target column; every cell must be a number.
pub fn target_values(table: &Table) -> Result<Vec<f64>, AppError> {
    let cells = table.column(TARGET_COLUMN).ok_or_else(|| {
        AppError::new(ErrorKind::Transformation, format!("Missing target column '{TARGET_COLUMN}'"))
    })?;

    cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            cell.trim().parse::<f64>().map_err(|e| {
                AppError::wrap(
                    ErrorKind::Transformation,
                    format!("Non-numeric target '{cell}' at row {row}"),
                    e,
                )
            })
        })
        .collect()
}

fn with_target(features: DMatrix<f64>, table: &Table) -> Result<DMatrix<f64>, AppError> {
    let target = target_values(table)?;
    let last = features.ncols();
    let mut array = features.insert_column(last, 0.0);
    for (row, value) in target.into_iter().enumerate() {
        array[(row, last)] = value;
    }
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_students;
    use crate::io::load_object;

    #[test]
    fn encodes_both_splits_and_saves_preprocessor() {
        let dir = tempfile::tempdir().unwrap();
        let data = generate_students(60, 1).unwrap();
        let train_path = dir.path().join("train.csv");
        let test_path = dir.path().join("test.csv");
        // Train on every row so the test split has no unseen categories.
        data.write_csv(&train_path).unwrap();
        data.select_rows(&(50..60).collect::<Vec<_>>()).write_csv(&test_path).unwrap();

        let pre_path = dir.path().join("nested").join("preprocessor.pkl");
        let out = DataTransformation::new(&pre_path)
            .initiate_data_transformation(&train_path, &test_path)
            .unwrap();

        assert_eq!(out.train.nrows(), 60);
        assert_eq!(out.test.nrows(), 10);
        assert_eq!(out.train.ncols(), out.test.ncols());

        let saved: Preprocessor = load_object(&out.preprocessor_path).unwrap();
        assert_eq!(saved.n_features_out() + 1, out.train.ncols());

        let expected = target_values(&data).unwrap();
        assert_eq!(out.train[(0, out.train.ncols() - 1)], expected[0]);
        assert_eq!(out.test[(9, out.test.ncols() - 1)], expected[59]);
    }

    #[test]
    fn non_numeric_target_is_rejected() {
        let table = Table::new(vec![TARGET_COLUMN.into()], vec![vec!["A+".into()]]).unwrap();
        assert_eq!(target_values(&table).unwrap_err().kind(), ErrorKind::Transformation);
    }

    #[test]
    fn missing_split_file_is_a_transformation_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        let err = DataTransformation::new(dir.path().join("p.pkl"))
            .initiate_data_transformation(&missing, &missing)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transformation);
    }
}
