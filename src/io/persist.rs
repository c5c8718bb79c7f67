//! Save/load fitted objects as `bincode` blobs.
//!
//! Both artifacts (preprocessor and model) go through these two functions,
//! in training and serving alike, so the on-disk format stays consistent.

use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, ErrorKind};

/// Serialize `obj` to `path`, creating parent directories and overwriting
/// any existing file.
pub fn save_object<T: Serialize>(path: &Path, obj: &T) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| {
            AppError::wrap(
                ErrorKind::Persistence,
                format!("Failed to create artifact dir '{}'", parent.display()),
                e,
            )
        })?;
    }

    let file = File::create(path).map_err(|e| {
        AppError::wrap(
            ErrorKind::Persistence,
            format!("Failed to create '{}'", path.display()),
            e,
        )
    })?;
    let mut writer = BufWriter::new(file);

    bincode::serialize_into(&mut writer, obj).map_err(|e| {
        AppError::wrap(
            ErrorKind::Persistence,
            format!("Failed to serialize object to '{}'", path.display()),
            e,
        )
    })?;
    writer.flush().map_err(|e| {
        AppError::wrap(
            ErrorKind::Persistence,
            format!("Failed to flush '{}'", path.display()),
            e,
        )
    })?;

    tracing::debug!("Saved object to {}", path.display());
    Ok(())
}

/// Deserialize an object previously written by [`save_object`].
pub fn load_object<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::wrap(
            ErrorKind::Persistence,
            format!("Failed to open '{}'", path.display()),
            e,
        )
    })?;

    bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
        AppError::wrap(
            ErrorKind::Persistence,
            format!("Corrupt or incompatible object in '{}'", path.display()),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        name: String,
        weights: Vec<f64>,
    }

    #[test]
    fn round_trip_creates_parent_dirs_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/artifacts/blob.pkl");

        let first = Blob { name: "a".into(), weights: vec![1.0, 2.5] };
        save_object(&path, &first).unwrap();
        assert_eq!(load_object::<Blob>(&path).unwrap(), first);

        let second = Blob { name: "b".into(), weights: vec![] };
        save_object(&path, &second).unwrap();
        assert_eq!(load_object::<Blob>(&path).unwrap(), second);
    }

    #[test]
    fn missing_and_corrupt_files_are_persistence_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = load_object::<Blob>(&dir.path().join("absent.pkl")).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::Persistence);

        let corrupt = dir.path().join("corrupt.pkl");
        std::fs::write(&corrupt, [0xff, 0x01]).unwrap();
        let err = load_object::<Blob>(&corrupt).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn fitted_artifacts_behave_the_same_after_reload() {
        use crate::data::generate_students;
        use crate::domain::ModelKind;
        use crate::models::Regressor;
        use crate::transform::{Preprocessor, target_values};

        let train = generate_students(200, 11).unwrap();
        let query = generate_students(25, 12).unwrap();

        let preprocessor = Preprocessor::fit(&train).unwrap();
        let x = preprocessor.transform(&train).unwrap();
        let model = Regressor::fit(ModelKind::LinearRegression, &x, &target_values(&train).unwrap(), 42).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let (pre_path, model_path) = (dir.path().join("preprocessor.pkl"), dir.path().join("model.pkl"));
        save_object(&pre_path, &preprocessor).unwrap();
        save_object(&model_path, &model).unwrap();
        let loaded_pre: Preprocessor = load_object(&pre_path).unwrap();
        let loaded_model: Regressor = load_object(&model_path).unwrap();

        let x_query = preprocessor.transform(&query).unwrap();
        assert_eq!(loaded_pre.transform(&query).unwrap(), x_query);
        assert_eq!(loaded_model.predict(&x_query).unwrap(), model.predict(&x_query).unwrap());
    }
}
