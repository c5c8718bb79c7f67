//! Online prediction: request rows and the loaded artifact set.

use std::collections::HashMap;

use crate::data::Table;
use crate::domain::{ArtifactPaths, REQUEST_COLUMNS};
use crate::error::{AppError, ErrorKind};
use crate::io::load_object;
use crate::models::Regressor;
use crate::transform::Preprocessor;

/// The seven fields of one prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomData {
    pub gender: String,
    pub race_ethnicity: String,
    pub parental_level_of_education: String,
    pub lunch: String,
    pub test_preparation_course: String,
    pub reading_score: f64,
    pub writing_score: f64,
}

impl CustomData {
    /// Build from raw form fields keyed by column name.
    ///
    /// Missing categorical fields become empty cells (the preprocessor
    /// imputes them); a missing, non-numeric or infinite score is an error.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, AppError> {
        let text = |name: &str| fields.get(name).map(|v| v.trim().to_string()).unwrap_or_default();
        let score = |name: &str| -> Result<f64, AppError> {
            let raw = fields.get(name).map(|v| v.trim()).unwrap_or_default();
            if raw.is_empty() {
                return Err(AppError::new(ErrorKind::Prediction, format!("missing field '{name}'")));
            }
            let value = raw.parse::<f64>().map_err(|e| {
                AppError::wrap(ErrorKind::Prediction, format!("field '{name}' is not a number: '{raw}'"), e)
            })?;
            if !value.is_finite() {
                return Err(AppError::new(ErrorKind::Prediction, format!("field '{name}' is not finite: '{raw}'")));
            }
            Ok(value)
        };

        Ok(Self {
            gender: text("gender"),
            race_ethnicity: text("race/ethnicity"),
            parental_level_of_education: text("parental level of education"),
            lunch: text("lunch"),
            test_preparation_course: text("test preparation course"),
            reading_score: score("reading score")?,
            writing_score: score("writing score")?,
        })
    }

    /// One-row table with the request column names.
    pub fn get_data_as_table(&self) -> Result<Table, AppError> {
        let row = vec![
            self.gender.clone(),
            self.race_ethnicity.clone(),
            self.parental_level_of_education.clone(),
            self.lunch.clone(),
            self.test_preparation_course.clone(),
            self.reading_score.to_string(),
            self.writing_score.to_string(),
        ];
        Table::new(REQUEST_COLUMNS.iter().map(|c| c.to_string()).collect(), vec![row])
            .map_err(|e| AppError::wrap(ErrorKind::Prediction, "request row does not match the request columns", e))
    }
}

/// Fitted preprocessor and model, loaded once and shared read-only.
#[derive(Debug)]
pub struct PredictPipeline {
    preprocessor: Preprocessor,
    model: Regressor,
}

impl PredictPipeline {
    /// Load both artifacts; either one missing or corrupt is a persistence
    /// error.
    pub fn new(paths: &ArtifactPaths) -> Result<Self, AppError> {
        let model: Regressor = load_object(&paths.model)?;
        let preprocessor: Preprocessor = load_object(&paths.preprocessor)?;
        tracing::info!("Loaded {} model from {}", model.kind(), paths.model.display());
        Ok(Self::from_parts(preprocessor, model))
    }

    pub fn from_parts(preprocessor: Preprocessor, model: Regressor) -> Self {
        Self { preprocessor, model }
    }

    pub fn model(&self) -> &Regressor {
        &self.model
    }

    /// Predict one value per row, or `None` (logged) on any failure.
    pub fn predict(&self, features: &Table) -> Option<Vec<f64>> {
        match self.try_predict(features) {
            Ok(pred) => Some(pred),
            Err(err) => {
                tracing::error!("{err}");
                None
            }
        }
    }

    pub fn try_predict(&self, features: &Table) -> Result<Vec<f64>, AppError> {
        let x = self.preprocessor.transform(features)?;
        let pred = self.model.predict(&x)?;
        if let Some(row) = pred.iter().position(|p| !p.is_finite()) {
            return Err(AppError::new(
                ErrorKind::Prediction,
                format!("{} produced a non-finite prediction for row {row}", self.model.kind()),
            ));
        }
        Ok(pred)
    }
}
