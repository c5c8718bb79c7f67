//! Model evaluation and selection.
//!
//! Every configured regressor is fitted on the training split and scored by
//! R² on the test split, in the configured order. Selection follows
//! [`ModelReport::best_index`]: the first strictly highest score wins and a
//! NaN score never does.

use nalgebra::DMatrix;

use crate::domain::{ModelKind, ModelReport};
use crate::error::{AppError, ErrorKind};
use crate::math::r2_score;
use crate::models::Regressor;

/// Scores for every model plus the fitted winner.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: ModelReport,
    pub best: Option<(Regressor, f64)>,
}

/// Fit and score each model in `models` order.
///
/// The first failing fit or prediction aborts the whole evaluation.
pub fn evaluate_models(
    x_train: &DMatrix<f64>,
    y_train: &[f64],
    x_test: &DMatrix<f64>,
    y_test: &[f64],
    models: &[ModelKind],
    seed: u64,
) -> Result<Evaluation, AppError> {
    if x_test.nrows() != y_test.len() {
        return Err(AppError::new(
            ErrorKind::Training,
            format!("{} test rows but {} test targets", x_test.nrows(), y_test.len()),
        ));
    }

    let mut report = ModelReport::default();
    let mut fitted = Vec::with_capacity(models.len());

    for &kind in models {
        let model = Regressor::fit(kind, x_train, y_train, seed)?;
        let pred = model.predict(x_test).map_err(|e| {
            AppError::wrap(ErrorKind::Training, format!("{kind} failed to predict the test split"), e)
        })?;
        let score = r2_score(y_test, &pred);
        tracing::info!("{kind}: test r2 = {score:.4}");
        report.push(kind, score);
        fitted.push(model);
    }

    // The report owns the tie and NaN rules; the fitted list follows its order.
    let best = report
        .best_index()
        .map(|i| (fitted.swap_remove(i), report.scores[i].r2));

    Ok(Evaluation { report, best })
}

/// Split an array whose last column is the target.
pub fn split_features_target(array: &DMatrix<f64>) -> Result<(DMatrix<f64>, Vec<f64>), AppError> {
    let ncols = array.ncols();
    if ncols < 2 {
        return Err(AppError::new(
            ErrorKind::Training,
            format!("Array needs at least one feature and a target column, got {ncols} columns"),
        ));
    }
    let features = array.columns(0, ncols - 1).into_owned();
    let target = array.column(ncols - 1).iter().copied().collect();
    Ok((features, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_takes_last_column_as_target() {
        let array = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let (x, y) = split_features_target(&array).unwrap();
        assert_eq!(x, DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 4.0, 5.0]));
        assert_eq!(y, vec![3.0, 6.0]);

        assert!(split_features_target(&DMatrix::zeros(3, 1)).is_err());
    }

    #[test]
    fn report_keeps_evaluation_order() {
        let x = DMatrix::from_fn(30, 1, |r, _| r as f64);
        let y: Vec<f64> = (0..30).map(|r| 2.0 * r as f64).collect();
        let models = [ModelKind::KNeighbors, ModelKind::LinearRegression];

        let eval = evaluate_models(&x, &y, &x, &y, &models, 0).unwrap();
        let order: Vec<ModelKind> = eval.report.scores.iter().map(|s| s.model).collect();
        assert_eq!(order, models);

        let (best, score) = eval.best.unwrap();
        assert_eq!(best.kind(), ModelKind::LinearRegression);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn earlier_model_wins_a_tie() {
        // Constant target: every model predicts it exactly, all score 1.0.
        let x = DMatrix::from_fn(20, 2, |r, c| (r + c) as f64);
        let y = vec![5.0; 20];
        let models = [ModelKind::DecisionTree, ModelKind::LinearRegression];

        let eval = evaluate_models(&x, &y, &x, &y, &models, 0).unwrap();
        assert_eq!(eval.best.unwrap().0.kind(), ModelKind::DecisionTree);
    }

    #[test]
    fn nan_score_never_holds_the_lead() {
        let x = DMatrix::from_fn(40, 1, |r, _| r as f64);
        let y: Vec<f64> = (0..40).map(|r| 2.0 * r as f64).collect();
        // A NaN feature turns every linear prediction for that row into NaN,
        // while k-NN still averages real targets.
        let mut x_test = x.clone();
        x_test[(39, 0)] = f64::NAN;
        let models = [ModelKind::LinearRegression, ModelKind::KNeighbors];

        let eval = evaluate_models(&x, &y, &x_test, &y, &models, 0).unwrap();
        assert!(eval.report.scores[0].r2.is_nan());

        let (best, score) = eval.best.unwrap();
        assert_eq!(best.kind(), ModelKind::KNeighbors);
        assert_eq!(Some(best.kind()), eval.report.best().map(|s| s.model));
        assert!(score.is_finite());
    }
}
