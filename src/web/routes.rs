//! Route handlers.

use std::collections::HashMap;

use axum::Form;
use axum::extract::State;
use axum::response::Html;

use crate::predict::CustomData;
use crate::web::AppState;
use crate::web::pages::{form_page, index_page};

pub async fn index() -> Html<String> {
    Html(index_page())
}

pub async fn predict_form() -> Html<String> {
    Html(form_page(None))
}

/// Score one submitted form.
///
/// Always renders the form page: with the prediction to two decimals,
/// `Prediction failed.` when the pipeline gives up, or `Error: ...` when
/// the form itself could not be read.
pub async fn predict_datapoint(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Html<String> {
    let result = match CustomData::from_form(&fields).and_then(|data| data.get_data_as_table()) {
        Ok(table) => match state.pipeline.predict(&table).as_deref() {
            Some([value, ..]) => format!("{value:.2}"),
            _ => "Prediction failed.".to_string(),
        },
        Err(err) => {
            tracing::warn!("Rejected form: {err}");
            format!("Error: {}", err.message())
        }
    };

    Html(form_page(Some(&result)))
}
