//! Web front end.
//!
//! Three routes on an `axum` router:
//!
//! - `GET /` landing page
//! - `GET /predictdata` empty prediction form
//! - `POST /predictdata` form submission, answered with the form page plus
//!   the result line
//!
//! The predict pipeline is loaded once before the listener starts and
//! shared read-only across requests.

pub mod pages;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, ErrorKind};
use crate::predict::PredictPipeline;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PredictPipeline>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/predictdata", get(routes::predict_form).post(routes::predict_datapoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, pipeline: PredictPipeline) -> Result<(), AppError> {
    let app = router(AppState {
        pipeline: Arc::new(pipeline),
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::wrap(ErrorKind::Server, format!("Failed to bind {addr}"), e))?;
    tracing::info!("student-score v{} listening on {addr}", env!("CARGO_PKG_VERSION"));

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::wrap(ErrorKind::Server, "Server stopped with an error", e))
}
