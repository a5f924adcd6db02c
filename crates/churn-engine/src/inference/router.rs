use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::debug;

use super::engine::PredictionEngine;
use super::response::EnrichedResponse;

/// Router exposing the prediction endpoint and the model status document.
pub fn churn_router(engine: Arc<PredictionEngine>) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .route("/predict", post(predict_handler))
        .with_state(engine)
}

/// Always answers `200`: an unreadable or oversized body is scored as an empty record.
/// The default body limit still applies, so oversized bodies are never buffered whole.
pub(crate) async fn predict_handler(
    State(engine): State<Arc<PredictionEngine>>,
    body: Result<Bytes, BytesRejection>,
) -> Json<EnrichedResponse> {
    let payload = match body {
        Ok(body) => serde_json::from_slice::<Value>(&body).unwrap_or_else(|err| {
            debug!(error = %err, "request body is not JSON, scoring defaults");
            Value::Null
        }),
        Err(rejection) => {
            debug!(error = %rejection, "request body unreadable, scoring defaults");
            Value::Null
        }
    };

    Json(engine.respond(&payload))
}

pub(crate) async fn status_handler(State(engine): State<Arc<PredictionEngine>>) -> Json<Value> {
    Json(json!({
        "service": "ds",
        "modelLoaded": engine.registry().is_available(),
    }))
}
