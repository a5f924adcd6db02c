use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::Value;

use crate::inference::artifact::ArtifactDocument;
use crate::inference::registry::{ModelRegistry, ModelVersion};
use crate::inference::{churn_router, PredictionEngine};

pub(super) fn heuristic_router() -> axum::Router {
    churn_router(Arc::new(PredictionEngine::new(
        Arc::new(ModelRegistry::empty()),
        None,
    )))
}

/// v2 registry whose logistic model only looks at contract and tenure.
pub(super) fn v2_router() -> axum::Router {
    let classifier = serde_json::from_value::<ArtifactDocument>(serde_json::json!({
        "estimator": "logistic_regression",
        "coefficients": [-0.08, 1.4, -1.2],
        "intercept": 0.2,
        "columns": ["num__tenure", "cat__Contract_One year", "cat__Contract_Two year"]
    }))
    .expect("document parses")
    .into_classifier()
    .expect("document validates");

    let registry = ModelRegistry::with_classifier(classifier, None, ModelVersion::V2);
    churn_router(Arc::new(PredictionEngine::new(
        Arc::new(registry),
        Some("2025-10-30T12:00:00Z".into()),
    )))
}

pub(super) fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request builds")
}

pub(super) async fn json_body(response: Response) -> Value {
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}
