//! Registry loading against artifact files on disk, and the responses each outcome produces.

mod common {
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Scratch model directory, wiped on creation so reruns start clean.
    pub(super) fn model_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "churn-engine-{}-{}",
            std::process::id(),
            name
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).expect("stale model dir removable");
        }
        fs::create_dir_all(&dir).expect("model dir creatable");
        dir
    }

    pub(super) fn write(dir: &Path, file: &str, contents: &serde_json::Value) {
        fs::write(dir.join(file), contents.to_string()).expect("artifact writable");
    }

    pub(super) fn scenario() -> serde_json::Value {
        serde_json::json!({
            "features": {
                "gender": "Female",
                "SeniorCitizen": 0,
                "Partner": "Yes",
                "Dependents": "No",
                "tenure": 2,
                "PhoneService": "Yes",
                "MultipleLines": "No",
                "InternetService": "Fiber optic",
                "OnlineSecurity": "No",
                "OnlineBackup": "No",
                "DeviceProtection": "No",
                "TechSupport": "No",
                "StreamingTV": "Yes",
                "StreamingMovies": "Yes",
                "Contract": "Month-to-month",
                "PaperlessBilling": "Yes",
                "PaymentMethod": "Electronic check",
                "MonthlyCharges": 99.65,
                "TotalCharges": "199.3"
            }
        })
    }
}

use std::sync::Arc;

use churn_engine::inference::registry::{LEGACY_ARTIFACT, LEGACY_FEATURE_NAMES, V2_ARTIFACT};
use churn_engine::inference::{
    Capability, FeatureRecord, HeuristicScorer, ModelRegistry, PredictionEngine, PredictionPath,
};
use common::{model_dir, scenario, write};
use serde_json::json;

#[test]
fn empty_directory_serves_heuristic() {
    let dir = model_dir("empty");
    let registry = ModelRegistry::load(&dir);
    assert!(!registry.is_available());
    assert_eq!(registry.version(), "v1.0-fallback");

    let engine = PredictionEngine::new(Arc::new(registry), None);
    let response = engine.respond(&scenario());
    let expected = HeuristicScorer.score(&FeatureRecord::from_payload(&scenario()));
    assert_eq!(response.probabilidad, expected.probability);
    assert_eq!(response.metadata.prediction_source, PredictionPath::Heuristic);
}

#[test]
fn missing_directory_serves_heuristic() {
    let dir = std::env::temp_dir().join("churn-engine-does-not-exist");
    let registry = ModelRegistry::load(&dir);
    assert!(!registry.is_available());
}

#[test]
fn v2_pipeline_is_preferred_over_legacy() {
    let dir = model_dir("v2-preferred");
    write(
        &dir,
        V2_ARTIFACT,
        &json!({
            "estimator": "logistic_regression",
            "coefficients": [-0.05, 0.9, 0.6, -1.1],
            "intercept": -0.4,
            "columns": [
                "num__tenure",
                "cat__InternetService_Fiber optic",
                "cat__PaymentMethod_Electronic check",
                "cat__Contract_Two year"
            ]
        }),
    );
    write(
        &dir,
        LEGACY_ARTIFACT,
        &json!({ "estimator": "linear_svm", "coefficients": [1.0] }),
    );
    write(&dir, LEGACY_FEATURE_NAMES, &json!(["tenure"]));

    let registry = ModelRegistry::load(&dir);
    assert!(registry.is_available());
    assert_eq!(registry.version(), "v2.0");
    assert_eq!(registry.capability(), Some(Capability::Probability));

    let engine = PredictionEngine::new(Arc::new(registry), Some("2025-10-30".into()));
    let response = engine.respond(&scenario());
    // z = -0.4 - 0.1 + 0.9 + 0.6
    let expected = 1.0 / (1.0 + (-1.0f64).exp());
    assert!((response.probabilidad - expected).abs() < 1e-12);
    assert_eq!(response.metadata.prediction_source, PredictionPath::Model);
    assert_eq!(response.metadata.model_version, "v2.0");
    assert_eq!(
        response.top_features,
        vec!["InternetService", "PaymentMethod", "tenure"]
    );
}

#[test]
fn legacy_pipeline_uses_declared_feature_order() {
    let dir = model_dir("legacy");
    write(
        &dir,
        LEGACY_ARTIFACT,
        &json!({
            "estimator": "linear_svm",
            "coefficients": [0.02, -0.1],
            "intercept": 0.0
        }),
    );
    write(&dir, LEGACY_FEATURE_NAMES, &json!(["MonthlyCharges", "tenure"]));

    let registry = ModelRegistry::load(&dir);
    assert_eq!(registry.version(), "v1.0");
    assert_eq!(registry.capability(), Some(Capability::DecisionFunction));

    let engine = PredictionEngine::new(Arc::new(registry), None);
    let response = engine.respond(&scenario());
    let z: f64 = 0.02 * 99.65 - 0.1 * 2.0;
    let expected = 1.0 / (1.0 + (-z).exp());
    assert!((response.probabilidad - expected).abs() < 1e-9);
    assert_eq!(response.top_features, vec!["MonthlyCharges", "tenure"]);
}

#[test]
fn legacy_pipeline_without_feature_names_is_not_loaded() {
    let dir = model_dir("legacy-no-names");
    write(
        &dir,
        LEGACY_ARTIFACT,
        &json!({ "estimator": "linear_svm", "coefficients": [1.0] }),
    );

    let registry = ModelRegistry::load(&dir);
    assert!(!registry.is_available());
    assert_eq!(registry.version(), "v1.0-fallback");
}

#[test]
fn corrupt_v2_pipeline_leaves_registry_empty() {
    let dir = model_dir("corrupt-v2");
    std::fs::write(dir.join(V2_ARTIFACT), b"\x80\x04\x95 binary artifact").expect("writable");
    write(
        &dir,
        LEGACY_ARTIFACT,
        &json!({ "estimator": "linear_svm", "coefficients": [1.0] }),
    );
    write(&dir, LEGACY_FEATURE_NAMES, &json!(["tenure"]));

    let registry = ModelRegistry::load(&dir);
    assert!(!registry.is_available());
    assert_eq!(registry.version(), "v1.0-fallback");
}

#[test]
fn invocation_failure_keeps_intended_version() {
    let dir = model_dir("mismatch");
    // positional v2 model sized for a different one-hot layout
    write(
        &dir,
        V2_ARTIFACT,
        &json!({
            "estimator": "logistic_regression",
            "coefficients": [0.1, 0.2, 0.3, 0.4]
        }),
    );

    let registry = ModelRegistry::load(&dir);
    assert!(registry.is_available());

    let engine = PredictionEngine::new(Arc::new(registry), None);
    let response = engine.respond(&scenario());
    let expected = HeuristicScorer.score(&FeatureRecord::from_payload(&scenario()));
    assert_eq!(response.metadata.model_version, "v2.0");
    assert_eq!(response.metadata.prediction_source, PredictionPath::Heuristic);
    assert_eq!(response.probabilidad, expected.probability);
    assert_eq!(response.top_features, expected.top_features);
}

#[test]
fn hard_prediction_tree_maps_to_proxy_probability() {
    let dir = model_dir("tree");
    write(
        &dir,
        V2_ARTIFACT,
        &json!({
            "estimator": "decision_tree",
            "columns": ["tenure", "Contract_Two year", "MonthlyCharges"],
            "feature_importances": [0.5, 0.3, 0.2],
            "nodes": [
                { "kind": "split", "column": 1, "threshold": 0.5, "left": 1, "right": 4 },
                { "kind": "split", "column": 0, "threshold": 12.0, "left": 2, "right": 3 },
                { "kind": "leaf", "class": 1 },
                { "kind": "leaf", "class": 0 },
                { "kind": "leaf", "class": 0 }
            ]
        }),
    );

    let registry = ModelRegistry::load(&dir);
    assert_eq!(registry.capability(), Some(Capability::HardPrediction));

    let engine = PredictionEngine::new(Arc::new(registry), None);
    let response = engine.respond(&scenario());
    assert_eq!(response.probabilidad, 0.8);
    assert_eq!(response.prediction.risk_level, "Alto Riesgo");
    assert!((response.prediction.confidence_score - 0.6).abs() < 1e-12);
    assert_eq!(response.top_features, vec!["MonthlyCharges", "tenure", "Contract"]);
}
