//! Inference path: raw record → normalization → model or heuristic → attribution → response.

pub mod artifact;
pub mod encoder;
mod engine;
mod explain;
pub mod heuristic;
pub mod record;
pub mod registry;
pub mod response;
pub mod router;

#[cfg(test)]
mod tests;

pub use artifact::{ArtifactError, Capability, ChurnClassifier, InvocationError};
pub use encoder::{EncodedRow, VectorEncoder};
pub use engine::{Prediction, PredictionEngine, PredictionPath};
pub use explain::ExplainabilityRanker;
pub use heuristic::HeuristicScorer;
pub use record::{FeatureRecord, FeatureValue};
pub use registry::{ModelOutcome, ModelRegistry, ModelVersion};
pub use response::{EnrichedResponse, ResponseComposer, RiskTier};
pub use router::churn_router;

use serde::Serialize;

/// The two labels the service ever emits.
pub const LABEL_CHURN: &str = "Va a cancelar";
pub const LABEL_RETAIN: &str = "Va a continuar";

/// Core fields of a prediction, shared by the model and heuristic paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: String,
    pub probability: f64,
    pub top_features: Vec<String>,
}

impl PredictionResult {
    pub fn new(probability: f64, top_features: Vec<String>) -> Self {
        Self {
            label: label_for(probability).to_string(),
            probability,
            top_features,
        }
    }
}

/// Same threshold on both paths: 0.5 counts as churn.
pub fn label_for(probability: f64) -> &'static str {
    if probability >= 0.5 {
        LABEL_CHURN
    } else {
        LABEL_RETAIN
    }
}

pub(crate) fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
