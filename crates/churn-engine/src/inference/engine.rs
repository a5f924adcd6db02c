use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::heuristic::HeuristicScorer;
use super::record::FeatureRecord;
use super::registry::{ModelOutcome, ModelRegistry};
use super::response::{EnrichedResponse, ResponseComposer};
use super::PredictionResult;

/// Which path produced a prediction. Chosen per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionPath {
    Model,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub result: PredictionResult,
    pub path: PredictionPath,
}

/// Tries the registered artifact and falls back to the heuristic for this request only.
/// Never fails.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    registry: Arc<ModelRegistry>,
    heuristic: HeuristicScorer,
    composer: ResponseComposer,
}

impl PredictionEngine {
    pub fn new(registry: Arc<ModelRegistry>, model_timestamp: Option<String>) -> Self {
        let composer = ResponseComposer::new(registry.version(), model_timestamp);
        Self {
            registry,
            heuristic: HeuristicScorer,
            composer,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn predict(&self, record: &FeatureRecord) -> Prediction {
        match self.registry.invoke(record) {
            ModelOutcome::Success(result) => Prediction {
                result,
                path: PredictionPath::Model,
            },
            ModelOutcome::Unavailable => self.heuristic_prediction(record),
            ModelOutcome::InvocationFailed(err) => {
                warn!(
                    version = self.registry.version(),
                    error = %err,
                    "model invocation failed, using heuristic for this request"
                );
                self.heuristic_prediction(record)
            }
        }
    }

    /// Full request path: normalize the body, predict, compose the response.
    pub fn respond(&self, payload: &Value) -> EnrichedResponse {
        let record = FeatureRecord::from_payload(payload);
        let prediction = self.predict(&record);
        debug!(
            path = ?prediction.path,
            probability = prediction.result.probability,
            label = %prediction.result.label,
            "churn prediction computed"
        );
        self.composer.compose(&prediction, Utc::now())
    }

    fn heuristic_prediction(&self, record: &FeatureRecord) -> Prediction {
        Prediction {
            result: self.heuristic.score(record),
            path: PredictionPath::Heuristic,
        }
    }
}
