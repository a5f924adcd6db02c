use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::engine::{Prediction, PredictionPath};

const HIGH_RISK_THRESHOLD: f64 = 0.66;
const MEDIUM_RISK_THRESHOLD: f64 = 0.33;

pub const ACTION_RETAIN: &str = "Retención Prioritaria / Oferta de Lealtad";
pub const ACTION_GROW: &str = "Upsell / Programa de Fidelización";

/// Three-level classification of the churn probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    High,
    Medium,
    Low,
}

impl RiskTier {
    /// Lower bounds are inclusive: exactly 0.66 is high, exactly 0.33 is medium.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_RISK_THRESHOLD {
            RiskTier::High
        } else if probability >= MEDIUM_RISK_THRESHOLD {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::High => "Alto Riesgo",
            RiskTier::Medium => "Riesgo Medio",
            RiskTier::Low => "Bajo Riesgo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMetadata {
    pub model_version: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_timestamp: Option<String>,
    pub prediction_source: PredictionPath,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionBlock {
    pub churn_probability: f64,
    pub will_churn: u8,
    pub risk_level: String,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessLogic {
    pub suggested_action: String,
}

/// Response body of `POST /predict`. The legacy top-level fields mirror the enriched blocks
/// for clients that predate them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedResponse {
    pub metadata: ResponseMetadata,
    pub prediction: PredictionBlock,
    pub business_logic: BusinessLogic,
    pub prevision: String,
    pub probabilidad: f64,
    pub top_features: Vec<String>,
}

/// Maps a prediction to tiers and actions and assembles the response body.
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    model_version: &'static str,
    model_timestamp: Option<String>,
}

impl ResponseComposer {
    pub fn new(model_version: &'static str, model_timestamp: Option<String>) -> Self {
        Self {
            model_version,
            model_timestamp,
        }
    }

    pub fn compose(&self, prediction: &Prediction, now: DateTime<Utc>) -> EnrichedResponse {
        let result = &prediction.result;
        let probability = result.probability;
        let will_churn = probability >= 0.5;
        let suggested_action = if will_churn { ACTION_RETAIN } else { ACTION_GROW };

        EnrichedResponse {
            metadata: ResponseMetadata {
                model_version: self.model_version.to_string(),
                timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
                model_timestamp: self.model_timestamp.clone(),
                prediction_source: prediction.path,
            },
            prediction: PredictionBlock {
                churn_probability: probability,
                will_churn: u8::from(will_churn),
                risk_level: RiskTier::from_probability(probability).label().to_string(),
                confidence_score: confidence(probability),
            },
            business_logic: BusinessLogic {
                suggested_action: suggested_action.to_string(),
            },
            prevision: result.label.clone(),
            probabilidad: probability,
            top_features: result.top_features.clone(),
        }
    }
}

/// Distance from the decision boundary, floored at 0.5.
pub fn confidence(probability: f64) -> f64 {
    ((probability - 0.5).abs() * 2.0).max(0.5)
}
