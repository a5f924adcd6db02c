//! Owns the one trained artifact the process serves with.
//!
//! The registry is built once at startup and never mutated afterwards, so it can be shared
//! behind an `Arc` by every request without locking.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use super::artifact::{
    load_classifier, load_feature_names, ArtifactError, Capability, ChurnClassifier,
    InvocationError,
};
use super::encoder::VectorEncoder;
use super::explain::ExplainabilityRanker;
use super::logistic;
use super::record::FeatureRecord;
use super::PredictionResult;

pub const V2_ARTIFACT: &str = "pipeline_churn_v2.json";
pub const LEGACY_ARTIFACT: &str = "churn_pipeline.json";
pub const LEGACY_FEATURE_NAMES: &str = "feature_names.json";

const HARD_POSITIVE_PROBABILITY: f64 = 0.8;
const HARD_NEGATIVE_PROBABILITY: f64 = 0.2;

/// Version tag surfaced in response metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelVersion {
    #[serde(rename = "v2.0")]
    V2,
    #[serde(rename = "v1.0")]
    V1,
    #[serde(rename = "v1.0-fallback")]
    Fallback,
}

impl ModelVersion {
    pub fn tag(&self) -> &'static str {
        match self {
            ModelVersion::V2 => "v2.0",
            ModelVersion::V1 => "v1.0",
            ModelVersion::Fallback => "v1.0-fallback",
        }
    }
}

/// Result of asking the registry for a prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome {
    Success(PredictionResult),
    Unavailable,
    InvocationFailed(InvocationError),
}

#[derive(Debug)]
struct LoadedModel {
    classifier: Box<dyn ChurnClassifier>,
    encoder: VectorEncoder,
    capability: Capability,
}

#[derive(Debug)]
pub struct ModelRegistry {
    model: Option<LoadedModel>,
    version: ModelVersion,
    ranker: ExplainabilityRanker,
}

impl ModelRegistry {
    /// A registry with no artifact; every request takes the heuristic path.
    pub fn empty() -> Self {
        Self {
            model: None,
            version: ModelVersion::Fallback,
            ranker: ExplainabilityRanker,
        }
    }

    /// Registers an already built classifier. `feature_names` selects the legacy
    /// ordered-vector encoding; `None` selects the one-hot row.
    pub fn with_classifier(
        classifier: Box<dyn ChurnClassifier>,
        feature_names: Option<Vec<String>>,
        version: ModelVersion,
    ) -> Self {
        let capability = classifier.capability();
        Self {
            model: Some(LoadedModel {
                classifier,
                encoder: VectorEncoder::for_feature_names(feature_names),
                capability,
            }),
            version,
            ranker: ExplainabilityRanker,
        }
    }

    /// Loads the best artifact found in `dir`: the v2 pipeline if present, otherwise the
    /// legacy pipeline with its feature names. Any failure leaves the registry empty.
    pub fn load(dir: &Path) -> Self {
        match Self::try_load(dir) {
            Ok(Some(registry)) => {
                if let Some(model) = &registry.model {
                    info!(
                        version = registry.version.tag(),
                        capability = %model.capability,
                        model_dir = %dir.display(),
                        "churn model artifact loaded"
                    );
                }
                registry
            }
            Ok(None) => {
                info!(
                    model_dir = %dir.display(),
                    "no churn model artifact found, serving heuristic predictions"
                );
                Self::empty()
            }
            Err(err) => {
                warn!(
                    model_dir = %dir.display(),
                    error = %err,
                    "failed to load churn model artifact, serving heuristic predictions"
                );
                Self::empty()
            }
        }
    }

    fn try_load(dir: &Path) -> Result<Option<Self>, ArtifactError> {
        let v2_path = dir.join(V2_ARTIFACT);
        if v2_path.is_file() {
            let classifier = load_classifier(&v2_path)?;
            return Ok(Some(Self::with_classifier(
                classifier,
                None,
                ModelVersion::V2,
            )));
        }

        let legacy_path = dir.join(LEGACY_ARTIFACT);
        if legacy_path.is_file() {
            let classifier = load_classifier(&legacy_path)?;
            let feature_names = load_feature_names(&dir.join(LEGACY_FEATURE_NAMES))?;
            return Ok(Some(Self::with_classifier(
                classifier,
                Some(feature_names),
                ModelVersion::V1,
            )));
        }

        Ok(None)
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub fn version(&self) -> &'static str {
        self.version.tag()
    }

    /// Capability recorded at load time, if an artifact is registered.
    pub fn capability(&self) -> Option<Capability> {
        self.model.as_ref().map(|model| model.capability)
    }

    pub fn invoke(&self, record: &FeatureRecord) -> ModelOutcome {
        let Some(model) = &self.model else {
            return ModelOutcome::Unavailable;
        };

        let row = model.encoder.encode(record);
        let probability = model
            .classifier
            .prepare(&row)
            .and_then(|input| {
                score_probability(model.classifier.as_ref(), model.capability, &input)
            });

        match probability {
            Ok(probability) => {
                let top_features = self.ranker.rank(model.classifier.as_ref(), &row);
                ModelOutcome::Success(PredictionResult::new(probability, top_features))
            }
            Err(err) => ModelOutcome::InvocationFailed(err),
        }
    }
}

fn score_probability(
    classifier: &dyn ChurnClassifier,
    capability: Capability,
    input: &[f64],
) -> Result<f64, InvocationError> {
    let probability = match capability {
        Capability::Probability => classifier.predict_proba(input)?,
        Capability::DecisionFunction => logistic(classifier.decision_function(input)?),
        Capability::HardPrediction => {
            if classifier.predict(input)? == 1 {
                HARD_POSITIVE_PROBABILITY
            } else {
                HARD_NEGATIVE_PROBABILITY
            }
        }
    };

    if (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(InvocationError::InvalidOutput(probability))
    }
}
