use churn_engine::config::ModelConfig;
use churn_engine::inference::{ModelRegistry, PredictionEngine};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the registry once. A missing or broken artifact still yields a serving engine.
pub(crate) fn build_engine(config: &ModelConfig) -> Arc<PredictionEngine> {
    let registry = ModelRegistry::load(&config.model_dir);
    Arc::new(PredictionEngine::new(
        Arc::new(registry),
        config.model_timestamp.clone(),
    ))
}
