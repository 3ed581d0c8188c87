//! Shared application state for the web server.

use std::sync::Arc;

use civicrank_common::Config;
use civicrank_ranker::{artifact_source, ArtifactSource};

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Where scorers come from: a process-wide cache or a fresh disk load per call.
    pub artifacts: Arc<dyn ArtifactSource>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let artifacts = artifact_source(config.artifacts.cache);
        Self::with_artifacts(config, artifacts)
    }

    pub fn with_artifacts(config: Config, artifacts: Arc<dyn ArtifactSource>) -> Self {
        Self {
            config: Arc::new(config),
            artifacts,
        }
    }
}

pub type SharedState = Arc<AppState>;
