//! Loading model/scaler artifacts from disk.
//!
//! Provides an abstraction over where scorers come from, so the pipelines can
//! ask for a scorer without caring whether it was just deserialized, reused from
//! an in-process cache, or injected by a test.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::features::FEATURE_COUNT;
use crate::model::{ModelArtifact, Regressor};
use crate::scaler::{FeatureScaler, ScalerArtifact};
use crate::scorer::Scorer;
use civicrank_common::{PipelineConfig, PipelineError, Result};

/// Location of a model and the scaler it was trained behind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, scaler: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            scaler: scaler.into(),
        }
    }
}

impl From<&PipelineConfig> for ArtifactPaths {
    fn from(config: &PipelineConfig) -> Self {
        Self::new(config.model.clone(), config.scaler.clone())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).map_err(|source| PipelineError::MissingArtifact {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| PipelineError::InvalidArtifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn check_width(path: &Path, n_features: usize) -> Result<()> {
    if n_features != FEATURE_COUNT {
        return Err(PipelineError::InvalidArtifact {
            path: path.to_path_buf(),
            reason: format!("expects {n_features} features, pipelines produce {FEATURE_COUNT}"),
        });
    }
    Ok(())
}

pub fn load_scaler(path: &Path) -> Result<ScalerArtifact> {
    let scaler: ScalerArtifact = read_json(path)?;
    scaler.validate().map_err(|reason| PipelineError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    })?;
    check_width(path, scaler.n_features())?;
    Ok(scaler)
}

pub fn load_model(path: &Path) -> Result<ModelArtifact> {
    let model: ModelArtifact = read_json(path)?;
    model.validate().map_err(|reason| PipelineError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    })?;
    check_width(path, model.n_features())?;
    Ok(model)
}

/// Deserialize and validate both artifacts of a pair.
pub fn load_scorer(paths: &ArtifactPaths) -> Result<Scorer> {
    let model = load_model(&paths.model)?;
    let scaler = load_scaler(&paths.scaler)?;
    debug!(
        model = %paths.model.display(),
        scaler = %paths.scaler.display(),
        "Loaded model artifacts"
    );
    Scorer::new(Arc::new(scaler), Arc::new(model))
}

/// Source of scorers for the pipelines.
pub trait ArtifactSource: Send + Sync {
    fn scorer(&self, paths: &ArtifactPaths) -> Result<Arc<Scorer>>;
}

/// Build the source selected by `[artifacts] cache`.
pub fn artifact_source(cache: bool) -> Arc<dyn ArtifactSource> {
    if cache {
        Arc::new(CachedArtifacts::new())
    } else {
        Arc::new(DiskArtifacts)
    }
}

// ── Reload on every call ────────────────────────────────────────────────────

/// Reads both files on every call. A file replaced on disk is picked up by
/// the next call.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskArtifacts;

impl ArtifactSource for DiskArtifacts {
    fn scorer(&self, paths: &ArtifactPaths) -> Result<Arc<Scorer>> {
        load_scorer(paths).map(Arc::new)
    }
}

// ── Process-wide cache ──────────────────────────────────────────────────────

/// Loads each pair once and hands out the shared, read-only scorer afterwards.
/// Failed loads are not cached.
#[derive(Debug, Default)]
pub struct CachedArtifacts {
    loaded: RwLock<HashMap<ArtifactPaths, Arc<Scorer>>>,
}

impl CachedArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.loaded.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactSource for CachedArtifacts {
    fn scorer(&self, paths: &ArtifactPaths) -> Result<Arc<Scorer>> {
        if let Some(scorer) = self
            .loaded
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(paths)
        {
            return Ok(Arc::clone(scorer));
        }

        // Two requests may race to load the same pair; the first insert wins.
        let scorer = Arc::new(load_scorer(paths)?);
        let mut loaded = self.loaded.write().unwrap_or_else(|e| e.into_inner());
        let entry = loaded.entry(paths.clone()).or_insert_with(|| {
            info!(model = %paths.model.display(), "Cached model artifacts");
            scorer
        });
        Ok(Arc::clone(entry))
    }
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Serves pre-built scorers registered by path, without touching the disk.
#[derive(Default)]
pub struct MockArtifacts {
    scorers: HashMap<ArtifactPaths, Arc<Scorer>>,
}

impl MockArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, paths: ArtifactPaths, scorer: Scorer) -> Self {
        self.scorers.insert(paths, Arc::new(scorer));
        self
    }
}

impl ArtifactSource for MockArtifacts {
    fn scorer(&self, paths: &ArtifactPaths) -> Result<Arc<Scorer>> {
        self.scorers
            .get(paths)
            .cloned()
            .ok_or_else(|| PipelineError::MissingArtifact {
                path: paths.model.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no mock registered"),
            })
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
