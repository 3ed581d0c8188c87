//! Configuration loading for civicrank.
//! Reads civicrank.toml from the current directory or the path in CIVICRANK_CONFIG.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "CIVICRANK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "civicrank.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default = "default_leaderboard")]
    pub leaderboard: PipelineConfig,
    #[serde(default = "default_recommendation")]
    pub recommendation: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            artifacts: ArtifactConfig::default(),
            scoring: ScoringConfig::default(),
            leaderboard: default_leaderboard(),
            recommendation: default_recommendation(),
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16    { 8000 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ── Artifacts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactConfig {
    /// Keep loaded model/scaler pairs in memory and share them across calls.
    /// When false every call reloads both files from disk.
    #[serde(default = "bool_true")]
    pub cache: bool,
}

fn bool_true() -> bool { true }

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self { cache: true }
    }
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// What the leaderboard pipeline does with a row whose `tasks_assigned` is 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroAssignedPolicy {
    /// Treat the completion ratio as 0 and keep the row.
    #[default]
    Zero,
    /// Abort the run with an invalid-value error.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoringConfig {
    #[serde(default)]
    pub zero_assigned: ZeroAssignedPolicy,
}

// ── Pipelines ────────────────────────────────────────────────────────────────

/// Input dataset, output snapshot and artifact pair for one pipeline variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub dataset: PathBuf,
    pub output: PathBuf,
    pub model: PathBuf,
    pub scaler: PathBuf,
}

fn default_leaderboard() -> PipelineConfig {
    PipelineConfig {
        dataset: PathBuf::from("datasets/workers.csv"),
        output: PathBuf::from("datasets/leaderboard.csv"),
        model: PathBuf::from("models/worker_model.json"),
        scaler: PathBuf::from("models/scaler.json"),
    }
}

fn default_recommendation() -> PipelineConfig {
    PipelineConfig {
        dataset: PathBuf::from("datasets/recommendation_workers.csv"),
        output: PathBuf::from("datasets/recommended.csv"),
        model: PathBuf::from("models/worker_recommendation_model.json"),
        scaler: PathBuf::from("models/scaler_recommendation.json"),
    }
}

impl Config {
    /// Load configuration.
    /// Checks CIVICRANK_CONFIG first, then civicrank.toml in the current directory.
    /// A missing default file yields the built-in defaults; a missing file named
    /// through the environment is an error.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    tracing::info!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy civicrank.example.toml to civicrank.toml and edit it.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
