//! Shared fixtures: a temp directory holding both datasets, both artifact pairs
//! and a `Config` pointing at them.
//!
//! Both models are linear over standard-scaled features with mean 0 and scale 1,
//! so expected scores can be worked out by hand:
//!
//! - leaderboard: `10·completion_ratio + avg_difficulty + locality_rating + citizen_rating`
//! - recommendation: `assigned_tasks + avg_difficulty + locality_rating + citizen_rating`

use std::path::{Path, PathBuf};

use civicrank_common::config::{Config, PipelineConfig};
use serde_json::json;
use tempfile::TempDir;

pub const WORKERS_CSV: &str = "\
worker_id,name,tasks_completed,tasks_assigned,avg_difficulty,locality_rating,citizen_rating
W001,Asha,5,10,3,4,5
W002,Ravi,9,9,2,5,4
W003,Meena,2,8,4,3,3
W004,John,0,0,1,2,2
";

/// Leaderboard order for `WORKERS_CSV` with scores 21, 17, 12.5, 5.
pub const LEADERBOARD_ORDER: [&str; 4] = ["W002", "W001", "W003", "W004"];

pub const RECOMMENDATION_CSV: &str = "\
worker_id,name,assigned_tasks,avg_difficulty,locality_rating,citizen_rating,locality,worker_type
R001,Kiran,3,4,4,5,Ward 1,sweeper
R002,Lata,0,9,3,4,Ward 1,driver
R003,Sunil,5,2,5,5,Ward 2,sweeper
R004,Priya,1,3,2,3,Ward 2,driver
R005,Arjun,2,5,4,4,Ward 1,sweeper
";

/// Recommendation order for `RECOMMENDATION_CSV` with scores 17, 16, 15, 9, 7.
pub const RECOMMENDATION_ORDER: [&str; 5] = ["R003", "R001", "R005", "R004", "R002"];

pub struct Fixture {
    dir: TempDir,
    pub config: Config,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path();

        let leaderboard = PipelineConfig {
            dataset: root.join("datasets/workers.csv"),
            output: root.join("datasets/leaderboard.csv"),
            model: root.join("models/worker_model.json"),
            scaler: root.join("models/scaler.json"),
        };
        let recommendation = PipelineConfig {
            dataset: root.join("datasets/recommendation_workers.csv"),
            output: root.join("datasets/recommended.csv"),
            model: root.join("models/worker_recommendation_model.json"),
            scaler: root.join("models/scaler_recommendation.json"),
        };

        let scaler = json!({
            "kind": "standard",
            "mean": [0.0, 0.0, 0.0, 0.0],
            "scale": [1.0, 1.0, 1.0, 1.0]
        });

        write(&leaderboard.dataset, WORKERS_CSV);
        write(&leaderboard.scaler, &scaler.to_string());
        write(
            &leaderboard.model,
            &json!({
                "kind": "linear",
                "coefficients": [10.0, 1.0, 1.0, 1.0],
                "intercept": 0.0
            })
            .to_string(),
        );

        write(&recommendation.dataset, RECOMMENDATION_CSV);
        write(&recommendation.scaler, &scaler.to_string());
        write(
            &recommendation.model,
            &json!({
                "kind": "linear",
                "coefficients": [1.0, 1.0, 1.0, 1.0],
                "intercept": 0.0
            })
            .to_string(),
        );

        let config = Config {
            leaderboard,
            recommendation,
            ..Config::default()
        };

        Self { dir, config }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn remove(&self, path: &Path) {
        std::fs::remove_file(path).expect("remove fixture file");
    }

    /// Write the config as TOML and return its path.
    pub fn write_config(&self) -> PathBuf {
        let path = self.path("civicrank.toml");
        let text = toml::to_string(&self.config).expect("serialize fixture config");
        write(&path, &text);
        path
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dir");
    }
    std::fs::write(path, contents).expect("write fixture file");
}
