//! Batch runs behind the `civicrank` subcommands.
//!
//! Each run reads its dataset, scores it with the configured artifact pair and
//! leaves a CSV snapshot at the output path. Nothing is written on failure.

use std::path::{Path, PathBuf};

use anyhow::Context;

use civicrank_common::{config::PipelineConfig, Config};
use civicrank_ranker::{features::SinglePrediction, pipeline, ArtifactSource, RecommendFilter};

/// Replace the configured dataset and/or output path for one run.
pub fn apply_overrides(
    pipeline: &mut PipelineConfig,
    dataset: Option<PathBuf>,
    output: Option<PathBuf>,
) {
    if let Some(dataset) = dataset {
        pipeline.dataset = dataset;
    }
    if let Some(output) = output {
        pipeline.output = output;
    }
}

/// Score every worker and write the leaderboard. Returns the written path.
pub fn leaderboard(config: &Config, artifacts: &dyn ArtifactSource) -> anyhow::Result<PathBuf> {
    let target = &config.leaderboard;
    let board = pipeline::run_leaderboard(target, artifacts, config.scoring.zero_assigned)
        .context("leaderboard run failed")?;
    board.write_csv(&target.output)?;
    Ok(target.output.clone())
}

/// Score the recommendation dataset, unfiltered, and write it.
pub fn recommend(config: &Config, artifacts: &dyn ArtifactSource) -> anyhow::Result<PathBuf> {
    let target = &config.recommendation;
    let board = pipeline::run_recommendation(target, artifacts, &RecommendFilter::default())
        .context("recommendation run failed")?;
    board.write_csv(&target.output)?;
    Ok(target.output.clone())
}

pub fn predict(
    config: &Config,
    artifacts: &dyn ArtifactSource,
    input: &SinglePrediction,
) -> anyhow::Result<f64> {
    pipeline::predict_single(&config.leaderboard, artifacts, input)
        .context("prediction failed")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
}
