//! Gateway routes under `/workers-prediction`.
//!
//! These mirror the batch scripts: each run rewrites the CSV snapshot at the
//! configured output path and answers with the same CSV, so a client sees
//! exactly what a `civicrank leaderboard` run would have left on disk.

use std::path::Path;

use axum::{extract::State, response::Response};

use crate::handlers::{csv_response, run_blocking};
use crate::state::SharedState;
use civicrank_common::ApiError;
use civicrank_ranker::{pipeline, Leaderboard, RecommendFilter};

/// Persist the snapshot and return the same CSV text.
fn write_snapshot<R>(board: &Leaderboard<R>, output: &Path) -> civicrank_common::Result<String> {
    let body = board.to_csv_string()?;
    pipeline::write_snapshot(output, &body)?;
    Ok(body)
}

/// GET /workers-prediction/leaderboard
pub async fn leaderboard_snapshot(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let config = state.config.leaderboard.clone();
    let policy = state.config.scoring.zero_assigned;
    let artifacts = state.artifacts.clone();

    let body = run_blocking(move || {
        let board = pipeline::run_leaderboard(&config, artifacts.as_ref(), policy)?;
        write_snapshot(&board, &config.output)
    })
    .await?;

    Ok(csv_response(body))
}

/// GET /workers-prediction/recommend: unfiltered, same as the batch run.
pub async fn recommend_snapshot(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let config = state.config.recommendation.clone();
    let artifacts = state.artifacts.clone();

    let body = run_blocking(move || {
        let board =
            pipeline::run_recommendation(&config, artifacts.as_ref(), &RecommendFilter::default())?;
        write_snapshot(&board, &config.output)
    })
    .await?;

    Ok(csv_response(body))
}
