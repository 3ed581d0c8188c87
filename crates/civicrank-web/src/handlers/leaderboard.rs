//! Full worker leaderboard.

use axum::{
    extract::{Query, State},
    response::Response,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::handlers::{render, run_blocking, OutputFormat};
use crate::state::SharedState;
use civicrank_common::ApiError;
use civicrank_ranker::pipeline;

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub format: OutputFormat,
}

/// GET /leaderboard — Every worker with `completion_ratio` and `predicted_score`,
/// best first.
pub async fn leaderboard(
    State(state): State<SharedState>,
    WithRejection(Query(query), _): WithRejection<Query<LeaderboardQuery>, ApiError>,
) -> Result<Response, ApiError> {
    let config = state.config.leaderboard.clone();
    let policy = state.config.scoring.zero_assigned;
    let artifacts = state.artifacts.clone();

    let board =
        run_blocking(move || pipeline::run_leaderboard(&config, artifacts.as_ref(), policy)).await?;

    render(board, query.format)
}
