//! Worker recommendations with locality / worker-type filters.

use axum::{
    extract::{Query, State},
    response::Response,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::debug;

use crate::handlers::{render, run_blocking, OutputFormat};
use crate::state::SharedState;
use civicrank_common::ApiError;
use civicrank_ranker::{pipeline, RecommendFilter};

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub locality: Option<String>,
    pub worker_type: Option<String>,
    /// Accepted for client compatibility; results are never truncated.
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_limit() -> i64 { 10 }

/// GET /recommend — Ranked recommendation list, filtered by the optional
/// `locality` and `worker_type` parameters. Returns every match.
pub async fn recommend(
    State(state): State<SharedState>,
    WithRejection(Query(query), _): WithRejection<Query<RecommendQuery>, ApiError>,
) -> Result<Response, ApiError> {
    debug!(limit = query.limit, "recommend limit ignored");

    let criteria = RecommendFilter {
        locality: query.locality,
        worker_type: query.worker_type,
    };
    let config = state.config.recommendation.clone();
    let artifacts = state.artifacts.clone();

    let board = run_blocking(move || {
        pipeline::run_recommendation(&config, artifacts.as_ref(), &criteria)
    })
    .await?;

    render(board, query.format)
}
