//! HTTP handlers for all web routes.

pub mod predict;
pub mod leaderboard;
pub mod recommend;
pub mod gateway;
pub mod system;

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use civicrank_common::ApiError;
use civicrank_ranker::Leaderboard;

/// Run pipeline work on the blocking pool: CSV parsing, artifact loading and
/// prediction are all synchronous.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> civicrank_common::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("pipeline task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Response encoding for ranked lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

pub(crate) fn csv_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/csv")], body).into_response()
}

pub(crate) fn render<R>(board: Leaderboard<R>, format: OutputFormat) -> Result<Response, ApiError> {
    match format {
        OutputFormat::Json => Ok(Json(board).into_response()),
        OutputFormat::Csv => Ok(csv_response(board.to_csv_string()?)),
    }
}
