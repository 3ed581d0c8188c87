//! Single worker prediction.

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::handlers::run_blocking;
use crate::state::SharedState;
use civicrank_common::ApiError;
use civicrank_ranker::{features::SinglePrediction, pipeline};

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictWorkerResponse {
    pub predicted_score: f64,
}

/// POST /predict-worker — Score one feature vector with the leaderboard model.
///
/// Body fields must have the declared types (`citizen_rating`, `locality_rating`
/// and `task_difficulty` are integers); anything else is rejected with 400
/// before the model is touched.
pub async fn predict_worker(
    State(state): State<SharedState>,
    WithRejection(Json(input), _): WithRejection<Json<SinglePrediction>, ApiError>,
) -> Result<Json<PredictWorkerResponse>, ApiError> {
    let config = state.config.leaderboard.clone();
    let artifacts = state.artifacts.clone();

    let predicted_score =
        run_blocking(move || pipeline::predict_single(&config, artifacts.as_ref(), &input)).await?;

    Ok(Json(PredictWorkerResponse { predicted_score }))
}
