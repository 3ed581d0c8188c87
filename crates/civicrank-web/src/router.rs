//! Axum router: maps all URL paths to handlers.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    predict::predict_worker,
    leaderboard::leaderboard,
    recommend::recommend,
    gateway::{leaderboard_snapshot, recommend_snapshot},
    system::health,
};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    let gateway = Router::new()
        .route("/predict",     post(predict_worker))
        .route("/leaderboard", get(leaderboard_snapshot))
        .route("/recommend",   get(recommend_snapshot));

    Router::new()
        .route("/health",         get(health))

        // Scoring API
        .route("/predict-worker", post(predict_worker))
        .route("/leaderboard",    get(leaderboard))
        .route("/recommend",      get(recommend))

        // Batch gateway
        .nest("/workers-prediction", gateway)

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
