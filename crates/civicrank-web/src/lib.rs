//! civicrank-web: HTTP service over the worker scoring pipelines.
//! Serves:
//!   - single worker prediction
//!   - the full leaderboard (JSON or CSV)
//!   - filtered recommendations
//!   - gateway routes that refresh the CSV snapshots

pub mod router;
pub mod handlers;
pub mod state;

pub use router::build_router;
pub use state::AppState;
