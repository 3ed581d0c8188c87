//! civicrank-ranker — Worker scoring and ranking engine.
//! Feature derivation, artifact-backed scoring, ranking and filtering.

pub mod features;
pub mod scaler;
pub mod model;
pub mod scorer;
pub mod artifacts;
pub mod dataset;
pub mod ranking;
pub mod pipeline;

pub use artifacts::{artifact_source, ArtifactPaths, ArtifactSource};
pub use pipeline::Leaderboard;
pub use ranking::RecommendFilter;
pub use scorer::Scorer;
