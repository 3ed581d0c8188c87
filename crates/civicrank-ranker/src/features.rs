//! Feature derivation: raw worker rows to the fixed-order vectors each model expects.

use serde::{Deserialize, Serialize};
use tracing::warn;

use civicrank_common::{PipelineError, Result, ZeroAssignedPolicy};

/// Every model consumes a 4-wide vector.
pub const FEATURE_COUNT: usize = 4;

pub type FeatureVector = [f64; FEATURE_COUNT];

/// Column order of the leaderboard model.
pub const LEADERBOARD_FEATURES: [&str; FEATURE_COUNT] =
    ["completion_ratio", "avg_difficulty", "locality_rating", "citizen_rating"];

/// Column order of the recommendation model.
pub const RECOMMENDATION_FEATURES: [&str; FEATURE_COUNT] =
    ["assigned_tasks", "avg_difficulty", "locality_rating", "citizen_rating"];

/// Column order used by single predictions against the leaderboard model.
///
/// NOTE: citizen_rating sits in slot 1 here but in slot 3 of
/// `LEADERBOARD_FEATURES`, although both feed the same model. Kept as-is for
/// compatibility with existing callers; check the trained model's column
/// order before relying on single predictions.
pub const SINGLE_FEATURES: [&str; FEATURE_COUNT] =
    ["completion_ratio", "citizen_rating", "locality_rating", "task_difficulty"];

/// `clip(completed / assigned, 0, 1)`.
///
/// Returns `None` when `assigned` is zero; callers decide what that means.
pub fn completion_ratio(tasks_completed: f64, tasks_assigned: f64) -> Option<f64> {
    if tasks_assigned == 0.0 {
        return None;
    }
    Some((tasks_completed / tasks_assigned).clamp(0.0, 1.0))
}

// ── Leaderboard ─────────────────────────────────────────────────────────────

/// Leaderboard dataset row, numeric columns only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    pub tasks_completed: f64,
    pub tasks_assigned: f64,
    pub avg_difficulty: f64,
    pub locality_rating: f64,
    pub citizen_rating: f64,
}

impl LeaderboardRecord {
    /// Completion ratio after applying `policy` to rows with no assigned tasks.
    /// `row` is only used for error reporting and logging.
    pub fn completion_ratio(&self, policy: ZeroAssignedPolicy, row: usize) -> Result<f64> {
        match completion_ratio(self.tasks_completed, self.tasks_assigned) {
            Some(ratio) => Ok(ratio),
            None => match policy {
                ZeroAssignedPolicy::Zero => {
                    warn!(row, "tasks_assigned is 0, using completion_ratio = 0");
                    Ok(0.0)
                }
                ZeroAssignedPolicy::Reject => Err(PipelineError::InvalidValue {
                    column: "tasks_assigned".to_string(),
                    row,
                    value: self.tasks_assigned.to_string(),
                }),
            },
        }
    }

    /// `[completion_ratio, avg_difficulty, locality_rating, citizen_rating]`
    pub fn features(&self, completion_ratio: f64) -> FeatureVector {
        [
            completion_ratio,
            self.avg_difficulty,
            self.locality_rating,
            self.citizen_rating,
        ]
    }
}

// ── Recommendation ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub assigned_tasks: f64,
    pub avg_difficulty: f64,
    pub locality_rating: f64,
    pub citizen_rating: f64,
    pub locality: String,
    pub worker_type: String,
}

impl RecommendationRecord {
    /// Difficulty is meaningless for a worker with nothing assigned.
    pub fn adjusted_avg_difficulty(&self) -> f64 {
        if self.assigned_tasks == 0.0 {
            0.0
        } else {
            self.avg_difficulty
        }
    }

    pub fn needs_difficulty_reset(&self) -> bool {
        self.assigned_tasks == 0.0 && self.avg_difficulty != 0.0
    }

    /// `[assigned_tasks, avg_difficulty, locality_rating, citizen_rating]`
    pub fn features(&self) -> FeatureVector {
        [
            self.assigned_tasks,
            self.adjusted_avg_difficulty(),
            self.locality_rating,
            self.citizen_rating,
        ]
    }
}

// ── Single prediction ───────────────────────────────────────────────────────

/// Ad-hoc prediction input. The ratio is supplied directly, never derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglePrediction {
    pub completion_ratio: f64,
    pub citizen_rating: i64,
    pub locality_rating: i64,
    pub task_difficulty: i64,
}

impl SinglePrediction {
    /// Ordered as `SINGLE_FEATURES`.
    pub fn features(&self) -> FeatureVector {
        [
            self.completion_ratio,
            self.citizen_rating as f64,
            self.locality_rating as f64,
            self.task_difficulty as f64,
        ]
    }
}
