//! Ranking and filtering of scored workers.

use serde::{Deserialize, Serialize};

use crate::features::RecommendationRecord;

/// A record, its output row and the score predicted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredWorker<R> {
    pub record: R,
    /// Output cells, aligned with the leaderboard's columns.
    pub row: Vec<String>,
    pub predicted_score: f64,
}

/// Sort descending by `predicted_score`, NaN scores last.
/// The sort is stable: equal scores keep their input order.
pub fn rank<R>(mut workers: Vec<ScoredWorker<R>>) -> Vec<ScoredWorker<R>> {
    workers.sort_by(|a, b| {
        match (a.predicted_score.is_nan(), b.predicted_score.is_nan()) {
            (false, false) => b.predicted_score.total_cmp(&a.predicted_score),
            (a_nan, b_nan) => a_nan.cmp(&b_nan),
        }
    });
    workers
}

/// Equality filters for the recommendation list.
/// Empty strings count as "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendFilter {
    pub locality: Option<String>,
    pub worker_type: Option<String>,
}

impl RecommendFilter {
    fn provided(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn matches(&self, record: &RecommendationRecord) -> bool {
        let locality_ok = Self::provided(&self.locality).map_or(true, |l| record.locality == l);
        let worker_type_ok =
            Self::provided(&self.worker_type).map_or(true, |t| record.worker_type == t);
        locality_ok && worker_type_ok
    }

    pub fn is_empty(&self) -> bool {
        Self::provided(&self.locality).is_none() && Self::provided(&self.worker_type).is_none()
    }
}

/// Keep the ranked workers matching every provided filter, in ranked order.
pub fn filter(
    ranked: Vec<ScoredWorker<RecommendationRecord>>,
    criteria: &RecommendFilter,
) -> Vec<ScoredWorker<RecommendationRecord>> {
    if criteria.is_empty() {
        return ranked;
    }
    ranked
        .into_iter()
        .filter(|w| criteria.matches(&w.record))
        .collect()
}
