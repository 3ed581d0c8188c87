//! End-to-end pipelines: load → derive → scale → predict → rank → (filter).
//!
//! Every run owns its dataset and output. The only thing shared between runs
//! is the read-only scorer handed out by an [`ArtifactSource`].

use std::io::Write;
use std::path::Path;

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::artifacts::{ArtifactPaths, ArtifactSource};
use crate::dataset::{self, format_float, Column, ColumnKind, Dataset};
use crate::features::{
    FeatureVector, LeaderboardRecord, RecommendationRecord, SinglePrediction,
    FEATURE_COUNT, LEADERBOARD_FEATURES, RECOMMENDATION_FEATURES, SINGLE_FEATURES,
};
use crate::ranking::{self, RecommendFilter, ScoredWorker};
use crate::scorer::Scorer;
use civicrank_common::{PipelineConfig, Result, ZeroAssignedPolicy};

pub const COMPLETION_RATIO: &str = "completion_ratio";
pub const PREDICTED_SCORE: &str = "predicted_score";

/// Ranked output of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard<R> {
    columns: Vec<Column>,
    entries: Vec<ScoredWorker<R>>,
}

impl<R> Leaderboard<R> {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Entries in display order; position 0 is the top score.
    pub fn entries(&self) -> &[ScoredWorker<R>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.predicted_score).collect()
    }

    /// One JSON object per entry, keys in column order.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.entries
            .iter()
            .map(|e| dataset::row_to_json(&self.columns, &e.row))
            .collect()
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        dataset::write_csv(&mut buf, &self.columns, self.entries.iter().map(|e| e.row.as_slice()))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the CSV snapshot. See [`write_snapshot`].
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let body = self.to_csv_string()?;
        write_snapshot(path, &body)?;
        info!(path = %path.display(), rows = self.len(), "Wrote leaderboard snapshot");
        Ok(())
    }
}

impl<R> Serialize for Leaderboard<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for entry in &self.entries {
            seq.serialize_element(&dataset::row_to_json(&self.columns, &entry.row))?;
        }
        seq.end()
    }
}

/// Replace `path` with `body`, creating the parent directory if needed.
///
/// The body goes to a temp file next to `path` that is then renamed over it,
/// so readers only ever see a complete snapshot and a failed write leaves the
/// previous one in place.
pub fn write_snapshot(path: &Path, body: &str) -> Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(body.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Score every row, attach `predicted_score` and rank.
fn score_and_rank<R>(
    mut dataset: Dataset,
    records: Vec<R>,
    features: Vec<FeatureVector>,
    feature_names: [&str; FEATURE_COUNT],
    scorer: &Scorer,
) -> Result<Leaderboard<R>> {
    debug!(rows = features.len(), features = ?feature_names, "Scoring rows");
    let scores = scorer.score_batch(&features)?;
    dataset.set_column(
        PREDICTED_SCORE,
        ColumnKind::Float,
        scores.iter().copied().map(format_float).collect(),
    );

    let (columns, rows) = dataset.into_parts();
    let scored = records
        .into_iter()
        .zip(rows)
        .zip(scores)
        .map(|((record, row), predicted_score)| ScoredWorker {
            record,
            row,
            predicted_score,
        })
        .collect();

    Ok(Leaderboard {
        columns,
        entries: ranking::rank(scored),
    })
}

// ── Leaderboard ─────────────────────────────────────────────────────────────

pub fn leaderboard_records(dataset: &Dataset) -> Result<Vec<LeaderboardRecord>> {
    let tasks_completed = dataset.numeric_column("tasks_completed")?;
    let tasks_assigned = dataset.numeric_column("tasks_assigned")?;
    let avg_difficulty = dataset.numeric_column("avg_difficulty")?;
    let locality_rating = dataset.numeric_column("locality_rating")?;
    let citizen_rating = dataset.numeric_column("citizen_rating")?;

    Ok((0..dataset.len())
        .map(|i| LeaderboardRecord {
            tasks_completed: tasks_completed[i],
            tasks_assigned: tasks_assigned[i],
            avg_difficulty: avg_difficulty[i],
            locality_rating: locality_rating[i],
            citizen_rating: citizen_rating[i],
        })
        .collect())
}

/// Derive `completion_ratio`, score and rank an already loaded dataset.
pub fn build_leaderboard(
    mut dataset: Dataset,
    scorer: &Scorer,
    policy: ZeroAssignedPolicy,
) -> Result<Leaderboard<LeaderboardRecord>> {
    let records = leaderboard_records(&dataset)?;
    let ratios = records
        .iter()
        .enumerate()
        .map(|(row, r)| r.completion_ratio(policy, row))
        .collect::<Result<Vec<f64>>>()?;

    dataset.set_column(
        COMPLETION_RATIO,
        ColumnKind::Float,
        ratios.iter().copied().map(format_float).collect(),
    );
    let features = records
        .iter()
        .zip(&ratios)
        .map(|(r, ratio)| r.features(*ratio))
        .collect();

    score_and_rank(dataset, records, features, LEADERBOARD_FEATURES, scorer)
}

/// Full leaderboard run against the configured dataset and artifacts.
pub fn run_leaderboard(
    config: &PipelineConfig,
    artifacts: &dyn ArtifactSource,
    policy: ZeroAssignedPolicy,
) -> Result<Leaderboard<LeaderboardRecord>> {
    let dataset = Dataset::load(&config.dataset)?;
    let scorer = artifacts.scorer(&ArtifactPaths::from(config))?;
    let board = build_leaderboard(dataset, &scorer, policy)?;
    info!(rows = board.len(), "Built worker leaderboard");
    Ok(board)
}

// ── Recommendation ──────────────────────────────────────────────────────────

pub fn recommendation_records(dataset: &Dataset) -> Result<Vec<RecommendationRecord>> {
    let assigned_tasks = dataset.numeric_column("assigned_tasks")?;
    let avg_difficulty = dataset.numeric_column("avg_difficulty")?;
    let locality_rating = dataset.numeric_column("locality_rating")?;
    let citizen_rating = dataset.numeric_column("citizen_rating")?;
    let locality = dataset.text_column("locality")?;
    let worker_type = dataset.text_column("worker_type")?;

    Ok(locality
        .into_iter()
        .zip(worker_type)
        .enumerate()
        .map(|(i, (locality, worker_type))| RecommendationRecord {
            assigned_tasks: assigned_tasks[i],
            avg_difficulty: avg_difficulty[i],
            locality_rating: locality_rating[i],
            citizen_rating: citizen_rating[i],
            locality,
            worker_type,
        })
        .collect())
}

/// Reset difficulty for idle workers, score and rank. No filtering.
pub fn build_recommendations(
    mut dataset: Dataset,
    scorer: &Scorer,
) -> Result<Leaderboard<RecommendationRecord>> {
    let mut records = recommendation_records(&dataset)?;

    let mut reset = 0usize;
    for (row, record) in records.iter_mut().enumerate() {
        if record.needs_difficulty_reset() {
            record.avg_difficulty = record.adjusted_avg_difficulty();
            dataset.set_cell(row, "avg_difficulty", "0".to_string())?;
            reset += 1;
        }
    }
    if reset > 0 {
        debug!(rows = reset, "Reset avg_difficulty for workers with no assigned tasks");
    }

    let features = records.iter().map(RecommendationRecord::features).collect();
    score_and_rank(dataset, records, features, RECOMMENDATION_FEATURES, scorer)
}

/// Full recommendation run, then the equality filters.
pub fn run_recommendation(
    config: &PipelineConfig,
    artifacts: &dyn ArtifactSource,
    criteria: &RecommendFilter,
) -> Result<Leaderboard<RecommendationRecord>> {
    let dataset = Dataset::load(&config.dataset)?;
    let scorer = artifacts.scorer(&ArtifactPaths::from(config))?;
    let Leaderboard { columns, entries } = build_recommendations(dataset, &scorer)?;

    let total = entries.len();
    let entries = ranking::filter(entries, criteria);
    info!(
        rows = total,
        matched = entries.len(),
        locality = criteria.locality.as_deref().unwrap_or(""),
        worker_type = criteria.worker_type.as_deref().unwrap_or(""),
        "Built worker recommendations"
    );
    Ok(Leaderboard { columns, entries })
}

// ── Single prediction ───────────────────────────────────────────────────────

/// Score one ad-hoc vector with the leaderboard model.
pub fn predict_single(
    config: &PipelineConfig,
    artifacts: &dyn ArtifactSource,
    input: &SinglePrediction,
) -> Result<f64> {
    let scorer = artifacts.scorer(&ArtifactPaths::from(config))?;
    let score = scorer.score(&input.features())?;
    debug!(score, features = ?SINGLE_FEATURES, "Predicted single worker score");
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelArtifact;
    use crate::scaler::ScalerArtifact;
    use civicrank_common::PipelineError;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// Linear identity-scaled scorer: score = Σ coef_i · x_i.
    fn linear(coefficients: [f64; 4]) -> Scorer {
        Scorer::new(
            Arc::new(ScalerArtifact::Identity { n_features: 4 }),
            Arc::new(ModelArtifact::Linear {
                coefficients: coefficients.to_vec(),
                intercept: 0.0,
            }),
        )
        .unwrap()
    }

    fn dataset(csv: &str) -> Dataset {
        Dataset::from_reader(csv.as_bytes(), Path::new("test.csv")).unwrap()
    }

    const WORKERS: &str = "\
worker_id,tasks_completed,tasks_assigned,avg_difficulty,locality_rating,citizen_rating
w1,5,10,3,4,5
w2,12,10,1,1,1
w3,0,4,2,2,2
w4,3,0,2,2,2
";

    #[test]
    fn test_leaderboard_feature_vector_feeds_scorer() {
        // Only the completion ratio matters to this scorer.
        let board = build_leaderboard(dataset(WORKERS), &linear([1.0, 0.0, 0.0, 0.0]), ZeroAssignedPolicy::Zero)
            .unwrap();
        let ids: Vec<&str> = board.entries().iter().map(|e| e.row[0].as_str()).collect();
        assert_eq!(ids, vec!["w2", "w1", "w3", "w4"]);
        assert_eq!(board.scores(), vec![1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_leaderboard_adds_ratio_and_score_columns() {
        let board = build_leaderboard(dataset(WORKERS), &linear([1.0, 1.0, 1.0, 1.0]), ZeroAssignedPolicy::Zero)
            .unwrap();
        let names: Vec<&str> = board.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "worker_id",
                "tasks_completed",
                "tasks_assigned",
                "avg_difficulty",
                "locality_rating",
                "citizen_rating",
                "completion_ratio",
                "predicted_score",
            ]
        );
        let records = board.to_records();
        let top = &records[0];
        assert_eq!(top["worker_id"], "w1");
        assert_eq!(top["completion_ratio"], 0.5);
        assert_eq!(top["predicted_score"], 12.5);
        for record in &records {
            let ratio = record["completion_ratio"].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&ratio));
        }
    }

    #[test]
    fn test_leaderboard_reject_policy_aborts() {
        let err = build_leaderboard(dataset(WORKERS), &linear([1.0; 4]), ZeroAssignedPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidValue { row: 3, .. }));
    }

    #[test]
    fn test_leaderboard_missing_column() {
        let err = build_leaderboard(
            dataset("worker_id,tasks_completed\nw1,3\n"),
            &linear([1.0; 4]),
            ZeroAssignedPolicy::Zero,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    const RECOMMEND: &str = "\
name,assigned_tasks,avg_difficulty,locality_rating,citizen_rating,locality,worker_type
a,0,7,2,8,North,sweeper
b,2,3,1,1,South,driver
c,1,1,1,1,North,driver
";

    #[test]
    fn test_recommendation_resets_idle_difficulty() {
        // Score = avg_difficulty only, so the reset is visible in the ranking.
        let board = build_recommendations(dataset(RECOMMEND), &linear([0.0, 1.0, 0.0, 0.0])).unwrap();
        let a = board.entries().iter().find(|e| e.row[0] == "a").unwrap();
        assert_eq!(a.record.features(), [0.0, 0.0, 2.0, 8.0]);
        assert_eq!(a.predicted_score, 0.0);
        assert_eq!(a.row[2], "0");
        let names: Vec<&str> = board.entries().iter().map(|e| e.row[0].as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_recommendation_serializes_as_records() {
        let board = build_recommendations(dataset(RECOMMEND), &linear([1.0, 0.0, 0.0, 0.0])).unwrap();
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json[0]["name"], "b");
        assert_eq!(json[0]["assigned_tasks"], 2);
        assert_eq!(json[0]["predicted_score"], 2.0);
        assert_eq!(json.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_csv_snapshot_contains_score() {
        let board = build_recommendations(dataset(RECOMMEND), &linear([1.0, 0.0, 0.0, 0.0])).unwrap();
        let csv = board.to_csv_string().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,assigned_tasks,avg_difficulty,locality_rating,citizen_rating,locality,worker_type,predicted_score"
        );
        assert_eq!(lines.next().unwrap(), "b,2,3,1,1,South,driver,2.0");
    }

    #[test]
    fn test_write_csv_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("leaderboard.csv");
        let board = build_leaderboard(dataset(WORKERS), &linear([1.0; 4]), ZeroAssignedPolicy::Zero).unwrap();
        board.write_csv(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 5);
    }

    #[test]
    fn test_write_csv_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaderboard.csv");
        std::fs::write(&path, "stale\n").unwrap();

        let board = build_leaderboard(dataset(WORKERS), &linear([1.0; 4]), ZeroAssignedPolicy::Zero).unwrap();
        board.write_csv(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), board.to_csv_string().unwrap());
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_non_finite_cell_rejected() {
        let csv = "\
worker_id,tasks_completed,tasks_assigned,avg_difficulty,locality_rating,citizen_rating
w1,NaN,10,1,1,1
w2,5,10,1,1,1
";
        let err = build_leaderboard(dataset(csv), &linear([1.0; 4]), ZeroAssignedPolicy::Zero)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidValue { ref column, row: 0, .. } if column == "tasks_completed"
        ));
    }
}
