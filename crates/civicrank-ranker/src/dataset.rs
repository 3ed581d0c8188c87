//! Worker datasets: CSV in, CSV/JSON out.
//!
//! Rows are kept as the original strings so identifying columns pass through
//! untouched. Each column carries a kind inferred from its values (integer,
//! float or text), which decides how a cell is rendered as JSON.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::info;

use civicrank_common::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    /// Kind of a column from its cells. Empty cells are ignored, but an
    /// integer column with gaps becomes float.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut kind = ColumnKind::Integer;
        let mut seen = false;
        let mut has_gaps = false;
        for value in values {
            let value = value.trim();
            if value.is_empty() {
                has_gaps = true;
                continue;
            }
            seen = true;
            if kind == ColumnKind::Integer && value.parse::<i64>().is_err() {
                kind = ColumnKind::Float;
            }
            if kind == ColumnKind::Float && value.parse::<f64>().is_err() {
                return ColumnKind::Text;
            }
        }
        match (seen, kind, has_gaps) {
            (false, _, _) => ColumnKind::Text,
            (true, ColumnKind::Integer, true) => ColumnKind::Float,
            (true, kind, _) => kind,
        }
    }

    /// Render one cell as JSON. Empty and non-finite cells become null.
    pub fn to_json(self, value: &str) -> Value {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match self {
            ColumnKind::Integer => trimmed
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(value.to_string())),
            ColumnKind::Float => trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ColumnKind::Text => Value::String(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Text form used for derived numeric cells. Whole numbers keep a `.0` so
/// float columns read back as floats.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// A loaded CSV table.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    source: PathBuf,
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Load a dataset from a CSV file with a header row.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingInputFile {
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file, path)?;
        info!(path = %path.display(), rows = dataset.len(), "Loaded worker dataset");
        Ok(dataset)
    }

    /// Parse CSV from any reader. `source` is only used in error messages.
    pub fn from_reader<R: Read>(reader: R, source: &Path) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(idx, name)| Column {
                kind: ColumnKind::infer(rows.iter().map(|r| r[idx].as_str())),
                name,
            })
            .collect();

        Ok(Self {
            source: source.to_path_buf(),
            columns,
            rows,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| PipelineError::SchemaMismatch {
                column: name.to_string(),
                path: self.source.clone(),
            })
    }

    /// Parse every cell of a column as a finite number.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let cell = &cells[idx];
                cell.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| PipelineError::InvalidValue {
                        column: name.to_string(),
                        row,
                        value: cell.clone(),
                    })
            })
            .collect()
    }

    pub fn text_column(&self, name: &str) -> Result<Vec<String>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|cells| cells[idx].clone()).collect())
    }

    /// Replace a column's cells, or append it when absent.
    pub fn set_column(&mut self, name: &str, kind: ColumnKind, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.columns.iter().position(|c| c.name == name) {
            Some(idx) => {
                self.columns[idx].kind = kind;
                for (cells, value) in self.rows.iter_mut().zip(values) {
                    cells[idx] = value;
                }
            }
            None => {
                self.columns.push(Column {
                    name: name.to_string(),
                    kind,
                });
                for (cells, value) in self.rows.iter_mut().zip(values) {
                    cells.push(value);
                }
            }
        }
    }

    /// Overwrite a single cell of an existing column.
    pub fn set_cell(&mut self, row: usize, column: &str, value: String) -> Result<()> {
        let idx = self.column_index(column)?;
        self.rows[row][idx] = value;
        Ok(())
    }

    pub fn into_parts(self) -> (Vec<Column>, Vec<Vec<String>>) {
        (self.columns, self.rows)
    }
}

/// One row as an ordered JSON object.
pub fn row_to_json(columns: &[Column], cells: &[String]) -> Map<String, Value> {
    columns
        .iter()
        .zip(cells.iter())
        .map(|(col, cell)| (col.name.clone(), col.kind.to_json(cell)))
        .collect()
}

/// Write a header row followed by `rows`.
pub fn write_csv<'a, W: Write>(
    writer: W,
    columns: &[Column],
    rows: impl IntoIterator<Item = &'a [String]>,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(columns.iter().map(|c| c.name.as_str()))?;
    for row in rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const WORKERS: &str = "\
worker_id,name,tasks_completed,tasks_assigned,avg_difficulty,locality_rating,citizen_rating
w1,Asha,5,10,3.5,4,5
w2,Ravi,8,8,2,3,
";

    fn load() -> Dataset {
        Dataset::from_reader(WORKERS.as_bytes(), Path::new("workers.csv")).unwrap()
    }

    #[test]
    fn test_column_kinds_inferred() {
        let ds = load();
        let kinds: Vec<_> = ds.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Text,
                ColumnKind::Text,
                ColumnKind::Integer,
                ColumnKind::Integer,
                ColumnKind::Float,
                ColumnKind::Integer,
                ColumnKind::Float, // integer with a gap
            ]
        );
    }

    #[test]
    fn test_numeric_column() {
        let ds = load();
        assert_eq!(ds.numeric_column("avg_difficulty").unwrap(), vec![3.5, 2.0]);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let ds = load();
        let err = ds.numeric_column("assigned_tasks").unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { ref column, .. } if column == "assigned_tasks"));
    }

    #[test]
    fn test_empty_numeric_cell_is_invalid_value() {
        let ds = load();
        let err = ds.numeric_column("citizen_rating").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidValue { row: 1, .. }));
    }

    #[test]
    fn test_non_finite_cells_are_invalid_values() {
        let csv = "id,score\na,NaN\nb,inf\nc,-infinity\n";
        let ds = Dataset::from_reader(csv.as_bytes(), Path::new("x.csv")).unwrap();
        let err = ds.numeric_column("score").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidValue { row: 0, ref value, .. } if value == "NaN"));
    }

    #[test]
    fn test_format_float_keeps_float_form() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(12.5), "12.5");
        assert_eq!(format_float(-3.0), "-3.0");
    }

    #[test]
    fn test_set_column_appends_then_replaces() {
        let mut ds = load();
        ds.set_column("score", ColumnKind::Float, vec!["1.5".into(), "2".into()]);
        assert_eq!(ds.columns().last().unwrap().name, "score");
        ds.set_column("score", ColumnKind::Float, vec!["9".into(), "8".into()]);
        assert_eq!(ds.columns().len(), 8);
        assert_eq!(ds.rows()[0][7], "9");
    }

    #[test]
    fn test_row_to_json_uses_column_kinds() {
        let ds = load();
        let row = row_to_json(ds.columns(), &ds.rows()[1]);
        assert_eq!(
            Value::Object(row),
            json!({
                "worker_id": "w2",
                "name": "Ravi",
                "tasks_completed": 8,
                "tasks_assigned": 8,
                "avg_difficulty": 2.0,
                "locality_rating": 3,
                "citizen_rating": null
            })
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = Dataset::load(Path::new("/nonexistent/workers.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInputFile { .. }));
    }

    #[test]
    fn test_ragged_row_is_csv_error() {
        let err = Dataset::from_reader("a,b\n1\n".as_bytes(), Path::new("x.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Csv(_)));
    }

    #[test]
    fn test_write_csv_round_trip_header() {
        let ds = load();
        let mut out = Vec::new();
        write_csv(&mut out, ds.columns(), ds.rows().iter().map(|r| r.as_slice())).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("worker_id,name,tasks_completed"));
        assert!(text.contains("w1,Asha,5,10,3.5,4,5"));
    }
}
