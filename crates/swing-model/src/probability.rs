//! Per-frame event-class probabilities produced by the swing classifier.
//!
//! The matrix has one row per video frame and `E + 1` columns: one column per
//! real swing event plus a trailing "no event" column. Rows are softmax output
//! and sum to (approximately) one.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A dense, row-major `T x C` probability matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixRows", into = "MatrixRows")]
pub struct ProbabilityMatrix {
    num_frames: usize,
    num_columns: usize,
    values: Vec<f64>,
}

/// On-disk form: `{"rows": [[p0, p1, ...], ...]}`. `null` entries read as NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MatrixRows {
    rows: Vec<Vec<Option<f64>>>,
}

impl ProbabilityMatrix {
    /// Build a matrix from rows. All rows must have the same width.
    ///
    /// An empty row list is accepted here; decoders reject it.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        let num_frames = rows.len();
        let num_columns = rows.first().map(Vec::len).unwrap_or(0);

        let mut values = Vec::with_capacity(num_frames * num_columns);
        for (t, row) in rows.into_iter().enumerate() {
            if row.len() != num_columns {
                return Err(ModelError::dimension(format!(
                    "row {t} has {} columns, expected {num_columns}",
                    row.len()
                )));
            }
            values.extend(row);
        }

        Ok(Self {
            num_frames,
            num_columns,
            values,
        })
    }

    /// Number of frames (rows).
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Number of columns, including the trailing "no event" class.
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Number of real event classes implied by the column count.
    pub fn num_events(&self) -> usize {
        self.num_columns.saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.num_frames == 0
    }

    /// Probability of class `column` at `frame`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, frame: usize, column: usize) -> f64 {
        assert!(column < self.num_columns, "column {column} out of bounds");
        self.values[frame * self.num_columns + column]
    }

    /// One row of the matrix.
    pub fn row(&self, frame: usize) -> &[f64] {
        let start = frame * self.num_columns;
        &self.values[start..start + self.num_columns]
    }

    /// Iterate a single column top to bottom.
    pub fn column(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .skip(column)
            .step_by(self.num_columns.max(1))
            .copied()
            .take(if column < self.num_columns {
                self.num_frames
            } else {
                0
            })
    }

    /// Largest absolute deviation of a row sum from 1.0 (ignoring non-finite rows).
    pub fn max_row_sum_error(&self) -> f64 {
        (0..self.num_frames)
            .map(|t| self.row(t).iter().sum::<f64>())
            .filter(|sum| sum.is_finite())
            .map(|sum| (sum - 1.0).abs())
            .fold(0.0, f64::max)
    }
}

impl TryFrom<MatrixRows> for ProbabilityMatrix {
    type Error = ModelError;

    fn try_from(raw: MatrixRows) -> Result<Self, Self::Error> {
        let rows = raw
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(crate::serde_nan::from_option).collect())
            .collect();
        Self::from_rows(rows)
    }
}

impl From<ProbabilityMatrix> for MatrixRows {
    fn from(matrix: ProbabilityMatrix) -> Self {
        let rows = (0..matrix.num_frames)
            .map(|t| {
                matrix
                    .row(t)
                    .iter()
                    .map(|&p| crate::serde_nan::to_option(p))
                    .collect()
            })
            .collect();
        Self { rows }
    }
}
