//! Magnitude-indexed result table.

use nalgebra::DMatrix;
use nsc_core::errors::{ErrorInfo, NscError};
use nsc_core::serde::{from_json_slice, to_canonical_json_bytes};
use nsc_core::RunProvenance;
use serde::{Deserialize, Serialize};

/// Real part of the shell-averaged intensity, one row per magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellTable {
    /// Requested magnitudes in input order.
    pub magnitudes: Vec<f64>,
    /// Row length.
    pub n_frames: usize,
    /// Intensity rows, `rows[i][k]` is magnitude `i` at lag `k`.
    pub rows: Vec<Vec<f64>>,
    /// Largest `|Im|` per row before it was discarded.
    pub imaginary_residuals: Vec<f64>,
    /// Number of wavevectors sampled for each magnitude.
    pub shell_sizes: Vec<usize>,
    /// Inputs and settings the table was computed from.
    pub provenance: RunProvenance,
}

impl ShellTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no magnitudes were requested.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One row by index.
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    fn check_shape(&self) -> Result<(), ErrorInfo> {
        let rows = self.rows.len();
        for (field, len) in [
            ("magnitudes", self.magnitudes.len()),
            ("imaginary_residuals", self.imaginary_residuals.len()),
            ("shell_sizes", self.shell_sizes.len()),
        ] {
            if len != rows {
                return Err(ErrorInfo::new("table_shape", "table columns disagree on the row count")
                    .with_context("field", field)
                    .with_context("expected", rows)
                    .with_context("found", len));
            }
        }
        if let Some(index) = self.rows.iter().position(|row| row.len() != self.n_frames) {
            return Err(ErrorInfo::new("table_shape", "row length differs from n_frames")
                .with_context("row", index)
                .with_context("expected", self.n_frames)
                .with_context("found", self.rows[index].len()));
        }
        Ok(())
    }

    /// Dense `(#magnitudes, #frames)` matrix.
    pub fn as_matrix(&self) -> Result<DMatrix<f64>, NscError> {
        self.check_shape().map_err(NscError::Shape)?;
        Ok(DMatrix::from_fn(self.rows.len(), self.n_frames, |row, col| self.rows[row][col]))
    }

    /// Canonical JSON encoding.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, NscError> {
        to_canonical_json_bytes(self)
    }

    /// Decodes a table written by [`ShellTable::to_json_bytes`].
    pub fn from_json_bytes(data: &[u8]) -> Result<Self, NscError> {
        let table: Self = from_json_slice(data)?;
        table.check_shape().map_err(NscError::Serde)?;
        Ok(table)
    }
}
