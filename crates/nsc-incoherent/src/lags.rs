//! Edge correction for linear autocorrelations.

use nsc_core::{shape_error, NscError};

/// Reciprocal overlap counts for every lag of a linear autocorrelation.
///
/// For `n` frames the lags run from `-(n - 1)` to `n - 1`; entry `i` covers
/// lag `i - (n - 1)` and holds `1 / (n - |lag|)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LagWeights {
    n_frames: usize,
    weights: Vec<f64>,
}

impl LagWeights {
    /// Builds the weights for `n_frames` frames.
    pub fn new(n_frames: usize) -> Result<Self, NscError> {
        if n_frames == 0 {
            return Err(shape_error("empty_series", "lag weights need at least one frame"));
        }
        let center = n_frames - 1;
        let weights = (0..2 * n_frames - 1)
            .map(|idx| {
                let overlap = n_frames - idx.abs_diff(center);
                1.0 / overlap as f64
            })
            .collect();
        Ok(Self { n_frames, weights })
    }

    /// Frame count the weights were built for.
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Index of lag zero.
    pub fn center(&self) -> usize {
        self.n_frames - 1
    }

    /// All `2 * n_frames - 1` weights.
    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    /// Weight for a signed lag.
    pub fn at_lag(&self, lag: isize) -> Option<f64> {
        let idx = self.center() as isize + lag;
        usize::try_from(idx)
            .ok()
            .and_then(|idx| self.weights.get(idx).copied())
    }
}
