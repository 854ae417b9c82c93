//! Per-atom self-correlation of scattering amplitudes.
//!
//! For one atom with positions `r(t)` and a wavevector `q` the amplitude is
//! `a(q, t) = exp(-i q.r(t))`. Its direct linear autocorrelation
//! `c(k) = sum_t a(t) conj(a(t - k))` is divided by the number of frame pairs
//! at each lag and scaled by the squared cross-section.

use std::borrow::Cow;

use nalgebra::DMatrix;
use nsc_core::errors::{ErrorInfo, NscError};
use nsc_core::{shape_error, Vec3, WavevectorSet};
use num_complex::Complex64;

use crate::lags::LagWeights;

/// Complex intensity matrix: one row per wavevector, one column per lag.
pub type Intensity = DMatrix<Complex64>;

fn correlate_error(code: &str, message: impl Into<String>) -> NscError {
    NscError::Correlate(ErrorInfo::new(code, message))
}

/// Amplitude series `exp(-i q.r(t))` of one atom for one wavevector.
pub fn amplitude_series(positions: &[Vec3], q: &Vec3) -> Result<Vec<Complex64>, NscError> {
    positions
        .iter()
        .enumerate()
        .map(|(frame, r)| {
            let phase = q.dot(r);
            if phase.is_finite() {
                Ok(Complex64::cis(-phase))
            } else {
                Err(correlate_error("non_finite_phase", "q.r is not finite").with_context("frame", frame))
            }
        })
        .collect()
}

/// Full linear autocorrelation without edge correction.
///
/// Entry `i` of the result is lag `i - (n - 1)`; the output has `2n - 1`
/// entries, or none for an empty series.
pub fn raw_autocorrelation(series: &[Complex64]) -> Vec<Complex64> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }
    let last = n as isize - 1;
    (0..2 * n - 1)
        .map(|idx| {
            let lag = idx as isize - last;
            let start = lag.max(0) as usize;
            let end = (n as isize + lag.min(0)) as usize;
            (start..end)
                .map(|t| series[t] * series[(t as isize - lag) as usize].conj())
                .sum()
        })
        .collect()
}

/// Correlates single atoms, reusing lag weights across calls with the same
/// frame count.
#[derive(Debug, Clone)]
pub struct AtomicCorrelator {
    lag_weights: LagWeights,
}

impl AtomicCorrelator {
    /// Prepares a correlator for trajectories with `n_frames` frames.
    pub fn new(n_frames: usize) -> Result<Self, NscError> {
        Ok(Self {
            lag_weights: LagWeights::new(n_frames)?,
        })
    }

    fn weights_for(&self, n_frames: usize) -> Result<Cow<'_, LagWeights>, NscError> {
        if n_frames == self.lag_weights.n_frames() {
            Ok(Cow::Borrowed(&self.lag_weights))
        } else {
            LagWeights::new(n_frames).map(Cow::Owned)
        }
    }

    /// Edge-corrected correlation over every lag, shape `(#q, 2 * #frames - 1)`.
    pub fn correlate_full(
        &self,
        positions: &[Vec3],
        weight: f64,
        wavevectors: &WavevectorSet,
    ) -> Result<Intensity, NscError> {
        if positions.is_empty() {
            return Err(shape_error("empty_series", "atom has no frames"));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(shape_error("invalid_weight", "weight must be finite and non-negative")
                .with_context("weight", weight));
        }
        let lag_weights = self.weights_for(positions.len())?;
        let width = lag_weights.as_slice().len();
        let mut out = Intensity::zeros(wavevectors.len(), width);
        if weight == 0.0 {
            return Ok(out);
        }
        let scale = weight * weight;
        for (row, q) in wavevectors.as_slice().iter().enumerate() {
            let series =
                amplitude_series(positions, q).map_err(|err| err.with_context("wavevector", row))?;
            let corr = raw_autocorrelation(&series);
            for (col, (value, w)) in corr.iter().zip(lag_weights.as_slice()).enumerate() {
                out[(row, col)] = *value * (w * scale);
            }
        }
        Ok(out)
    }

    /// Non-negative lags only, shape `(#q, #frames)`; column `k` is lag `k`.
    pub fn correlate(
        &self,
        positions: &[Vec3],
        weight: f64,
        wavevectors: &WavevectorSet,
    ) -> Result<Intensity, NscError> {
        let full = self.correlate_full(positions, weight, wavevectors)?;
        let n_frames = positions.len();
        let center = n_frames - 1;
        Ok(Intensity::from_fn(full.nrows(), n_frames, |row, col| {
            full[(row, center + col)]
        }))
    }
}

/// One-shot [`AtomicCorrelator::correlate`].
pub fn correlate(
    positions: &[Vec3],
    weight: f64,
    wavevectors: &WavevectorSet,
) -> Result<Intensity, NscError> {
    AtomicCorrelator::new(positions.len())?.correlate(positions, weight, wavevectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn raw_autocorrelation_matches_hand_sum() {
        let series = [c(1.0), c(2.0), c(3.0)];
        let corr = raw_autocorrelation(&series);
        let expected = [3.0, 8.0, 14.0, 8.0, 3.0];
        for (got, want) in corr.iter().zip(expected) {
            assert!((got.re - want).abs() < 1e-12);
            assert_eq!(got.im, 0.0);
        }
    }

    #[test]
    fn negative_lags_are_conjugates() {
        let series = [
            Complex64::cis(0.3),
            Complex64::cis(-1.1),
            Complex64::cis(2.0),
            Complex64::cis(0.7),
        ];
        let corr = raw_autocorrelation(&series);
        let n = series.len();
        for k in 1..n {
            let pos = corr[n - 1 + k];
            let neg = corr[n - 1 - k];
            assert!((pos - neg.conj()).norm() < 1e-12);
        }
    }

    #[test]
    fn single_frame_is_squared_weight() {
        let q = WavevectorSet::from_rows(&[[1.0, 2.0, 3.0]]).unwrap();
        let out = correlate(&[Vec3::new(0.4, -0.2, 1.0)], 1.5, &q).unwrap();
        assert_eq!(out.shape(), (1, 1));
        assert!((out[(0, 0)].re - 2.25).abs() < 1e-12);
    }

    #[test]
    fn mismatched_frame_count_recomputes_weights() {
        let correlator = AtomicCorrelator::new(2).unwrap();
        let q = WavevectorSet::from_rows(&[[0.0, 0.0, 0.0]]).unwrap();
        let out = correlator
            .correlate(&[Vec3::zeros(); 4], 1.0, &q)
            .unwrap();
        assert_eq!(out.shape(), (1, 4));
        assert!(out.iter().all(|v| (v.re - 1.0).abs() < 1e-12));
    }

    #[test]
    fn empty_positions_fail_fast() {
        let q = WavevectorSet::from_rows(&[[1.0, 0.0, 0.0]]).unwrap();
        assert!(matches!(correlate(&[], 1.0, &q), Err(NscError::Shape(_))));
    }
}
