//! Collapsing the wavevector axis of an ensemble intensity.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;
use nsc_core::errors::{ErrorInfo, NscError};
use nsc_core::{NoProgress, ProgressSink, Trajectory, WavevectorSet, Weights};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::correlator::Intensity;
use crate::reduce::EnsembleReducer;

/// Averaged series indexed by lag.
pub type Series = DVector<Complex64>;

/// Signature of a caller supplied reduction over the wavevector axis.
///
/// Extra arguments a reduction needs are captured by the closure.
pub type AverageFn = dyn Fn(&Intensity) -> Result<Series, NscError> + Send + Sync;

fn average_error(code: &str, message: impl Into<String>) -> NscError {
    NscError::Average(ErrorInfo::new(code, message))
}

/// How rows (wavevectors) of an intensity matrix are combined.
#[derive(Clone, Default)]
pub enum AveragingPolicy {
    /// Unweighted arithmetic mean.
    #[default]
    Mean,
    /// Mean weighted by one factor per wavevector, divided by the factor sum.
    Weighted(Vec<f64>),
    /// Median of the real and imaginary parts taken separately.
    Median,
    /// Arbitrary reduction.
    Custom(Arc<AverageFn>),
}

impl AveragingPolicy {
    /// Wraps a closure as a custom policy.
    pub fn custom<F>(reduction: F) -> Self
    where
        F: Fn(&Intensity) -> Result<Series, NscError> + Send + Sync + 'static,
    {
        AveragingPolicy::Custom(Arc::new(reduction))
    }

    fn name(&self) -> &'static str {
        match self {
            AveragingPolicy::Mean => "mean",
            AveragingPolicy::Weighted(_) => "weighted",
            AveragingPolicy::Median => "median",
            AveragingPolicy::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for AveragingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AveragingPolicy::Weighted(weights) => f.debug_tuple("Weighted").field(weights).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// Serializable subset of [`AveragingPolicy`] used in run options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AveragingSpec {
    /// See [`AveragingPolicy::Mean`].
    #[default]
    Mean,
    /// See [`AveragingPolicy::Median`].
    Median,
}

impl From<AveragingSpec> for AveragingPolicy {
    fn from(spec: AveragingSpec) -> Self {
        match spec {
            AveragingSpec::Mean => AveragingPolicy::Mean,
            AveragingSpec::Median => AveragingPolicy::Median,
        }
    }
}

fn column_mean(intensity: &Intensity) -> Series {
    let rows = intensity.nrows() as f64;
    Series::from_iterator(
        intensity.ncols(),
        intensity
            .column_iter()
            .map(|column| column.iter().copied().sum::<Complex64>() / rows),
    )
}

fn column_weighted(intensity: &Intensity, weights: &[f64]) -> Result<Series, NscError> {
    if weights.len() != intensity.nrows() {
        return Err(average_error("weight_count", "one averaging weight per wavevector required")
            .with_context("weights", weights.len())
            .with_context("wavevectors", intensity.nrows()));
    }
    let total: f64 = weights.iter().sum();
    if weights.iter().any(|w| !w.is_finite()) || total == 0.0 || !total.is_finite() {
        return Err(average_error("degenerate_weights", "averaging weights must be finite with a non-zero sum")
            .with_context("sum", total));
    }
    Ok(Series::from_iterator(
        intensity.ncols(),
        intensity.column_iter().map(|column| {
            column
                .iter()
                .zip(weights)
                .map(|(value, w)| *value * *w)
                .sum::<Complex64>()
                / total
        }),
    ))
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}

fn column_median(intensity: &Intensity) -> Series {
    Series::from_iterator(
        intensity.ncols(),
        intensity.column_iter().map(|column| {
            let mut re: Vec<f64> = column.iter().map(|value| value.re).collect();
            let mut im: Vec<f64> = column.iter().map(|value| value.im).collect();
            Complex64::new(median(&mut re), median(&mut im))
        }),
    )
}

/// Applies `policy` to collapse the wavevector axis; no further normalization.
pub fn average(intensity: &Intensity, policy: &AveragingPolicy) -> Result<Series, NscError> {
    if intensity.nrows() == 0 {
        return Err(average_error("empty_axis", "cannot average over zero wavevectors"));
    }
    let series = match policy {
        AveragingPolicy::Mean => column_mean(intensity),
        AveragingPolicy::Weighted(weights) => column_weighted(intensity, weights)?,
        AveragingPolicy::Median => column_median(intensity),
        AveragingPolicy::Custom(reduction) => reduction(intensity)?,
    };
    if series.len() != intensity.ncols() {
        return Err(average_error("series_length", "averaged series length differs from lag count")
            .with_context("policy", policy.name())
            .with_context("expected", intensity.ncols())
            .with_context("actual", series.len()));
    }
    if series.iter().any(|value| !value.re.is_finite() || !value.im.is_finite()) {
        return Err(average_error("non_finite_average", "averaged series contains non-finite values")
            .with_context("policy", policy.name()));
    }
    Ok(series)
}

/// Reduces an ensemble over one wavevector set and averages the result.
#[derive(Debug, Clone)]
pub struct VectorAverager {
    reducer: EnsembleReducer,
    policy: AveragingPolicy,
}

impl VectorAverager {
    /// Combines a reducer with an averaging policy.
    pub fn new(reducer: EnsembleReducer, policy: AveragingPolicy) -> Self {
        Self { reducer, policy }
    }

    /// The reducer used for each call.
    pub fn reducer(&self) -> &EnsembleReducer {
        &self.reducer
    }

    /// The averaging policy used for each call.
    pub fn policy(&self) -> &AveragingPolicy {
        &self.policy
    }

    /// Averaged intensity as a function of lag, length `#frames`.
    pub fn run(
        &self,
        trajectory: &Trajectory,
        weights: &Weights,
        wavevectors: &WavevectorSet,
        progress: &dyn ProgressSink,
    ) -> Result<Series, NscError> {
        let intensity = self
            .reducer
            .reduce(trajectory, weights, wavevectors, progress)?;
        average(&intensity, &self.policy)
    }
}

/// Incoherent intermediate scattering function averaged over `wavevectors`.
pub fn intermediate(
    trajectory: &Trajectory,
    weights: &Weights,
    wavevectors: &WavevectorSet,
    workers: Option<usize>,
    policy: AveragingPolicy,
) -> Result<Series, NscError> {
    VectorAverager::new(EnsembleReducer::new(workers)?, policy).run(
        trajectory,
        weights,
        wavevectors,
        &NoProgress,
    )
}
