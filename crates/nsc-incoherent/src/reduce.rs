//! Parallel map-reduce of per-atom intensities.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use nsc_core::errors::{ErrorInfo, NscError};
use nsc_core::{shape_error, NoProgress, ProgressSink, Stage, Trajectory, Vec3, WavevectorSet, Weights};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::correlator::{AtomicCorrelator, Intensity};

fn pool_error(code: &str, err: impl ToString) -> NscError {
    NscError::Pool(ErrorInfo::new(code, err.to_string()))
}

fn normalization_error(code: &str, message: impl Into<String>) -> NscError {
    NscError::Normalization(ErrorInfo::new(code, message))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Resolves the worker count: all available cores minus one, never below one.
///
/// `Some(0)` is a usage error rather than a request for the default.
pub fn resolve_worker_count(requested: Option<usize>) -> Result<usize, NscError> {
    match requested {
        Some(0) => Err(NscError::Shape(
            ErrorInfo::new("worker_count", "worker count must be positive")
                .with_hint("pass None to use the default policy"),
        )),
        Some(count) => Ok(count),
        None => {
            let available = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            Ok(available.saturating_sub(1).max(1))
        }
    }
}

/// Checks atom counts and the normalization constant before any work is
/// dispatched. Returns the sum of squared weights.
pub fn validate_ensemble(trajectory: &Trajectory, weights: &Weights) -> Result<f64, NscError> {
    if trajectory.n_atoms() != weights.len() {
        return Err(shape_error("weight_count", "weight count does not match atom count")
            .with_context("atoms", trajectory.n_atoms())
            .with_context("weights", weights.len()));
    }
    let norm = weights.sum_of_squares();
    if !norm.is_finite() || norm <= 0.0 {
        return Err(normalization_error(
            "zero_norm",
            "sum of squared weights must be positive and finite",
        )
        .with_context("sum_of_squares", norm));
    }
    Ok(norm)
}

/// Sums per-atom intensities over a short-lived worker pool and divides by
/// the sum of squared weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsembleReducer {
    workers: usize,
}

impl EnsembleReducer {
    /// Creates a reducer; `None` selects the default worker policy.
    pub fn new(workers: Option<usize>) -> Result<Self, NscError> {
        Ok(Self {
            workers: resolve_worker_count(workers)?,
        })
    }

    /// Number of workers each pool is built with.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Normalized intensity over non-negative lags, shape `(#q, #frames)`.
    pub fn reduce(
        &self,
        trajectory: &Trajectory,
        weights: &Weights,
        wavevectors: &WavevectorSet,
        progress: &dyn ProgressSink,
    ) -> Result<Intensity, NscError> {
        self.map_reduce(
            trajectory,
            weights,
            wavevectors,
            trajectory.n_frames(),
            progress,
            |correlator, positions, weight| correlator.correlate(positions, weight, wavevectors),
        )
    }

    /// Normalized intensity over all lags, shape `(#q, 2 * #frames - 1)`.
    pub fn reduce_full(
        &self,
        trajectory: &Trajectory,
        weights: &Weights,
        wavevectors: &WavevectorSet,
        progress: &dyn ProgressSink,
    ) -> Result<Intensity, NscError> {
        self.map_reduce(
            trajectory,
            weights,
            wavevectors,
            2 * trajectory.n_frames() - 1,
            progress,
            |correlator, positions, weight| correlator.correlate_full(positions, weight, wavevectors),
        )
    }

    fn map_reduce<F>(
        &self,
        trajectory: &Trajectory,
        weights: &Weights,
        wavevectors: &WavevectorSet,
        width: usize,
        progress: &dyn ProgressSink,
        per_atom: F,
    ) -> Result<Intensity, NscError>
    where
        F: Fn(&AtomicCorrelator, &[Vec3], f64) -> Result<Intensity, NscError> + Sync,
    {
        let norm = validate_ensemble(trajectory, weights)?;
        let correlator = AtomicCorrelator::new(trajectory.n_frames())?;
        let rows = wavevectors.len();
        let n_atoms = trajectory.n_atoms();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|idx| format!("nsc-incoherent-{idx}"))
            .build()
            .map_err(|err| pool_error("thread_pool", err))?;
        log::info!(
            "correlating {n_atoms} atoms over {rows} wavevectors with {} workers",
            self.workers
        );
        progress.on_stage_start(Stage::Reduce, n_atoms);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pool.install(|| {
                (0..n_atoms)
                    .into_par_iter()
                    .map(|atom| -> Result<Intensity, NscError> {
                        let weight = weights.as_slice()[atom];
                        let contribution = per_atom(&correlator, trajectory.atom(atom), weight)
                            .map_err(|err| err.with_context("atom", atom))?;
                        progress.on_atom_done(atom);
                        Ok(contribution)
                    })
                    .try_reduce(
                        || Intensity::zeros(rows, width),
                        |mut acc, contribution| {
                            acc += contribution;
                            Ok(acc)
                        },
                    )
            })
        }));
        drop(pool);

        let mut summed = match outcome {
            Ok(result) => result?,
            Err(payload) => {
                return Err(pool_error("worker_panic", panic_message(payload))
                    .with_context("atoms", n_atoms));
            }
        };
        summed.apply(|value| *value /= norm);
        if summed.iter().any(|value| !is_finite(value)) {
            return Err(normalization_error(
                "non_finite_intensity",
                "normalized intensity contains non-finite values",
            )
            .with_context("sum_of_squares", norm));
        }
        log::debug!("reduced intensity shape {:?}", summed.shape());
        Ok(summed)
    }
}

fn is_finite(value: &Complex64) -> bool {
    value.re.is_finite() && value.im.is_finite()
}

/// Reduces with an optional worker count and no progress reporting.
pub fn reduce(
    trajectory: &Trajectory,
    weights: &Weights,
    wavevectors: &WavevectorSet,
    workers: Option<usize>,
) -> Result<Intensity, NscError> {
    EnsembleReducer::new(workers)?.reduce(trajectory, weights, wavevectors, &NoProgress)
}
