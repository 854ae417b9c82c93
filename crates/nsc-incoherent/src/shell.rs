//! Spherical-shell averaging over wavevector magnitudes.

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use nsc_core::errors::{ErrorInfo, NscError};
use nsc_core::{NoProgress, ProgressSink, RunProvenance, SchemaVersion, Stage, Trajectory, Weights};
use nsc_qvec::WavevectorSampler;

use crate::average::{AveragingPolicy, Series, VectorAverager};
use crate::opts::{ImaginaryPolicy, RunOpts};
use crate::reduce::{validate_ensemble, EnsembleReducer};
use crate::report::ShellTable;

fn largest_imaginary(series: &Series) -> f64 {
    series
        .iter()
        .map(|value| value.im.abs())
        .fold(0.0, f64::max)
}

/// Runs the reduce-then-average pipeline once per magnitude and keeps the
/// real part of each averaged series.
pub struct ShellAverager {
    sampler: Box<dyn WavevectorSampler>,
    averager: VectorAverager,
    imaginary: ImaginaryPolicy,
    config_hash: String,
}

impl std::fmt::Debug for ShellAverager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellAverager")
            .field("averager", &self.averager)
            .field("imaginary", &self.imaginary)
            .finish_non_exhaustive()
    }
}

impl ShellAverager {
    /// Mean over each shell, default imaginary handling.
    pub fn new<S>(sampler: S, workers: Option<usize>) -> Result<Self, NscError>
    where
        S: WavevectorSampler + 'static,
    {
        Ok(Self {
            sampler: Box::new(sampler),
            averager: VectorAverager::new(EnsembleReducer::new(workers)?, AveragingPolicy::Mean),
            imaginary: ImaginaryPolicy::default(),
            config_hash: String::new(),
        })
    }

    /// Builds the sampler and policies described by `opts`.
    pub fn from_opts(opts: &RunOpts) -> Result<Self, NscError> {
        opts.validate()?;
        Ok(Self {
            sampler: opts.sampler.build()?,
            averager: VectorAverager::new(
                EnsembleReducer::new(opts.workers)?,
                opts.averaging.into(),
            ),
            imaginary: opts.imaginary,
            config_hash: opts.config_hash()?,
        })
    }

    /// Replaces the averaging policy.
    pub fn with_policy(mut self, policy: AveragingPolicy) -> Self {
        self.averager = VectorAverager::new(*self.averager.reducer(), policy);
        self
    }

    /// Replaces the imaginary-part handling.
    pub fn with_imaginary(mut self, imaginary: ImaginaryPolicy) -> Result<Self, NscError> {
        imaginary.validate()?;
        self.imaginary = imaginary;
        Ok(self)
    }

    fn check_imaginary(&self, index: usize, magnitude: f64, residual: f64) -> Result<(), NscError> {
        match self.imaginary {
            ImaginaryPolicy::Discard => Ok(()),
            ImaginaryPolicy::Warn { tolerance } => {
                if residual > tolerance {
                    log::warn!(
                        "shell {index} (|q| = {magnitude}) keeps imaginary residual {residual:e} above {tolerance:e}"
                    );
                }
                Ok(())
            }
            ImaginaryPolicy::Reject { tolerance } => {
                if residual > tolerance {
                    Err(NscError::Imaginary(
                        ErrorInfo::new("imaginary_residual", "shell average is not real")
                            .with_context("magnitude_index", index)
                            .with_context("magnitude", magnitude)
                            .with_context("residual", residual)
                            .with_context("tolerance", tolerance)
                            .with_hint("use an inversion-symmetric wavevector sampler"),
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Computes one row per magnitude, in input order.
    pub fn run(
        &self,
        trajectory: &Trajectory,
        weights: &Weights,
        magnitudes: &[f64],
        progress: &dyn ProgressSink,
    ) -> Result<ShellTable, NscError> {
        validate_ensemble(trajectory, weights)?;
        progress.on_stage_start(Stage::Shell, magnitudes.len());

        let mut rows = Vec::with_capacity(magnitudes.len());
        let mut imaginary_residuals = Vec::with_capacity(magnitudes.len());
        let mut shell_sizes = Vec::with_capacity(magnitudes.len());
        for (index, &magnitude) in magnitudes.iter().enumerate() {
            log::info!("shell {}/{}: |q| = {magnitude}", index + 1, magnitudes.len());
            let wavevectors = self.sampler.sample(magnitude).map_err(|err| {
                err.into_sampling()
                    .with_context("magnitude_index", index)
                    .with_context("magnitude", magnitude)
            })?;
            let series = self
                .averager
                .run(trajectory, weights, &wavevectors, progress)
                .map_err(|err| err.with_context("magnitude_index", index))?;
            let residual = largest_imaginary(&series);
            self.check_imaginary(index, magnitude, residual)?;

            shell_sizes.push(wavevectors.len());
            imaginary_residuals.push(residual);
            rows.push(series.iter().map(|value| value.re).collect());
            progress.on_magnitude_done(index, magnitude);
        }

        let mut tool_versions = BTreeMap::new();
        tool_versions.insert("nsc-incoherent".to_string(), crate::VERSION.to_string());
        tool_versions.insert("nsc-core".to_string(), nsc_core::VERSION.to_string());
        Ok(ShellTable {
            magnitudes: magnitudes.to_vec(),
            n_frames: trajectory.n_frames(),
            rows,
            imaginary_residuals,
            shell_sizes,
            provenance: RunProvenance {
                schema_version: SchemaVersion::default(),
                config_hash: self.config_hash.clone(),
                n_atoms: trajectory.n_atoms(),
                n_frames: trajectory.n_frames(),
                workers: self.averager.reducer().workers(),
                tool_versions,
            },
        })
    }
}

/// Shell-averaged intensity as a `(#magnitudes, #frames)` matrix.
pub fn shell_average<S>(
    trajectory: &Trajectory,
    magnitudes: &[f64],
    weights: &Weights,
    sampler: S,
    workers: Option<usize>,
) -> Result<DMatrix<f64>, NscError>
where
    S: WavevectorSampler + 'static,
{
    let table = ShellAverager::new(sampler, workers)?.run(trajectory, weights, magnitudes, &NoProgress)?;
    table.as_matrix()
}
