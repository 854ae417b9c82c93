//! The sampling contract consumed by shell averaging.

use nsc_core::errors::{ErrorInfo, NscError};
use nsc_core::{Vec3, WavevectorSet};

/// Produces a representative wavevector set for one magnitude.
///
/// Implementations must be pure functions of the magnitude: calling twice
/// with the same value returns the same set.
pub trait WavevectorSampler: Send + Sync {
    /// Returns wavevectors spread over the sphere of radius `magnitude`.
    fn sample(&self, magnitude: f64) -> Result<WavevectorSet, NscError>;
}

impl<F> WavevectorSampler for F
where
    F: Fn(f64) -> Result<WavevectorSet, NscError> + Send + Sync,
{
    fn sample(&self, magnitude: f64) -> Result<WavevectorSet, NscError> {
        self(magnitude)
    }
}

/// Rejects negative and non-finite magnitudes.
pub fn validate_magnitude(magnitude: f64) -> Result<(), NscError> {
    if !magnitude.is_finite() || magnitude < 0.0 {
        return Err(NscError::Sampling(
            ErrorInfo::new("invalid_magnitude", "magnitude must be finite and non-negative")
                .with_context("magnitude", magnitude),
        ));
    }
    Ok(())
}

pub(crate) fn count_error(count: usize) -> NscError {
    NscError::Sampling(
        ErrorInfo::new("invalid_count", "sampler needs at least one direction")
            .with_context("count", count),
    )
}

/// The degenerate shell: every direction collapses onto the origin.
pub(crate) fn origin_set() -> Result<WavevectorSet, NscError> {
    WavevectorSet::new(vec![Vec3::zeros()])
}
