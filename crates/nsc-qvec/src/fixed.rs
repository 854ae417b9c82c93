//! Caller supplied directions.

use nsc_core::errors::{ErrorInfo, NscError};
use nsc_core::{Vec3, WavevectorSet};

use crate::sampler::{origin_set, validate_magnitude, WavevectorSampler};

/// Fixed direction list rescaled to each requested magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSet {
    directions: Vec<Vec3>,
}

impl FixedSet {
    /// Normalizes `directions`; zero or non-finite entries are rejected.
    pub fn new(directions: Vec<Vec3>) -> Result<Self, NscError> {
        if directions.is_empty() {
            return Err(NscError::Sampling(ErrorInfo::new(
                "empty_directions",
                "fixed sampler needs at least one direction",
            )));
        }
        let mut units = Vec::with_capacity(directions.len());
        for (idx, dir) in directions.iter().enumerate() {
            let norm = dir.norm();
            if !norm.is_finite() || norm == 0.0 {
                return Err(NscError::Sampling(
                    ErrorInfo::new("degenerate_direction", "direction must be finite and non-zero")
                        .with_context("index", idx),
                ));
            }
            units.push(dir / norm);
        }
        Ok(Self { directions: units })
    }

    /// Unit directions.
    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }
}

impl WavevectorSampler for FixedSet {
    fn sample(&self, magnitude: f64) -> Result<WavevectorSet, NscError> {
        validate_magnitude(magnitude)?;
        if magnitude == 0.0 {
            return origin_set();
        }
        WavevectorSet::new(self.directions.iter().map(|dir| dir * magnitude).collect())
    }
}
