//! Golden-spiral directions.

use std::f64::consts::PI;

use nsc_core::{NscError, Vec3, WavevectorSet};
use serde::{Deserialize, Serialize};

use crate::sampler::{count_error, origin_set, validate_magnitude, WavevectorSampler};

/// Deterministic, nearly uniform directions laid on a Fibonacci spiral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FibonacciSphere {
    /// Number of directions per shell.
    pub count: usize,
}

impl FibonacciSphere {
    /// Creates a sampler with `count` directions per shell.
    pub fn new(count: usize) -> Result<Self, NscError> {
        if count == 0 {
            return Err(count_error(count));
        }
        Ok(Self { count })
    }

    /// Unit directions without scaling.
    pub fn directions(&self) -> Vec<Vec3> {
        let golden_angle = PI * (3.0 - 5f64.sqrt());
        let n = self.count as f64;
        (0..self.count)
            .map(|idx| {
                let z = 1.0 - (2.0 * idx as f64 + 1.0) / n;
                let radius = (1.0 - z * z).max(0.0).sqrt();
                let phi = golden_angle * idx as f64;
                Vec3::new(radius * phi.cos(), radius * phi.sin(), z)
            })
            .collect()
    }
}

impl WavevectorSampler for FibonacciSphere {
    fn sample(&self, magnitude: f64) -> Result<WavevectorSet, NscError> {
        validate_magnitude(magnitude)?;
        if self.count == 0 {
            return Err(count_error(self.count));
        }
        if magnitude == 0.0 {
            return origin_set();
        }
        WavevectorSet::new(
            self.directions()
                .into_iter()
                .map(|dir| dir * magnitude)
                .collect(),
        )
    }
}
