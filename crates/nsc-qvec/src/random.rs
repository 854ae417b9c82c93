//! Seeded uniform directions.

use std::f64::consts::PI;

use nsc_core::{NscError, RngHandle, Vec3, WavevectorSet};
use serde::{Deserialize, Serialize};

use crate::sampler::{count_error, origin_set, validate_magnitude, WavevectorSampler};

/// Directions drawn uniformly on the sphere from a deterministic RNG.
///
/// The substream is keyed by the bit pattern of the magnitude, so each shell
/// gets independent directions while the sampler stays a pure function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomSphere {
    /// Number of directions per shell.
    pub count: usize,
    /// Master seed.
    pub seed: u64,
}

impl RandomSphere {
    /// Creates a sampler with `count` directions per shell.
    pub fn new(count: usize, seed: u64) -> Result<Self, NscError> {
        if count == 0 {
            return Err(count_error(count));
        }
        Ok(Self { count, seed })
    }
}

fn draw_direction(rng: &mut RngHandle) -> Vec3 {
    let z = rng.uniform(-1.0, 1.0);
    let phi = rng.uniform(0.0, 2.0 * PI);
    let radius = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(radius * phi.cos(), radius * phi.sin(), z)
}

impl WavevectorSampler for RandomSphere {
    fn sample(&self, magnitude: f64) -> Result<WavevectorSet, NscError> {
        validate_magnitude(magnitude)?;
        if self.count == 0 {
            return Err(count_error(self.count));
        }
        if magnitude == 0.0 {
            return origin_set();
        }
        let mut rng = RngHandle::for_substream(self.seed, magnitude.to_bits());
        WavevectorSet::new(
            (0..self.count)
                .map(|_| draw_direction(&mut rng) * magnitude)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_magnitude_same_set() {
        let sampler = RandomSphere::new(16, 42).unwrap();
        assert_eq!(sampler.sample(1.5).unwrap(), sampler.sample(1.5).unwrap());
        assert_ne!(
            sampler.sample(1.5).unwrap().as_slice()[0].normalize(),
            sampler.sample(2.5).unwrap().as_slice()[0].normalize()
        );
    }
}
