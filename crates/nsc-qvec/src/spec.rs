//! Serializable sampler selection.

use nsc_core::NscError;
use serde::{Deserialize, Serialize};

use crate::fibonacci::FibonacciSphere;
use crate::random::RandomSphere;
use crate::sampler::WavevectorSampler;
use crate::symmetric::SymmetricSampler;

fn default_count() -> usize {
    64
}

fn default_symmetric() -> bool {
    true
}

/// Sampler configuration as it appears in run options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplerSpec {
    /// Golden-spiral directions.
    Fibonacci {
        /// Directions per shell, before symmetrization.
        #[serde(default = "default_count")]
        count: usize,
        /// Adds the inverted set when true.
        #[serde(default = "default_symmetric")]
        symmetric: bool,
    },
    /// Seeded uniform random directions.
    Random {
        /// Directions per shell, before symmetrization.
        #[serde(default = "default_count")]
        count: usize,
        /// Master seed.
        #[serde(default)]
        seed: u64,
        /// Adds the inverted set when true.
        #[serde(default = "default_symmetric")]
        symmetric: bool,
    },
}

impl Default for SamplerSpec {
    fn default() -> Self {
        SamplerSpec::Fibonacci {
            count: default_count(),
            symmetric: default_symmetric(),
        }
    }
}

impl SamplerSpec {
    /// Instantiates the configured sampler.
    pub fn build(&self) -> Result<Box<dyn WavevectorSampler>, NscError> {
        log::debug!("building wavevector sampler {:?}", self);
        let sampler: Box<dyn WavevectorSampler> = match *self {
            SamplerSpec::Fibonacci { count, symmetric } => {
                let base = FibonacciSphere::new(count)?;
                if symmetric {
                    Box::new(SymmetricSampler::new(base))
                } else {
                    Box::new(base)
                }
            }
            SamplerSpec::Random {
                count,
                seed,
                symmetric,
            } => {
                let base = RandomSphere::new(count, seed)?;
                if symmetric {
                    Box::new(SymmetricSampler::new(base))
                } else {
                    Box::new(base)
                }
            }
        };
        Ok(sampler)
    }
}
