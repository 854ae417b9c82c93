//! Inversion-symmetric wrapper.

use nsc_core::{NscError, WavevectorSet};

use crate::sampler::WavevectorSampler;

/// Adds `-q` after every `q` produced by the inner sampler.
///
/// The self-correlation at `-q` is the complex conjugate of the one at `q`,
/// so a mean over a symmetric set has an exactly vanishing imaginary part.
#[derive(Debug, Clone)]
pub struct SymmetricSampler<S> {
    inner: S,
}

impl<S> SymmetricSampler<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: WavevectorSampler> WavevectorSampler for SymmetricSampler<S> {
    fn sample(&self, magnitude: f64) -> Result<WavevectorSet, NscError> {
        let base = self.inner.sample(magnitude)?;
        let mut vectors = Vec::with_capacity(base.len() * 2);
        for q in base.into_vec() {
            vectors.push(q);
            vectors.push(-q);
        }
        WavevectorSet::new(vectors)
    }
}
