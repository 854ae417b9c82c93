//! Validated input containers: trajectories, weights and wavevector sets.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::errors::{shape_error, NscError};

/// Three dimensional vector used for positions and wavevectors.
pub type Vec3 = Vector3<f64>;

fn is_finite(vector: &Vec3) -> bool {
    vector.iter().all(|component| component.is_finite())
}

fn check_permutation(order: &[usize], len: usize) -> Result<(), NscError> {
    if order.len() != len {
        return Err(shape_error("permutation_length", "permutation length differs from atom count")
            .with_context("expected", len)
            .with_context("actual", order.len()));
    }
    let mut seen = vec![false; len];
    for &idx in order {
        if idx >= len || seen[idx] {
            return Err(shape_error("permutation_invalid", "order is not a permutation")
                .with_context("index", idx));
        }
        seen[idx] = true;
    }
    Ok(())
}

/// Per-atom position time series with logical shape `(#atoms, #frames, 3)`.
///
/// Positions are stored atom-major so that one atom's frames form a
/// contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    n_atoms: usize,
    n_frames: usize,
    positions: Vec<Vec3>,
}

impl Trajectory {
    /// Builds a trajectory from one position series per atom.
    pub fn new(atoms: Vec<Vec<Vec3>>) -> Result<Self, NscError> {
        let n_atoms = atoms.len();
        if n_atoms == 0 {
            return Err(shape_error("empty_trajectory", "trajectory has no atoms"));
        }
        let n_frames = atoms[0].len();
        if n_frames == 0 {
            return Err(shape_error("empty_trajectory", "trajectory has no frames"));
        }
        let mut positions = Vec::with_capacity(n_atoms * n_frames);
        for (atom, series) in atoms.into_iter().enumerate() {
            if series.len() != n_frames {
                return Err(shape_error("ragged_trajectory", "atoms have differing frame counts")
                    .with_context("atom", atom)
                    .with_context("expected", n_frames)
                    .with_context("actual", series.len()));
            }
            positions.extend(series);
        }
        Self::from_positions(n_atoms, n_frames, positions)
    }

    /// Builds a trajectory from a flat, atom-major `(#atoms, #frames, 3)` buffer.
    pub fn from_flat(n_atoms: usize, n_frames: usize, coords: &[f64]) -> Result<Self, NscError> {
        if n_atoms == 0 || n_frames == 0 {
            return Err(shape_error("empty_trajectory", "trajectory must have atoms and frames")
                .with_context("atoms", n_atoms)
                .with_context("frames", n_frames));
        }
        if coords.len() != n_atoms * n_frames * 3 {
            return Err(shape_error("flat_length", "coordinate buffer does not match shape")
                .with_context("expected", n_atoms * n_frames * 3)
                .with_context("actual", coords.len()));
        }
        let positions = coords
            .chunks_exact(3)
            .map(|xyz| Vec3::new(xyz[0], xyz[1], xyz[2]))
            .collect();
        Self::from_positions(n_atoms, n_frames, positions)
    }

    fn from_positions(
        n_atoms: usize,
        n_frames: usize,
        positions: Vec<Vec3>,
    ) -> Result<Self, NscError> {
        if let Some(idx) = positions.iter().position(|r| !is_finite(r)) {
            return Err(shape_error("non_finite_position", "trajectory contains non-finite coordinates")
                .with_context("atom", idx / n_frames)
                .with_context("frame", idx % n_frames));
        }
        Ok(Self {
            n_atoms,
            n_frames,
            positions,
        })
    }

    /// Number of atoms.
    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    /// Number of frames per atom.
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Positions of one atom across all frames.
    ///
    /// Panics when `atom >= n_atoms()`.
    pub fn atom(&self, atom: usize) -> &[Vec3] {
        let start = atom * self.n_frames;
        &self.positions[start..start + self.n_frames]
    }

    /// Iterates over per-atom position slices in atom order.
    pub fn atoms(&self) -> impl ExactSizeIterator<Item = &[Vec3]> + '_ {
        self.positions.chunks_exact(self.n_frames)
    }

    /// Returns a copy with the atom axis reordered so that atom `i` of the
    /// result is atom `order[i]` of `self`.
    pub fn permuted(&self, order: &[usize]) -> Result<Self, NscError> {
        check_permutation(order, self.n_atoms)?;
        let mut positions = Vec::with_capacity(self.positions.len());
        for &idx in order {
            positions.extend_from_slice(self.atom(idx));
        }
        Ok(Self {
            n_atoms: self.n_atoms,
            n_frames: self.n_frames,
            positions,
        })
    }
}

/// Per-atom scattering cross-sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weights(Vec<f64>);

impl Weights {
    /// Validates that every weight is finite and non-negative.
    pub fn new(values: Vec<f64>) -> Result<Self, NscError> {
        if values.is_empty() {
            return Err(shape_error("empty_weights", "weight vector is empty"));
        }
        if let Some(idx) = values.iter().position(|w| !w.is_finite() || *w < 0.0) {
            return Err(shape_error("invalid_weight", "weights must be finite and non-negative")
                .with_context("atom", idx)
                .with_context("value", values[idx]));
        }
        Ok(Self(values))
    }

    /// Uniform weights of one for `n_atoms` atoms.
    pub fn uniform(n_atoms: usize) -> Result<Self, NscError> {
        Self::new(vec![1.0; n_atoms])
    }

    /// Number of weights.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed value; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw weights.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Sum of squared weights, the global normalization constant.
    pub fn sum_of_squares(&self) -> f64 {
        self.0.iter().map(|w| w * w).sum()
    }

    /// Reorders the weights with the same convention as [`Trajectory::permuted`].
    pub fn permuted(&self, order: &[usize]) -> Result<Self, NscError> {
        check_permutation(order, self.0.len())?;
        Ok(Self(order.iter().map(|&idx| self.0[idx]).collect()))
    }
}

impl<'de> Deserialize<'de> for Weights {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = Vec::<f64>::deserialize(deserializer)?;
        Weights::new(values).map_err(serde::de::Error::custom)
    }
}

/// Non-empty ordered collection of wavevectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavevectorSet {
    vectors: Vec<Vec3>,
}

impl WavevectorSet {
    /// Validates that the set is non-empty and finite.
    pub fn new(vectors: Vec<Vec3>) -> Result<Self, NscError> {
        if vectors.is_empty() {
            return Err(shape_error("empty_wavevectors", "wavevector set is empty"));
        }
        if let Some(idx) = vectors.iter().position(|q| !is_finite(q)) {
            return Err(shape_error("non_finite_wavevector", "wavevector has non-finite components")
                .with_context("index", idx));
        }
        Ok(Self { vectors })
    }

    /// Builds a set from `[x, y, z]` rows.
    pub fn from_rows(rows: &[[f64; 3]]) -> Result<Self, NscError> {
        Self::new(rows.iter().map(|row| Vec3::from(*row)).collect())
    }

    /// Number of wavevectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Always false for a constructed value.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Borrow the vectors.
    pub fn as_slice(&self) -> &[Vec3] {
        &self.vectors
    }

    /// Consumes the set.
    pub fn into_vec(self) -> Vec<Vec3> {
        self.vectors
    }
}
