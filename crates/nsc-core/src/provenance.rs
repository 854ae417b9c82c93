//! Provenance descriptors attached to serialized results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic version describing the schema of serialized payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Inputs and settings a result was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Schema of the enclosing payload.
    pub schema_version: SchemaVersion,
    /// Stable hash of the run options, empty when none were supplied.
    pub config_hash: String,
    /// Number of atoms in the trajectory.
    pub n_atoms: usize,
    /// Number of frames in the trajectory.
    pub n_frames: usize,
    /// Worker count actually used by the reducer.
    pub workers: usize,
    /// Version map for the crates involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}
