#![deny(missing_docs)]
#![doc = "Core types, errors and helpers shared by the nscsim scattering crates."]

pub mod errors;
pub mod hash;
pub mod progress;
pub mod provenance;
pub mod rng;
pub mod serde;
mod types;

pub use errors::{shape_error, ErrorInfo, NscError};
pub use hash::stable_hash_string;
pub use progress::{CountingProgress, NoProgress, ProgressSink, Stage};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};
pub use types::{Trajectory, Vec3, WavevectorSet, Weights};

/// Crate version recorded in provenance maps.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
