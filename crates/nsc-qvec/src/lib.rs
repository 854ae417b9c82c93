#![deny(missing_docs)]
#![doc = "Wavevector sets approximately uniform on spheres of fixed magnitude."]

pub mod fibonacci;
pub mod fixed;
pub mod random;
pub mod sampler;
pub mod spec;
pub mod symmetric;

pub use fibonacci::FibonacciSphere;
pub use fixed::FixedSet;
pub use random::RandomSphere;
pub use sampler::{validate_magnitude, WavevectorSampler};
pub use spec::SamplerSpec;
pub use symmetric::SymmetricSampler;
