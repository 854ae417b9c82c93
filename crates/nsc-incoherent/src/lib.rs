#![deny(missing_docs)]
#![doc = "Incoherent intermediate scattering function: per-atom amplitude self-correlation, parallel ensemble reduction, wavevector and shell averaging."]

pub mod average;
pub mod correlator;
pub mod lags;
pub mod opts;
pub mod reduce;
pub mod report;
pub mod shell;

pub use average::{average, intermediate, AveragingPolicy, AveragingSpec, Series, VectorAverager};
pub use correlator::{amplitude_series, correlate, raw_autocorrelation, AtomicCorrelator, Intensity};
pub use lags::LagWeights;
pub use opts::{ImaginaryPolicy, RunOpts};
pub use reduce::{reduce, resolve_worker_count, validate_ensemble, EnsembleReducer};
pub use report::ShellTable;
pub use shell::{shell_average, ShellAverager};

/// Crate version recorded in provenance maps.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
