//! Progress observers invoked by the pipeline.
//!
//! The pipeline never prints; callers that want a progress bar or a log line
//! per shell plug in a [`ProgressSink`].

use std::sync::atomic::{AtomicUsize, Ordering};

/// Pipeline stage reported to a [`ProgressSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Per-atom correlation fan-out.
    Reduce,
    /// Shell loop over wavevector magnitudes.
    Shell,
}

/// Observer for long running computations.
///
/// Atom callbacks fire from worker threads in completion order, hence the
/// `Send + Sync` bound.
pub trait ProgressSink: Send + Sync {
    /// Called once before a stage starts with the number of work units.
    fn on_stage_start(&self, _stage: Stage, _total: usize) {}

    /// Called after one atom's contribution has been computed.
    fn on_atom_done(&self, _atom: usize) {}

    /// Called after one magnitude shell has been appended to the table.
    fn on_magnitude_done(&self, _index: usize, _magnitude: f64) {}
}

/// Sink that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Sink that counts events; handy for tests and coarse reporting.
#[derive(Debug, Default)]
pub struct CountingProgress {
    atoms: AtomicUsize,
    magnitudes: AtomicUsize,
    stages: AtomicUsize,
}

impl CountingProgress {
    /// Number of completed atom work units.
    pub fn atoms(&self) -> usize {
        self.atoms.load(Ordering::Relaxed)
    }

    /// Number of completed magnitude shells.
    pub fn magnitudes(&self) -> usize {
        self.magnitudes.load(Ordering::Relaxed)
    }

    /// Number of stage starts observed.
    pub fn stages(&self) -> usize {
        self.stages.load(Ordering::Relaxed)
    }
}

impl ProgressSink for CountingProgress {
    fn on_stage_start(&self, _stage: Stage, _total: usize) {
        self.stages.fetch_add(1, Ordering::Relaxed);
    }

    fn on_atom_done(&self, _atom: usize) {
        self.atoms.fetch_add(1, Ordering::Relaxed);
    }

    fn on_magnitude_done(&self, _index: usize, _magnitude: f64) {
        self.magnitudes.fetch_add(1, Ordering::Relaxed);
    }
}
