//! Run options for shell averaging.

use nsc_core::errors::{ErrorInfo, NscError};
use nsc_core::serde::{from_json_slice, from_yaml_slice};
use nsc_core::stable_hash_string;
use nsc_qvec::SamplerSpec;
use serde::{Deserialize, Serialize};

use crate::average::AveragingSpec;

fn default_tolerance() -> f64 {
    1e-6
}

/// What to do with the imaginary part left after averaging a shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ImaginaryPolicy {
    /// Drop it without looking.
    Discard,
    /// Log a warning when the largest magnitude exceeds `tolerance`.
    Warn {
        /// Largest accepted `|Im|`.
        #[serde(default = "default_tolerance")]
        tolerance: f64,
    },
    /// Fail the call when the largest magnitude exceeds `tolerance`.
    Reject {
        /// Largest accepted `|Im|`.
        #[serde(default = "default_tolerance")]
        tolerance: f64,
    },
}

impl ImaginaryPolicy {
    /// Tolerance carried by `Warn` and `Reject`.
    pub fn tolerance(&self) -> Option<f64> {
        match *self {
            ImaginaryPolicy::Discard => None,
            ImaginaryPolicy::Warn { tolerance } | ImaginaryPolicy::Reject { tolerance } => Some(tolerance),
        }
    }

    /// Rejects a tolerance that is negative or not finite.
    pub fn validate(&self) -> Result<(), NscError> {
        match self.tolerance() {
            Some(tolerance) if !tolerance.is_finite() || tolerance < 0.0 => Err(NscError::Shape(
                ErrorInfo::new("invalid_tolerance", "imaginary tolerance must be finite and non-negative")
                    .with_context("tolerance", tolerance)
                    .with_hint("use `mode: discard` to skip the check"),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for ImaginaryPolicy {
    fn default() -> Self {
        ImaginaryPolicy::Warn {
            tolerance: default_tolerance(),
        }
    }
}

/// Options for a shell averaged run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunOpts {
    /// Worker count for each reduction; `None` uses cores minus one.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Handling of the discarded imaginary part.
    #[serde(default)]
    pub imaginary: ImaginaryPolicy,
    /// Wavevector sampler for each magnitude.
    #[serde(default)]
    pub sampler: SamplerSpec,
    /// Reduction over the wavevectors of a shell.
    #[serde(default)]
    pub averaging: AveragingSpec,
}

impl RunOpts {
    /// Parses options from JSON.
    pub fn from_json(data: &[u8]) -> Result<Self, NscError> {
        let opts: Self = from_json_slice(data)?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parses options from YAML.
    pub fn from_yaml(data: &[u8]) -> Result<Self, NscError> {
        let opts: Self = from_yaml_slice(data)?;
        opts.validate()?;
        Ok(opts)
    }

    /// Checks values the decoder cannot rule out on its own.
    pub fn validate(&self) -> Result<(), NscError> {
        self.imaginary.validate()
    }

    /// Stable hash of the options, recorded as provenance.
    pub fn config_hash(&self) -> Result<String, NscError> {
        stable_hash_string(self)
    }
}
