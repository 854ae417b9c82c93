//! Structured error types shared across nscsim crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`NscError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (atom index, shapes, magnitudes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

/// Canonical error type for the scattering pipeline.
///
/// Each variant names the stage that failed so a caller can tell a bad
/// argument apart from a pool failure or a degenerate normalization without
/// reading a backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum NscError {
    /// Argument and shape mismatches detected before any work is dispatched.
    #[error("shape error: {0}")]
    Shape(ErrorInfo),
    /// Failures while correlating a single atom.
    #[error("correlation error: {0}")]
    Correlate(ErrorInfo),
    /// Worker pool creation failures and worker panics.
    #[error("worker pool error: {0}")]
    Pool(ErrorInfo),
    /// Degenerate or non-finite normalization.
    #[error("normalization error: {0}")]
    Normalization(ErrorInfo),
    /// Failures raised by an averaging policy.
    #[error("averaging error: {0}")]
    Average(ErrorInfo),
    /// Failures raised by the wavevector sampler.
    #[error("sampling error: {0}")]
    Sampling(ErrorInfo),
    /// Imaginary residual of a shell average above the configured tolerance.
    #[error("imaginary residual error: {0}")]
    Imaginary(ErrorInfo),
    /// Serialization and configuration errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl NscError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            NscError::Shape(info)
            | NscError::Correlate(info)
            | NscError::Pool(info)
            | NscError::Normalization(info)
            | NscError::Average(info)
            | NscError::Sampling(info)
            | NscError::Imaginary(info)
            | NscError::Serde(info) => info,
        }
    }

    fn info_mut(&mut self) -> &mut ErrorInfo {
        match self {
            NscError::Shape(info)
            | NscError::Correlate(info)
            | NscError::Pool(info)
            | NscError::Normalization(info)
            | NscError::Average(info)
            | NscError::Sampling(info)
            | NscError::Imaginary(info)
            | NscError::Serde(info) => info,
        }
    }

    /// Short stage label used in logs and progress reports.
    pub fn stage(&self) -> &'static str {
        match self {
            NscError::Shape(_) => "validate",
            NscError::Correlate(_) => "correlate",
            NscError::Pool(_) => "pool",
            NscError::Normalization(_) => "normalize",
            NscError::Average(_) => "average",
            NscError::Sampling(_) => "sample",
            NscError::Imaginary(_) => "shell",
            NscError::Serde(_) => "serde",
        }
    }

    /// Attaches an extra context entry, keeping the variant intact.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.info_mut()
            .context
            .insert(key.into(), value.to_string());
        self
    }

    /// Re-labels the error as a sampling failure, keeping its payload.
    pub fn into_sampling(self) -> Self {
        match self {
            NscError::Sampling(info) => NscError::Sampling(info),
            other => NscError::Sampling(other.info().clone()),
        }
    }
}

/// Convenience constructor for [`NscError::Shape`].
pub fn shape_error(code: &str, message: impl Into<String>) -> NscError {
    NscError::Shape(ErrorInfo::new(code, message))
}
