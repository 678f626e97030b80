//! Error types for the tuneta crate.
//!
//! All fallible operations in the crate return [`Result<T>`], which is an
//! alias for `core::result::Result<T, Error>`. Only [`Error::Execution`],
//! [`Error::Shape`] and alignment failures ([`Error::InvalidFrame`],
//! [`Error::Polars`]) are raised by a running search; every other variant is
//! returned while validating inputs before or after the search.
//!
//! A trial whose indicator output is mostly missing is *not* an error: it is
//! reported as [`Evaluation::Rejected`](crate::Evaluation::Rejected) and the
//! search continues. Likewise, early stopping is signalled with
//! [`ControlFlow::Break`](core::ops::ControlFlow::Break), not an error.

/// Errors returned by tuneta operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The indicator raised while computing a trial. This aborts the fit.
    #[error("indicator '{indicator}' failed: {reason}")]
    Execution {
        /// The indicator name.
        indicator: String,
        /// What went wrong.
        reason: String,
    },

    /// The indicator produced a column whose row count differs from the
    /// feature frame's. This aborts the fit.
    #[error("indicator '{indicator}' returned {got} rows, expected {expected}")]
    Shape {
        /// The indicator name.
        indicator: String,
        /// The feature frame's row count.
        expected: usize,
        /// The row count of the selected output column.
        got: usize,
    },

    /// Two sequences that must line up have different lengths.
    #[error("length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        /// Which input was mismatched.
        what: &'static str,
        /// The expected length.
        expected: usize,
        /// The actual length.
        got: usize,
    },

    /// Segment boundaries are not strictly increasing, fewer than two, or
    /// point past the end of the target.
    #[error("invalid segment boundaries: {0}")]
    InvalidSegments(String),

    /// The lower bound exceeds the upper bound in a float or integer
    /// parameter.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// The step size provided to a parameter is not positive.
    #[error("invalid step: step must be positive")]
    InvalidStep,

    /// A categorical parameter was declared with no choices.
    #[error("categorical choices cannot be empty")]
    EmptyChoices,

    /// The same parameter name was suggested twice with a different
    /// distribution.
    #[error("parameter conflict for '{name}': {reason}")]
    ParameterConflict {
        /// The name of the conflicting parameter.
        name: String,
        /// The reason for the conflict.
        reason: String,
    },

    /// A feature frame or target index is unusable: nulls, repeated labels,
    /// or an attempt to overwrite it.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// A polars operation on the input frames failed.
    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    /// No indicator is registered under this name.
    #[error("unknown indicator '{0}'")]
    UnknownIndicator(String),

    /// The trial has no parameter with this name.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// A parameter was read back as a different kind than it was sampled.
    #[error("parameter '{name}' is {actual}, not {requested}")]
    ParameterType {
        /// The parameter name.
        name: String,
        /// The kind the caller asked for.
        requested: &'static str,
        /// The kind that was stored.
        actual: &'static str,
    },

    /// The objective returned a different number of values than the number
    /// of directions configured on the study.
    #[error("objective dimension mismatch: expected {expected} values, got {got}")]
    ObjectiveDimensionMismatch {
        /// The expected number of objective values.
        expected: usize,
        /// The actual number of objective values returned.
        got: usize,
    },

    /// No trial was scored: every trial was rejected, or none ran.
    #[error("no completed trials available")]
    NoCompletedTrials,

    /// [`transform`](crate::IndicatorOptimizer::transform) or a result
    /// accessor was called before a successful fit.
    #[error("optimizer has not been fitted")]
    NotFitted,

    /// An internal invariant was violated. This indicates a bug in the
    /// library rather than a user error.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// A convenience alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors an [`Indicator`](crate::indicator::Indicator) may return from
/// [`compute`](crate::indicator::Indicator::compute).
///
/// The evaluator wraps any of these into [`Error::Execution`].
#[derive(Debug, thiserror::Error)]
pub enum IndicatorError {
    /// The feature frame has no column with this name.
    #[error("missing input column '{0}'")]
    MissingColumn(String),

    /// A parameter value is outside what the indicator accepts.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Reading a parameter from the trial failed.
    #[error(transparent)]
    Param(#[from] Error),

    /// A polars operation inside the indicator failed.
    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    /// Any other failure inside the indicator.
    #[error("{0}")]
    Computation(String),
}
