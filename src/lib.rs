#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Search technical-indicator parameters for the output that best correlates
//! with a target, such as forward returns.
//!
//! Each candidate parameterization is run through the indicator, aligned to
//! the target, and scored with a weighted Spearman (or Pearson) correlation
//! magnitude. Candidates whose output is mostly missing are rejected instead
//! of scored. Optionally, the target is split into time segments and every
//! segment becomes its own objective; the winner is then picked from the
//! Pareto front by favouring a high mean correlation with low spread across
//! segments.
//!
//! # Getting Started
//!
//! ```
//! use tuneta::prelude::*;
//!
//! let close: Vec<f64> = (0..300).map(|i| (f64::from(i) * 0.07).sin() * 10.0 + 100.0).collect();
//! let forward: Vec<f64> = (0..300)
//!     .map(|i| if i + 5 < 300 { close[i + 5] - close[i] } else { f64::NAN })
//!     .collect();
//! let x = FeatureFrame::new((0..300).collect()).with_column("close", close)?;
//! let y = Target::new((0..300).collect(), forward)?;
//!
//! let mut rsi = IndicatorOptimizer::builder(Rsi::new()).n_trials(30).seed(1).build()?;
//! rsi.fit(&x, &y, &FitOptions::new().patience(10))?;
//!
//! let features = rsi.transform(&x)?;
//! println!("{} scored {:?}", rsi.column_name()?, rsi.winner()?.values);
//! # assert_eq!(features.width(), 2);
//! # Ok::<(), tuneta::Error>(())
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`FeatureFrame`], [`Target`] | The indexed polars input frame and the signal it is scored against. |
//! | [`Indicator`](indicator::Indicator) | A function of a polars `DataFrame` with a declared parameter schema. |
//! | [`IndicatorOptimizer`] | Fit an indicator's parameters to a target, then transform new data with the winner. |
//! | [`Study`] | The propose → evaluate → record loop and its finished trials. |
//! | [`ParetoSelector`] | Choose one trial from a multi-objective front. |
//! | [`SingleObjectiveStopping`], [`MultiObjectiveStopping`] | Patience-based early stopping. |
//! | [`weighted_pearson`], [`weighted_spearman`] | NaN-tolerant weighted correlation magnitudes. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) for fits, trials, rejections and early stops | on |
//! | `serde` | `Serialize`/`Deserialize` on parameter, option and result types | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub use polars;

mod correlation;
mod distribution;
mod error;
mod frame;
pub mod indicator;
pub mod objective;
mod optimize;
mod param;
mod pareto;
mod rng_util;
pub mod sampler;
mod selection;
mod stopping;
pub mod storage;
mod study;
mod trial;
mod types;

pub use correlation::{Metric, weighted_pearson, weighted_spearman};
pub use distribution::{
    CategoricalDistribution, Distribution, FloatDistribution, IntDistribution,
};
pub use error::{Error, IndicatorError, Result};
pub use frame::{FeatureFrame, INDEX_COLUMN, Target, reindex};
pub use indicator::{Indicator, IndicatorFn, IndicatorRegistry};
pub use objective::Evaluation;
pub use optimize::{FitOptions, IndicatorOptimizer, IndicatorOptimizerBuilder};
pub use param::{ParamSet, ParamSpec, ParamValue};
pub use sampler::CompletedTrial;
pub use sampler::random::RandomSampler;
pub use selection::ParetoSelector;
pub use stopping::{MultiObjectiveStopping, SingleObjectiveStopping, TopTrial};
pub use storage::{MemoryStorage, Storage};
pub use study::Study;
pub use trial::Trial;
pub use types::{Direction, TrialState};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use tuneta::prelude::*;
/// ```
pub mod prelude {
    pub use crate::correlation::{Metric, weighted_pearson, weighted_spearman};
    pub use crate::error::{Error, IndicatorError, Result};
    pub use crate::frame::{FeatureFrame, Target};
    pub use crate::indicator::{
        BollingerBands, Ema, Indicator, IndicatorFn, IndicatorRegistry, RateOfChange, Rsi, Sma,
    };
    pub use crate::objective::Evaluation;
    pub use crate::optimize::{FitOptions, IndicatorOptimizer, IndicatorOptimizerBuilder};
    pub use crate::param::{ParamSet, ParamSpec, ParamValue};
    pub use crate::sampler::CompletedTrial;
    pub use crate::sampler::random::RandomSampler;
    pub use crate::selection::ParetoSelector;
    pub use crate::stopping::{MultiObjectiveStopping, SingleObjectiveStopping};
    pub use crate::study::Study;
    pub use crate::trial::Trial;
    pub use crate::types::{Direction, TrialState};
}
