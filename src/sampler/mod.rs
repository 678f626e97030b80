//! Sampler trait and implementations for parameter sampling.
//!
//! A sampler generates parameter values for each trial. It receives a
//! [`Distribution`] describing the parameter space, a monotonically increasing
//! `trial_id`, and the list of all [`CompletedTrial`]s so far, and returns a
//! [`ParamValue`] that matches the distribution variant.
//!
//! The search algorithm itself is not what this crate is about, so only
//! [`RandomSampler`] ships here; anything implementing [`Sampler`] can be
//! handed to [`Study::with_sampler`](crate::Study::with_sampler) or
//! [`IndicatorOptimizerBuilder::sampler`](crate::IndicatorOptimizerBuilder::sampler).
//!
//! # Implementing a custom sampler
//!
//! ```rust
//! use tuneta::sampler::{CompletedTrial, Sampler};
//! use tuneta::{Distribution, ParamValue};
//!
//! /// A sampler that always picks the midpoint of each distribution.
//! struct MidpointSampler;
//!
//! impl Sampler for MidpointSampler {
//!     fn sample(
//!         &self,
//!         distribution: &Distribution,
//!         _trial_id: u64,
//!         _history: &[CompletedTrial],
//!     ) -> ParamValue {
//!         match distribution {
//!             Distribution::Float(fd) => ParamValue::Float((fd.low + fd.high) / 2.0),
//!             Distribution::Int(id) => ParamValue::Int((id.low + id.high) / 2),
//!             Distribution::Categorical(cd) => ParamValue::Categorical(cd.choices.len() / 2),
//!         }
//!     }
//! }
//! ```
//!
//! # Thread safety
//!
//! The [`Sampler`] trait requires `Send + Sync`. [`Study`](crate::Study) stores
//! the sampler as `Arc<dyn Sampler>`. Stateless samplers derive all randomness
//! from `seed + trial_id + distribution` plus an [`AtomicU64`] call counter;
//! stateful ones should wrap their state in `parking_lot::Mutex`.
//!
//! [`AtomicU64`]: core::sync::atomic::AtomicU64

pub mod random;

pub use random::RandomSampler;

use crate::distribution::Distribution;
use crate::param::{ParamSet, ParamValue};
use crate::types::TrialState;

/// A finished trial with its parameters and objective values.
///
/// `values` holds one entry per study direction for completed trials and is
/// empty for rejected or failed ones.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompletedTrial {
    /// The ordinal of this trial, assigned by the study.
    pub id: u64,
    /// The sampled parameter values, in suggestion order.
    pub params: ParamSet,
    /// The objective values returned by the objective function.
    pub values: Vec<f64>,
    /// Whether the trial was scored, rejected, or failed.
    pub state: TrialState,
}

impl CompletedTrial {
    /// Creates a completed trial.
    #[must_use]
    pub fn new(id: u64, params: ParamSet, values: Vec<f64>) -> Self {
        Self {
            id,
            params,
            values,
            state: TrialState::Complete,
        }
    }

    /// Creates a trial in a non-complete state, carrying no values.
    #[must_use]
    pub fn unscored(id: u64, params: ParamSet, state: TrialState) -> Self {
        Self {
            id,
            params,
            values: Vec::new(),
            state,
        }
    }

    /// The first objective value, for single-objective studies.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Mean of the objective values; `NaN` when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_value(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Returns `true` if the trial was scored.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == TrialState::Complete
    }
}

/// Trait for pluggable parameter sampling strategies.
///
/// Samplers are responsible for generating parameter values based on
/// the distribution and historical trial data. The trait requires
/// `Send + Sync` so a sampler can be shared behind an `Arc`.
pub trait Sampler: Send + Sync {
    /// Samples a parameter value from the given distribution.
    ///
    /// # Arguments
    ///
    /// * `distribution` - The parameter distribution to sample from.
    /// * `trial_id` - The unique ID of the trial being sampled for.
    /// * `history` - Historical finished trials for informed sampling.
    ///
    /// # Returns
    ///
    /// A `ParamValue` whose variant matches the distribution variant.
    fn sample(
        &self,
        distribution: &Distribution,
        trial_id: u64,
        history: &[CompletedTrial],
    ) -> ParamValue;
}
