//! Indicator trait, closure adapter, and the name → indicator registry.
//!
//! An [`Indicator`] is a typed function from a polars [`DataFrame`] and a
//! [`ParamSet`] to one or more output [`Series`] of the frame's height. It
//! declares its tunable parameters up front as a schema, which is what the
//! study samples from.
//!
//! # Implementing an indicator
//!
//! Either implement the trait on a struct, or wrap a closure in
//! [`IndicatorFn`]:
//!
//! ```
//! use polars::prelude::*;
//! use tuneta::indicator::{Indicator, IndicatorFn};
//! use tuneta::ParamSpec;
//!
//! let momentum = IndicatorFn::new(
//!     "momentum",
//!     vec![ParamSpec::int("lag", 1, 20)],
//!     |frame: &DataFrame, params: &tuneta::ParamSet| {
//!         let close = frame.column("close")?.as_materialized_series();
//!         let lag = params.int("lag")?;
//!         Ok(vec![(close - &close.shift(lag))?])
//!     },
//! );
//! assert_eq!(momentum.name(), "momentum");
//! ```

pub mod builtin;

use std::collections::HashMap;
use std::sync::Arc;

pub use builtin::{BollingerBands, Ema, RateOfChange, Rsi, Sma};

use polars::prelude::{DataFrame, Series};

use crate::error::{Error, IndicatorError, Result};
use crate::param::{ParamSet, ParamSpec};

/// Outcome of [`Indicator::compute`]: one series per output column.
pub type IndicatorResult = core::result::Result<Vec<Series>, IndicatorError>;

/// A technical indicator with a declared parameter schema.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc` by the registry and the optimizer.
pub trait Indicator: Send + Sync {
    /// Identifier used in the registry and as the output column prefix.
    fn name(&self) -> &str;

    /// The tunable parameters, in the order they should be sampled.
    fn schema(&self) -> Vec<ParamSpec>;

    /// Compute the output columns. Every column should have
    /// `frame.height()` rows and a numeric type; leading warm-up rows are
    /// conventionally NaN or null.
    ///
    /// # Errors
    ///
    /// Any [`IndicatorError`]; the optimizer treats it as fatal.
    fn compute(&self, frame: &DataFrame, params: &ParamSet) -> IndicatorResult;
}

type ComputeFn = dyn Fn(&DataFrame, &ParamSet) -> IndicatorResult + Send + Sync;

/// An [`Indicator`] backed by a closure.
pub struct IndicatorFn {
    name: String,
    schema: Vec<ParamSpec>,
    func: Box<ComputeFn>,
}

impl IndicatorFn {
    /// Wrap `func` as an indicator called `name` with the given schema.
    #[must_use]
    pub fn new<F>(name: impl Into<String>, schema: Vec<ParamSpec>, func: F) -> Self
    where
        F: Fn(&DataFrame, &ParamSet) -> IndicatorResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            schema,
            func: Box::new(func),
        }
    }
}

impl Indicator for IndicatorFn {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> Vec<ParamSpec> {
        self.schema.clone()
    }

    fn compute(&self, frame: &DataFrame, params: &ParamSet) -> IndicatorResult {
        (self.func)(frame, params)
    }
}

/// Maps indicator names to shared indicator instances.
///
/// ```
/// use tuneta::IndicatorRegistry;
///
/// let registry = IndicatorRegistry::with_builtins();
/// assert!(registry.get("rsi").is_ok());
/// assert!(registry.get("nope").is_err());
/// ```
#[derive(Clone, Default)]
pub struct IndicatorRegistry {
    indicators: HashMap<String, Arc<dyn Indicator>>,
}

impl IndicatorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in indicator on the `close` column:
    /// `sma`, `ema`, `rsi`, `roc`, and `bbands`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Sma::new());
        registry.register(Ema::new());
        registry.register(Rsi::new());
        registry.register(RateOfChange::new());
        registry.register(BollingerBands::new());
        registry
    }

    /// Register `indicator` under its own name, replacing any previous one.
    pub fn register(&mut self, indicator: impl Indicator + 'static) {
        self.register_arc(Arc::new(indicator));
    }

    /// Register a shared indicator under its own name.
    pub fn register_arc(&mut self, indicator: Arc<dyn Indicator>) {
        self.indicators
            .insert(indicator.name().to_owned(), indicator);
    }

    /// Look up an indicator by name.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownIndicator`] if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Indicator>> {
        self.indicators
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownIndicator(name.to_owned()))
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.indicators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
