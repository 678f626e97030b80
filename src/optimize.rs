//! The fit/transform front end: search one indicator's parameters for the
//! output that best tracks a target.

use std::sync::Arc;

use polars::prelude::{Column, DataFrame, NamedFrom, Series};

use crate::correlation::Metric;
use crate::error::{Error, Result};
use crate::frame::{FeatureFrame, Target, float_values};
use crate::indicator::{Indicator, IndicatorRegistry};
use crate::objective::{Evaluator, OutputArchive, validate_segments};
use crate::sampler::{CompletedTrial, RandomSampler, Sampler};
use crate::selection::ParetoSelector;
use crate::stopping::{MultiObjectiveStopping, SingleObjectiveStopping};
use crate::study::Study;
use crate::types::Direction;

/// Per-fit options.
///
/// ```
/// use tuneta::FitOptions;
///
/// let options = FitOptions::new()
///     .patience(10)
///     .segment_boundaries(vec![0, 250, 500, 750]);
/// assert_eq!(options.output_index, 0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FitOptions {
    /// One weight per target row; all ones when absent.
    pub weights: Option<Vec<f64>>,
    /// Which indicator output column is scored.
    pub output_index: usize,
    /// Log every trial at info level instead of debug.
    pub verbose: bool,
    /// Early-stopping patience; `None` runs every trial.
    pub patience: Option<usize>,
    /// Row offsets splitting the target into segments. Switches the fit to
    /// one objective per segment.
    pub segment_boundaries: Option<Vec<usize>>,
}

impl FitOptions {
    /// Defaults: unweighted, first column, quiet, no early stopping, single
    /// objective.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set per-row weights.
    #[must_use]
    pub fn weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Score output column `index`.
    #[must_use]
    pub fn output_index(mut self, index: usize) -> Self {
        self.output_index = index;
        self
    }

    /// Log every trial at info level.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Stop after `patience + 2` consecutive trials without improvement.
    #[must_use]
    pub fn patience(mut self, patience: usize) -> Self {
        self.patience = Some(patience);
        self
    }

    /// Optimize one correlation per `[b[i], b[i+1])` segment.
    #[must_use]
    pub fn segment_boundaries(mut self, boundaries: Vec<usize>) -> Self {
        self.segment_boundaries = Some(boundaries);
        self
    }
}

struct Fitted {
    study: Study,
    winner: CompletedTrial,
    archive: OutputArchive,
}

/// Tunes the parameters of one indicator.
///
/// # Examples
///
/// ```
/// use tuneta::indicator::Sma;
/// use tuneta::{FeatureFrame, FitOptions, IndicatorOptimizer, Target};
///
/// let close: Vec<f64> = (0..200).map(|i| (f64::from(i) * 0.1).sin() + 5.0).collect();
/// let target: Vec<f64> = close.windows(2).map(|w| w[1] - w[0]).chain([0.0]).collect();
/// let x = FeatureFrame::new((0..200).collect()).with_column("close", close).unwrap();
/// let y = Target::new((0..200).collect(), target).unwrap();
///
/// let mut optimizer = IndicatorOptimizer::builder(Sma::new().length_range(2, 30))
///     .n_trials(20)
///     .seed(7)
///     .build()
///     .unwrap();
/// optimizer.fit(&x, &y, &FitOptions::new()).unwrap();
///
/// let features = optimizer.transform(&x).unwrap();
/// // The index column, then the indicator output.
/// assert_eq!(features.width(), 2);
/// assert!(features.get_column_names()[1].starts_with("sma_length:"));
/// ```
pub struct IndicatorOptimizer {
    indicator: Arc<dyn Indicator>,
    n_trials: usize,
    metric: Metric,
    selector: ParetoSelector,
    seed: Option<u64>,
    sampler: Option<Arc<dyn Sampler>>,
    fitted: Option<Fitted>,
}

impl core::fmt::Debug for IndicatorOptimizer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IndicatorOptimizer")
            .field("indicator", &self.indicator.name())
            .field("n_trials", &self.n_trials)
            .field("metric", &self.metric)
            .field("selector", &self.selector)
            .field("seed", &self.seed)
            .field("fitted", &self.fitted.is_some())
            .finish_non_exhaustive()
    }
}

impl IndicatorOptimizer {
    /// Start configuring an optimizer for `indicator`.
    #[must_use]
    pub fn builder(indicator: impl Indicator + 'static) -> IndicatorOptimizerBuilder {
        IndicatorOptimizerBuilder::new(Arc::new(indicator))
    }

    /// Start configuring an optimizer for the indicator registered as
    /// `name`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownIndicator`] if `registry` has no such indicator.
    pub fn from_registry(
        registry: &IndicatorRegistry,
        name: &str,
    ) -> Result<IndicatorOptimizerBuilder> {
        Ok(IndicatorOptimizerBuilder::new(registry.get(name)?))
    }

    /// The indicator being tuned.
    #[must_use]
    pub fn indicator(&self) -> &Arc<dyn Indicator> {
        &self.indicator
    }

    /// Returns `true` after a successful [`fit`](Self::fit).
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Search the indicator's parameters against `y`.
    ///
    /// Without segment boundaries this maximizes one correlation over the
    /// whole target and the winner is the best trial. With boundaries each
    /// segment is its own objective and the winner is picked from the Pareto
    /// front by the configured [`ParetoSelector`]. A previous fit is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Input validation errors ([`Error::LengthMismatch`],
    /// [`Error::InvalidSegments`]), [`Error::Execution`] or [`Error::Shape`]
    /// from a failing indicator, [`Error::InvalidFrame`] if the frame index
    /// repeats a label, and [`Error::NoCompletedTrials`] if every trial was
    /// rejected.
    pub fn fit(&mut self, x: &FeatureFrame, y: &Target, options: &FitOptions) -> Result<&mut Self> {
        self.fitted = None;
        check_options(options, y)?;
        let weights = options.weights.as_deref();
        let segments = options.segment_boundaries.as_deref();

        let n_objectives = segments.map_or(1, |b| b.len() - 1);
        let study = Study::with_shared_sampler(
            vec![Direction::Maximize; n_objectives],
            self.fresh_sampler(),
        );
        let evaluator = Evaluator::new(
            Arc::clone(&self.indicator),
            options.output_index,
            self.metric,
        );
        let schema = self.indicator.schema();
        let mut archive = OutputArchive::new();
        let mut single = SingleObjectiveStopping::new(options.patience);
        let mut multi = MultiObjectiveStopping::new(options.patience, self.selector);
        let verbose = options.verbose;

        trace_info!(
            indicator = self.indicator.name(),
            objectives = n_objectives,
            n_trials = self.n_trials,
            patience = ?options.patience,
            "fit started"
        );

        study.optimize_with_callback(
            self.n_trials,
            |trial| {
                trial.suggest_all(&schema)?;
                evaluator.evaluate(
                    trial.id(),
                    trial.params(),
                    x,
                    y,
                    weights,
                    segments,
                    &mut archive,
                )
            },
            |study, completed| {
                if verbose {
                    trace_info!(
                        trial = completed.id,
                        state = ?completed.state,
                        values = ?completed.values,
                        params = %completed.params.label(),
                        "trial finished"
                    );
                } else {
                    trace_debug!(
                        trial = completed.id,
                        state = ?completed.state,
                        values = ?completed.values,
                        "trial finished"
                    );
                }
                if segments.is_some() {
                    multi.after_trial(study)
                } else {
                    single.after_trial(study)
                }
            },
        )?;

        let winner = if segments.is_some() {
            self.selector
                .select_top(&study.best_trials())
                .and_then(|id| study.trial(id))
                .ok_or(Error::NoCompletedTrials)?
        } else {
            study.best_trial()?
        };

        trace_info!(
            indicator = self.indicator.name(),
            trial = winner.id,
            values = ?winner.values,
            params = %winner.params.label(),
            trials = study.n_trials(),
            "fit finished"
        );

        self.fitted = Some(Fitted {
            study,
            winner,
            archive,
        });
        Ok(self)
    }

    /// Recompute the winning configuration on `x`.
    ///
    /// Returns a frame holding `x`'s index column followed by every output
    /// column of the indicator as `f64`, with nulls and infinities replaced
    /// by NaN, named after [`column_name`](Self::column_name) (with an
    /// `_{i}` suffix per column when there are several).
    ///
    /// # Errors
    ///
    /// [`Error::NotFitted`] before a successful fit, otherwise
    /// [`Error::Execution`] or [`Error::Shape`] from the indicator.
    pub fn transform(&self, x: &FeatureFrame) -> Result<DataFrame> {
        let winner = self.winner()?;
        let name = self.indicator.name();
        let execution = |reason: String| Error::Execution {
            indicator: name.to_owned(),
            reason,
        };
        let outputs = self
            .indicator
            .compute(x.data_frame(), &winner.params)
            .map_err(|e| execution(e.to_string()))?;

        let base = self.column_name()?;
        let width = outputs.len();
        let mut columns = Vec::with_capacity(width + 1);
        columns.push(x.index().clone());
        for (i, output) in outputs.iter().enumerate() {
            if output.len() != x.len() {
                return Err(Error::Shape {
                    indicator: name.to_owned(),
                    expected: x.len(),
                    got: output.len(),
                });
            }
            let mut values = float_values(output).map_err(|e| execution(e.to_string()))?;
            for v in values.iter_mut().filter(|v| v.is_infinite()) {
                *v = f64::NAN;
            }
            let column = if width > 1 {
                format!("{base}_{i}")
            } else {
                base.clone()
            };
            columns.push(Column::from(Series::new(column.into(), values)));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// The study of the last fit.
    ///
    /// # Errors
    ///
    /// [`Error::NotFitted`] before a successful fit.
    pub fn study(&self) -> Result<&Study> {
        self.fitted().map(|f| &f.study)
    }

    /// The winning trial of the last fit.
    ///
    /// # Errors
    ///
    /// [`Error::NotFitted`] before a successful fit.
    pub fn winner(&self) -> Result<&CompletedTrial> {
        self.fitted().map(|f| &f.winner)
    }

    /// The winner's scored output column, aligned to the fit target.
    ///
    /// # Errors
    ///
    /// [`Error::NotFitted`] before a successful fit.
    pub fn best_output(&self) -> Result<&[f64]> {
        let fitted = self.fitted()?;
        fitted
            .archive
            .get(fitted.winner.id)
            .ok_or(Error::Internal("winning trial has no retained output"))
    }

    /// `"{indicator}_{params}"` for the winner, e.g. `rsi_length:14`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFitted`] before a successful fit.
    pub fn column_name(&self) -> Result<String> {
        let label = self.winner()?.params.label();
        let name = self.indicator.name();
        Ok(if label.is_empty() {
            name.to_owned()
        } else {
            format!("{name}_{label}")
        })
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(Error::NotFitted)
    }

    fn fresh_sampler(&self) -> Arc<dyn Sampler> {
        match (&self.sampler, self.seed) {
            (Some(sampler), _) => Arc::clone(sampler),
            (None, Some(seed)) => Arc::new(RandomSampler::with_seed(seed)),
            (None, None) => Arc::new(RandomSampler::new()),
        }
    }
}

fn check_options(options: &FitOptions, y: &Target) -> Result<()> {
    if let Some(w) = &options.weights
        && w.len() != y.len()
    {
        return Err(Error::LengthMismatch {
            what: "weights",
            expected: y.len(),
            got: w.len(),
        });
    }
    if let Some(bounds) = &options.segment_boundaries {
        validate_segments(bounds, y.len())?;
    }
    Ok(())
}

/// Builder for [`IndicatorOptimizer`].
pub struct IndicatorOptimizerBuilder {
    indicator: Arc<dyn Indicator>,
    n_trials: usize,
    metric: Metric,
    selector: ParetoSelector,
    seed: Option<u64>,
    sampler: Option<Arc<dyn Sampler>>,
}

impl IndicatorOptimizerBuilder {
    /// Defaults: 100 trials, Spearman, default selector, unseeded random
    /// sampling.
    #[must_use]
    pub fn new(indicator: Arc<dyn Indicator>) -> Self {
        Self {
            indicator,
            n_trials: 100,
            metric: Metric::default(),
            selector: ParetoSelector::default(),
            seed: None,
            sampler: None,
        }
    }

    /// Maximum number of trials per fit.
    #[must_use]
    pub fn n_trials(mut self, n: usize) -> Self {
        self.n_trials = n;
        self
    }

    /// Correlation used for every objective.
    #[must_use]
    pub fn metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Seed for the default random sampler. Each fit restarts from it.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pareto selection coefficients for segmented fits.
    #[must_use]
    pub fn selector(mut self, selector: ParetoSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Replace the random sampler. Overrides [`seed`](Self::seed).
    #[must_use]
    pub fn sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Some(Arc::new(sampler));
        self
    }

    /// Build the optimizer.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the indicator's schema contains a
    /// malformed parameter.
    pub fn build(self) -> Result<IndicatorOptimizer> {
        for spec in self.indicator.schema() {
            spec.validate()?;
        }
        Ok(IndicatorOptimizer {
            indicator: self.indicator,
            n_trials: self.n_trials,
            metric: self.metric,
            selector: self.selector,
            seed: self.seed,
            sampler: self.sampler,
            fitted: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::IndicatorFn;
    use crate::param::ParamSpec;
    use crate::types::TrialState;

    /// `close` shifted by `lag` rows; the target is `close` shifted by 3, so
    /// `lag = 3` correlates perfectly.
    fn lagged() -> IndicatorFn {
        IndicatorFn::new(
            "lag",
            vec![ParamSpec::int("lag", 0, 6)],
            |frame: &DataFrame, params: &crate::param::ParamSet| {
                let close = frame.column("close")?.as_materialized_series();
                Ok(vec![close.shift(params.int("lag")?)])
            },
        )
    }

    fn ramp(frame: &DataFrame) -> Series {
        let n = u32::try_from(frame.height()).unwrap();
        Series::new("ramp".into(), (0..n).map(f64::from).collect::<Vec<_>>())
    }

    fn data(n: usize) -> (FeatureFrame, Target) {
        let mut rng = fastrand::Rng::with_seed(11);
        let close: Vec<f64> = (0..n).map(|_| rng.f64()).collect();
        let target: Vec<f64> = (0..n)
            .map(|i| if i < 3 { f64::NAN } else { close[i - 3] })
            .collect();
        let index: Vec<i64> = (0..i64::try_from(n).unwrap()).collect();
        let x = FeatureFrame::new(index.clone())
            .with_column("close", close)
            .unwrap();
        let y = Target::new(index, target).unwrap();
        (x, y)
    }

    #[test]
    fn single_objective_finds_the_lag() {
        let (x, y) = data(120);
        let mut optimizer = IndicatorOptimizer::builder(lagged())
            .n_trials(60)
            .seed(1)
            .build()
            .unwrap();
        optimizer.fit(&x, &y, &FitOptions::new()).unwrap();
        let winner = optimizer.winner().unwrap();
        assert_eq!(winner.params.int("lag").unwrap(), 3);
        assert!((winner.values[0] - 1.0).abs() < 1e-9);
        assert_eq!(optimizer.column_name().unwrap(), "lag_lag:3");
        assert_eq!(optimizer.best_output().unwrap().len(), 120);
    }

    #[test]
    fn segmented_fit_has_one_objective_per_segment() {
        let (x, y) = data(120);
        let mut optimizer = IndicatorOptimizer::builder(lagged())
            .n_trials(80)
            .seed(2)
            .build()
            .unwrap();
        optimizer
            .fit(&x, &y, &FitOptions::new().segment_boundaries(vec![0, 40, 80, 120]))
            .unwrap();
        let study = optimizer.study().unwrap();
        assert_eq!(study.n_objectives(), 3);
        let winner = optimizer.winner().unwrap();
        assert_eq!(winner.values.len(), 3);
        assert_eq!(winner.params.int("lag").unwrap(), 3);
    }

    #[test]
    fn transform_before_fit_is_an_error() {
        let optimizer = IndicatorOptimizer::builder(lagged()).build().unwrap();
        let (x, _) = data(10);
        assert!(matches!(optimizer.transform(&x), Err(Error::NotFitted)));
        assert!(matches!(optimizer.winner(), Err(Error::NotFitted)));
    }

    #[test]
    fn transform_names_multiple_columns_and_clears_infinities() {
        let pair = IndicatorFn::new("pair", vec![ParamSpec::int("k", 1, 1)], |frame, _| {
            let close = float_values(frame.column("close")?.as_materialized_series())?;
            let inverse: Vec<f64> = close.iter().map(|v| 1.0 / v).collect();
            Ok(vec![
                Series::new("close".into(), close),
                Series::new("inverse".into(), inverse),
            ])
        });
        let x = FeatureFrame::new(vec![0, 1, 2, 3])
            .with_column("close", vec![0.0, 1.0, 2.0, 3.0])
            .unwrap();
        let y = Target::new(vec![0, 1, 2, 3], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let mut optimizer = IndicatorOptimizer::builder(pair)
            .n_trials(3)
            .seed(0)
            .build()
            .unwrap();
        optimizer.fit(&x, &y, &FitOptions::new()).unwrap();

        let table = optimizer.transform(&x).unwrap();
        let names: Vec<&str> = table.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["index", "pair_k:1_0", "pair_k:1_1"]);
        let inverse = table.column("pair_k:1_1").unwrap().f64().unwrap();
        assert!(inverse.get(0).unwrap().is_nan());
        assert_eq!(inverse.get(2), Some(0.5));
        let index = table.column("index").unwrap().i64().unwrap();
        assert_eq!(index.into_no_null_iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn early_stopping_cuts_the_search_short() {
        let constant = IndicatorFn::new("flat", vec![ParamSpec::int("k", 1, 1000)], |frame, _| {
            Ok(vec![ramp(frame)])
        });
        let (x, y) = data(50);
        let mut optimizer = IndicatorOptimizer::builder(constant)
            .n_trials(100)
            .seed(3)
            .build()
            .unwrap();
        optimizer
            .fit(&x, &y, &FitOptions::new().patience(3))
            .unwrap();
        assert_eq!(optimizer.study().unwrap().n_trials(), 5);
    }

    #[test]
    fn every_trial_rejected_is_no_completed_trials() {
        let empty = IndicatorFn::new("empty", Vec::new(), |frame, _| {
            Ok(vec![Series::new("nan".into(), vec![f64::NAN; frame.height()])])
        });
        let (x, y) = data(20);
        let mut optimizer = IndicatorOptimizer::builder(empty)
            .n_trials(4)
            .build()
            .unwrap();
        let err = optimizer.fit(&x, &y, &FitOptions::new()).unwrap_err();
        assert!(matches!(err, Error::NoCompletedTrials));
        assert!(!optimizer.is_fitted());
    }

    #[test]
    fn rejected_trials_are_recorded_and_skipped() {
        let sometimes = IndicatorFn::new("sometimes", vec![ParamSpec::int("k", 0, 1)], |frame, params| {
            let out = if params.int("k")? == 0 {
                Series::new("nan".into(), vec![f64::NAN; frame.height()])
            } else {
                ramp(frame)
            };
            Ok(vec![out])
        });
        let (x, y) = data(30);
        let mut optimizer = IndicatorOptimizer::builder(sometimes)
            .n_trials(20)
            .seed(5)
            .build()
            .unwrap();
        optimizer.fit(&x, &y, &FitOptions::new()).unwrap();
        let study = optimizer.study().unwrap();
        let rejected = study
            .trials()
            .iter()
            .filter(|t| t.state == TrialState::Rejected)
            .count();
        assert!(rejected > 0);
        assert_eq!(optimizer.winner().unwrap().params.int("k").unwrap(), 1);
    }

    #[test]
    fn bad_weights_and_segments_are_rejected_up_front() {
        let (x, y) = data(10);
        let mut optimizer = IndicatorOptimizer::builder(lagged()).build().unwrap();
        assert!(matches!(
            optimizer.fit(&x, &y, &FitOptions::new().weights(vec![1.0; 3])),
            Err(Error::LengthMismatch { what: "weights", .. })
        ));
        assert!(matches!(
            optimizer.fit(&x, &y, &FitOptions::new().segment_boundaries(vec![0, 20])),
            Err(Error::InvalidSegments(_))
        ));
    }

    #[test]
    fn registry_lookup_builds_an_optimizer() {
        let registry = IndicatorRegistry::with_builtins();
        let optimizer = IndicatorOptimizer::from_registry(&registry, "rsi")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(optimizer.indicator().name(), "rsi");
        assert!(IndicatorOptimizer::from_registry(&registry, "macd").is_err());
    }

    #[test]
    fn invalid_schema_fails_to_build() {
        let broken = IndicatorFn::new("broken", vec![ParamSpec::int("n", 5, 1)], |frame, _| {
            Ok(vec![ramp(frame)])
        });
        assert!(matches!(
            IndicatorOptimizer::builder(broken).build(),
            Err(Error::InvalidBounds { .. })
        ));
    }
}
