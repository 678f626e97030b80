//! Patience-based early stopping.
//!
//! Both controllers are called once per finished trial with the study and
//! answer with a [`ControlFlow`]: `Break` ends the search successfully. The
//! counter is compared with `patience` *before* it is incremented, so with
//! patience `p` the search stops on the `p + 2`-th consecutive trial without
//! improvement.

use core::ops::ControlFlow;

use crate::param::ParamSet;
use crate::selection::ParetoSelector;
use crate::study::Study;

/// Stops a single-objective search once the best value stops improving.
///
/// ```
/// use core::ops::ControlFlow;
/// use tuneta::{Direction, Evaluation, SingleObjectiveStopping, Study};
///
/// let study = Study::new(Direction::Maximize);
/// let mut stopping = SingleObjectiveStopping::new(Some(1));
/// let mut flows = Vec::new();
/// for _ in 0..3 {
///     study.tell(study.ask(), Evaluation::Scored(vec![0.5])).unwrap();
///     flows.push(stopping.after_trial(&study));
/// }
/// assert_eq!(flows.last(), Some(&ControlFlow::Break(())));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SingleObjectiveStopping {
    /// Trials without improvement tolerated before stopping; `None` never
    /// stops.
    pub patience: Option<usize>,
    /// Best value seen when the counter was last reset.
    pub best_score: Option<f64>,
    /// Consecutive trials without improvement.
    pub counter: usize,
}

impl SingleObjectiveStopping {
    /// A fresh controller.
    #[must_use]
    pub fn new(patience: Option<usize>) -> Self {
        Self {
            patience,
            ..Self::default()
        }
    }

    /// Update from the study's current best value.
    ///
    /// Until some trial has been scored there is nothing to compare, and the
    /// state is left untouched.
    pub fn after_trial(&mut self, study: &Study) -> ControlFlow<()> {
        let Ok(best) = study.best_value() else {
            return ControlFlow::Continue(());
        };
        let incumbent = *self.best_score.get_or_insert(best);

        if best > incumbent {
            self.best_score = Some(best);
            self.counter = 0;
            return ControlFlow::Continue(());
        }
        self.tick()
    }

    fn tick(&mut self) -> ControlFlow<()> {
        match self.patience {
            Some(patience) if self.counter > patience => {
                self.counter = 0;
                trace_info!(best = ?self.best_score, patience, "early stopping");
                ControlFlow::Break(())
            }
            _ => {
                self.counter += 1;
                ControlFlow::Continue(())
            }
        }
    }
}

/// The trial currently selected from the Pareto front.
#[derive(Clone, Debug, PartialEq)]
pub struct TopTrial {
    /// Trial id.
    pub id: u64,
    /// Its parameters.
    pub params: ParamSet,
    /// Mean of its objective values.
    pub value: f64,
}

/// Stops a multi-objective search once the selected top trial stops
/// changing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiObjectiveStopping {
    /// Trials without a new top trial tolerated before stopping; `None`
    /// never stops.
    pub patience: Option<usize>,
    /// Consecutive trials with the same top trial.
    pub counter: usize,
    /// The current top trial.
    pub top: Option<TopTrial>,
    /// How the top trial is chosen from the front.
    pub selector: ParetoSelector,
}

impl MultiObjectiveStopping {
    /// A fresh controller using `selector` on the study's Pareto front.
    #[must_use]
    pub fn new(patience: Option<usize>, selector: ParetoSelector) -> Self {
        Self {
            patience,
            selector,
            ..Self::default()
        }
    }

    /// Re-select the top trial and update the counter.
    pub fn after_trial(&mut self, study: &Study) -> ControlFlow<()> {
        let front = study.best_trials();
        let Some(id) = self.selector.select_top(&front) else {
            return ControlFlow::Continue(());
        };

        if self.top.as_ref().is_some_and(|top| top.id == id) {
            return match self.patience {
                Some(patience) if self.counter > patience => {
                    self.counter = 0;
                    trace_info!(top = id, patience, "early stopping");
                    ControlFlow::Break(())
                }
                _ => {
                    self.counter += 1;
                    ControlFlow::Continue(())
                }
            };
        }

        if let Some(trial) = front.into_iter().find(|t| t.id == id) {
            trace_debug!(top = id, value = trial.mean_value(), "new top trial");
            self.top = Some(TopTrial {
                id,
                value: trial.mean_value(),
                params: trial.params,
            });
        }
        self.counter = 0;
        ControlFlow::Continue(())
    }
}
