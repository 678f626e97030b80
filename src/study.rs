//! Study implementation for managing optimization trials.

use core::ops::ControlFlow;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::objective::Evaluation;
use crate::pareto;
use crate::sampler::random::RandomSampler;
use crate::sampler::{CompletedTrial, Sampler};
use crate::storage::{MemoryStorage, Storage};
use crate::trial::Trial;
use crate::types::{Direction, TrialState};

/// A study drives the propose → evaluate → record loop and tracks every
/// finished trial.
///
/// A study has one [`Direction`] per objective. With a single direction the
/// best trial is well defined ([`best_trial`](Self::best_trial)); with
/// several, the non-dominated set is available through
/// [`best_trials`](Self::best_trials).
///
/// Trial ids are handed out by an atomic counter starting at 0 (or one past
/// the highest id already in the storage), strictly increasing and never
/// reused, so per-trial side data can be kept in a positionally indexed
/// `Vec`.
///
/// # Examples
///
/// ```
/// use tuneta::{Direction, Evaluation, ParamSpec, Study};
///
/// let study = Study::new(Direction::Maximize);
/// let x = ParamSpec::float("x", 0.0, 1.0);
///
/// let mut trial = study.ask();
/// let v = trial.suggest(&x).unwrap();
/// # let _ = v;
/// study.tell(trial, Evaluation::Scored(vec![0.4])).unwrap();
///
/// assert_eq!(study.best_value().unwrap(), 0.4);
/// ```
pub struct Study {
    directions: Vec<Direction>,
    sampler: Arc<dyn Sampler>,
    storage: Arc<dyn Storage>,
    next_trial_id: AtomicU64,
}

impl Study {
    /// Creates a single-objective study with a [`RandomSampler`].
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self::with_sampler(vec![direction], RandomSampler::new())
    }

    /// Creates a study with one direction per objective and a custom sampler.
    #[must_use]
    pub fn with_sampler(directions: Vec<Direction>, sampler: impl Sampler + 'static) -> Self {
        Self::with_shared_sampler(directions, Arc::new(sampler))
    }

    /// Creates a study that records into `storage`.
    ///
    /// Trials already in the storage count as history: the sampler sees
    /// them, they compete for [`best_trial`](Self::best_trial), and new ids
    /// continue after the highest stored id.
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use tuneta::{CompletedTrial, Direction, MemoryStorage, ParamSet, RandomSampler, Study};
    ///
    /// let previous = vec![CompletedTrial::new(4, ParamSet::new(), vec![0.3])];
    /// let study = Study::with_storage(
    ///     vec![Direction::Maximize],
    ///     RandomSampler::with_seed(1),
    ///     Arc::new(MemoryStorage::with_trials(previous)),
    /// );
    /// assert_eq!(study.ask().id(), 5);
    /// ```
    #[must_use]
    pub fn with_storage(
        directions: Vec<Direction>,
        sampler: impl Sampler + 'static,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self::from_parts(directions, Arc::new(sampler), storage)
    }

    pub(crate) fn with_shared_sampler(
        directions: Vec<Direction>,
        sampler: Arc<dyn Sampler>,
    ) -> Self {
        Self::from_parts(directions, sampler, Arc::new(MemoryStorage::new()))
    }

    fn from_parts(
        directions: Vec<Direction>,
        sampler: Arc<dyn Sampler>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let next_id = storage
            .trials_arc()
            .read()
            .iter()
            .map(|t| t.id + 1)
            .max()
            .unwrap_or(0);
        Self {
            directions,
            sampler,
            storage,
            next_trial_id: AtomicU64::new(next_id),
        }
    }

    /// The storage this study records into.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// The optimization directions, one per objective.
    #[must_use]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Number of objectives.
    #[must_use]
    pub fn n_objectives(&self) -> usize {
        self.directions.len()
    }

    /// Creates a new trial with the next id.
    ///
    /// ```
    /// use tuneta::{Direction, Study};
    ///
    /// let study = Study::new(Direction::Maximize);
    /// assert_eq!(study.ask().id(), 0);
    /// assert_eq!(study.ask().id(), 1);
    /// ```
    #[must_use]
    pub fn ask(&self) -> Trial {
        let id = self.next_trial_id.fetch_add(1, Ordering::SeqCst);
        Trial::new(
            id,
            Arc::clone(&self.sampler),
            Arc::clone(self.storage.trials_arc()),
        )
    }

    /// Records the outcome of a trial and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObjectiveDimensionMismatch`] if a scored trial carries
    /// a different number of values than the study has directions. The
    /// trial is then recorded as failed.
    pub fn tell(&self, trial: Trial, outcome: Evaluation) -> Result<CompletedTrial> {
        let id = trial.id();
        let params = trial.into_params();
        let record = match outcome {
            Evaluation::Scored(values) => {
                if values.len() != self.directions.len() {
                    self.storage
                        .push(CompletedTrial::unscored(id, params, TrialState::Failed));
                    return Err(Error::ObjectiveDimensionMismatch {
                        expected: self.directions.len(),
                        got: values.len(),
                    });
                }
                CompletedTrial::new(id, params, values)
            }
            Evaluation::Rejected => CompletedTrial::unscored(id, params, TrialState::Rejected),
        };
        self.storage.push(record.clone());
        Ok(record)
    }

    /// Records a trial whose objective raised.
    pub fn fail(&self, trial: Trial) {
        let id = trial.id();
        self.storage.push(CompletedTrial::unscored(
            id,
            trial.into_params(),
            TrialState::Failed,
        ));
    }

    /// All finished trials, in id order.
    #[must_use]
    pub fn trials(&self) -> Vec<CompletedTrial> {
        self.storage.trials()
    }

    /// The finished trial with this id.
    #[must_use]
    pub fn trial(&self, id: u64) -> Option<CompletedTrial> {
        self.storage
            .trials_arc()
            .read()
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Number of finished trials, whatever their state.
    #[must_use]
    pub fn n_trials(&self) -> usize {
        self.storage.len()
    }

    /// Number of scored trials.
    #[must_use]
    pub fn n_complete_trials(&self) -> usize {
        self.storage
            .trials_arc()
            .read()
            .iter()
            .filter(|t| t.is_complete())
            .count()
    }

    /// The scored trial with the best first objective value. The earliest
    /// trial wins ties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCompletedTrials`] if nothing has been scored.
    pub fn best_trial(&self) -> Result<CompletedTrial> {
        let direction = self
            .directions
            .first()
            .copied()
            .unwrap_or(Direction::Maximize);
        let trials = self.storage.trials_arc().read();

        let mut best: Option<(&CompletedTrial, f64)> = None;
        for trial in trials.iter().filter(|t| t.is_complete()) {
            let Some(value) = trial.value() else { continue };
            if value.is_nan() {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, incumbent)) => match direction {
                    Direction::Maximize => value > incumbent,
                    Direction::Minimize => value < incumbent,
                },
            };
            if better {
                best = Some((trial, value));
            }
        }

        best.map(|(t, _)| t.clone()).ok_or(Error::NoCompletedTrials)
    }

    /// The best first objective value found so far.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCompletedTrials`] if nothing has been scored.
    pub fn best_value(&self) -> Result<f64> {
        self.best_trial()?
            .value()
            .ok_or(Error::Internal("complete trial without value"))
    }

    /// The non-dominated scored trials (the first Pareto front), in id order.
    #[must_use]
    pub fn best_trials(&self) -> Vec<CompletedTrial> {
        let complete: Vec<CompletedTrial> = self
            .storage
            .trials_arc()
            .read()
            .iter()
            .filter(|t| t.is_complete())
            .cloned()
            .collect();
        let values: Vec<Vec<f64>> = complete.iter().map(|t| t.values.clone()).collect();
        let fronts = pareto::fast_non_dominated_sort(&values, &self.directions);
        let Some(first) = fronts.into_iter().next() else {
            return Vec::new();
        };
        let mut front: Vec<CompletedTrial> = first.into_iter().map(|i| complete[i].clone()).collect();
        front.sort_by_key(|t| t.id);
        front
    }

    /// Runs up to `n_trials` trials, invoking `callback` after each one that
    /// was scored or rejected.
    ///
    /// The loop ends early, successfully, when the callback returns
    /// [`ControlFlow::Break`]. An error from the objective is fatal: the
    /// trial is recorded as failed and the error is returned at once.
    ///
    /// # Errors
    ///
    /// Propagates objective errors, and returns
    /// [`Error::NoCompletedTrials`] if the loop ends without a scored trial.
    pub fn optimize_with_callback<F, C>(
        &self,
        n_trials: usize,
        mut objective: F,
        mut callback: C,
    ) -> Result<()>
    where
        F: FnMut(&mut Trial) -> Result<Evaluation>,
        C: FnMut(&Study, &CompletedTrial) -> ControlFlow<()>,
    {
        for _ in 0..n_trials {
            let mut trial = self.ask();
            match objective(&mut trial) {
                Ok(outcome) => {
                    let completed = self.tell(trial, outcome)?;
                    if let ControlFlow::Break(()) = callback(self, &completed) {
                        trace_info!(trial = completed.id, "study stopped by callback");
                        break;
                    }
                }
                Err(e) => {
                    self.fail(trial);
                    return Err(e);
                }
            }
        }

        if self.n_complete_trials() == 0 {
            return Err(Error::NoCompletedTrials);
        }
        Ok(())
    }

    /// Runs `n_trials` trials without a callback.
    ///
    /// # Errors
    ///
    /// See [`optimize_with_callback`](Self::optimize_with_callback).
    pub fn optimize<F>(&self, n_trials: usize, objective: F) -> Result<()>
    where
        F: FnMut(&mut Trial) -> Result<Evaluation>,
    {
        self.optimize_with_callback(n_trials, objective, |_, _| ControlFlow::Continue(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{ParamSet, ParamSpec, ParamValue};

    fn scored(study: &Study, values: Vec<f64>) -> CompletedTrial {
        let trial = study.ask();
        study.tell(trial, Evaluation::Scored(values)).unwrap()
    }

    #[test]
    fn best_trial_prefers_earliest_on_ties() {
        let study = Study::new(Direction::Maximize);
        scored(&study, vec![0.2]);
        scored(&study, vec![0.7]);
        scored(&study, vec![0.7]);
        assert_eq!(study.best_trial().unwrap().id, 1);
        assert!((study.best_value().unwrap() - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn rejected_trials_are_never_best() {
        let study = Study::new(Direction::Maximize);
        let trial = study.ask();
        study.tell(trial, Evaluation::Rejected).unwrap();
        assert!(matches!(study.best_trial(), Err(Error::NoCompletedTrials)));
        assert_eq!(study.n_trials(), 1);
        assert_eq!(study.n_complete_trials(), 0);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let study = Study::with_sampler(
            vec![Direction::Maximize, Direction::Maximize],
            RandomSampler::with_seed(0),
        );
        let trial = study.ask();
        assert!(matches!(
            study.tell(trial, Evaluation::Scored(vec![1.0])),
            Err(Error::ObjectiveDimensionMismatch { expected: 2, got: 1 })
        ));
        assert_eq!(study.trials()[0].state, TrialState::Failed);
    }

    #[test]
    fn best_trials_is_the_pareto_front() {
        let study = Study::with_sampler(
            vec![Direction::Maximize, Direction::Maximize],
            RandomSampler::with_seed(0),
        );
        scored(&study, vec![0.9, 0.1]);
        scored(&study, vec![0.5, 0.5]);
        scored(&study, vec![0.4, 0.4]);
        scored(&study, vec![0.1, 0.9]);
        let ids: Vec<u64> = study.best_trials().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1, 3]);
    }

    #[test]
    fn callback_break_stops_the_loop() {
        let study = Study::with_sampler(vec![Direction::Maximize], RandomSampler::with_seed(5));
        let x = ParamSpec::float("x", 0.0, 1.0);
        study
            .optimize_with_callback(
                50,
                |trial| {
                    let ParamValue::Float(v) = trial.suggest(&x)? else {
                        return Err(Error::Internal("float expected"));
                    };
                    Ok(Evaluation::Scored(vec![v]))
                },
                |_, completed| {
                    if completed.id == 9 {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                },
            )
            .unwrap();
        assert_eq!(study.n_trials(), 10);
    }

    #[test]
    fn objective_error_aborts_and_records_failure() {
        let study = Study::new(Direction::Maximize);
        let mut calls = 0;
        let result = study.optimize(10, |_| {
            calls += 1;
            if calls == 3 {
                Err(Error::Execution {
                    indicator: "boom".into(),
                    reason: "nope".into(),
                })
            } else {
                Ok(Evaluation::Scored(vec![0.1]))
            }
        });
        assert!(matches!(result, Err(Error::Execution { .. })));
        assert_eq!(study.n_trials(), 3);
        assert_eq!(study.trials()[2].state, TrialState::Failed);
    }

    #[test]
    fn stored_trials_seed_ids_and_best() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::with_trials(vec![
            CompletedTrial::new(0, ParamSet::new(), vec![0.8]),
            CompletedTrial::unscored(2, ParamSet::new(), TrialState::Rejected),
        ]));
        let study = Study::with_storage(
            vec![Direction::Maximize],
            RandomSampler::with_seed(3),
            Arc::clone(&storage),
        );
        assert_eq!(study.n_trials(), 2);

        let fresh = scored(&study, vec![0.5]);
        assert_eq!(fresh.id, 3);
        assert_eq!(study.best_trial().unwrap().id, 0);
        assert_eq!(storage.len(), 3);

        scored(&study, vec![0.9]);
        assert_eq!(study.best_trial().unwrap().id, 4);
    }

    #[test]
    fn all_rejected_is_no_completed_trials() {
        let study = Study::new(Direction::Maximize);
        let result = study.optimize(4, |_| Ok(Evaluation::Rejected));
        assert!(matches!(result, Err(Error::NoCompletedTrials)));
        assert_eq!(study.n_trials(), 4);
    }
}
