//! A single running trial.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::param::{ParamSet, ParamSpec, ParamValue};
use crate::sampler::{CompletedTrial, Sampler};

/// One evaluation attempt handed out by [`Study::ask`](crate::Study::ask).
///
/// Parameters are drawn lazily through [`suggest`](Self::suggest); asking
/// for the same name twice returns the first draw.
pub struct Trial {
    id: u64,
    params: ParamSet,
    sampler: Arc<dyn Sampler>,
    history: Arc<RwLock<Vec<CompletedTrial>>>,
}

impl Trial {
    pub(crate) fn new(
        id: u64,
        sampler: Arc<dyn Sampler>,
        history: Arc<RwLock<Vec<CompletedTrial>>>,
    ) -> Self {
        Self {
            id,
            params: ParamSet::new(),
            sampler,
            history,
        }
    }

    /// The trial ordinal, unique within its study.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Parameters sampled so far.
    #[must_use]
    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    pub(crate) fn into_params(self) -> ParamSet {
        self.params
    }

    /// Sample a value for `spec`, or return the value already drawn for it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed spec, or
    /// [`Error::ParameterConflict`] if the name was already sampled from a
    /// different distribution.
    pub fn suggest(&mut self, spec: &ParamSpec) -> Result<ParamValue> {
        if let Some(existing) = self.params.distribution(spec.name()) {
            if existing != spec.distribution() {
                return Err(Error::ParameterConflict {
                    name: spec.name().to_owned(),
                    reason: "already sampled from a different distribution".to_owned(),
                });
            }
            return self
                .params
                .get(spec.name())
                .cloned()
                .ok_or(Error::Internal("parameter distribution without value"));
        }

        spec.validate()?;
        let value = {
            let history = self.history.read();
            self.sampler.sample(spec.distribution(), self.id, &history)
        };
        self.params
            .insert(spec.name(), value.clone(), spec.distribution().clone());
        Ok(value)
    }

    /// Sample every parameter of a schema, in order.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`suggest`](Self::suggest).
    pub fn suggest_all(&mut self, schema: &[ParamSpec]) -> Result<&ParamSet> {
        for spec in schema {
            self.suggest(spec)?;
        }
        Ok(&self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::RandomSampler;

    fn trial() -> Trial {
        Trial::new(
            0,
            Arc::new(RandomSampler::with_seed(1)),
            Arc::new(RwLock::new(Vec::new())),
        )
    }

    #[test]
    fn repeated_suggest_returns_first_draw() {
        let mut t = trial();
        let spec = ParamSpec::int("n", 1, 1_000_000);
        let a = t.suggest(&spec).unwrap();
        let b = t.suggest(&spec).unwrap();
        assert_eq!(a, b);
        assert_eq!(t.params().len(), 1);
    }

    #[test]
    fn conflicting_distribution_is_rejected() {
        let mut t = trial();
        t.suggest(&ParamSpec::int("n", 1, 10)).unwrap();
        assert!(matches!(
            t.suggest(&ParamSpec::int("n", 1, 20)),
            Err(Error::ParameterConflict { .. })
        ));
    }

    #[test]
    fn suggest_all_keeps_schema_order() {
        let mut t = trial();
        let schema = [
            ParamSpec::int("b", 1, 10),
            ParamSpec::float("a", 0.0, 1.0),
        ];
        let names: Vec<&str> = t.suggest_all(&schema).unwrap().iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
