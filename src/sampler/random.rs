//! Uniform random sampling, the default sampler.

use core::sync::atomic::{AtomicU64, Ordering};

use super::{CompletedTrial, Sampler};
use crate::distribution::Distribution;
use crate::param::ParamValue;
use crate::rng_util;

/// Samples every distribution independently and uniformly, ignoring history.
///
/// Stateless apart from a call counter: every draw is a pure function of
/// `seed`, `trial_id`, the distribution, and the call sequence, so two
/// samplers with the same seed produce the same parameters.
///
/// # Examples
///
/// ```
/// use tuneta::sampler::RandomSampler;
/// use tuneta::{Direction, Study};
///
/// let study = Study::with_sampler(vec![Direction::Maximize], RandomSampler::with_seed(7));
/// assert_eq!(study.n_trials(), 0);
/// ```
pub struct RandomSampler {
    seed: u64,
    call_seq: AtomicU64,
}

impl RandomSampler {
    /// Creates a sampler seeded from the thread-local RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(fastrand::u64(..))
    }

    /// Creates a reproducible sampler.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            call_seq: AtomicU64::new(0),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn sample(
        &self,
        distribution: &Distribution,
        trial_id: u64,
        _history: &[CompletedTrial],
    ) -> ParamValue {
        let seq = self.call_seq.fetch_add(1, Ordering::Relaxed);
        let fingerprint = rng_util::distribution_fingerprint(distribution);
        let mut rng = fastrand::Rng::with_seed(rng_util::mix_seed(
            self.seed,
            trial_id,
            fingerprint.wrapping_add(seq),
        ));

        match distribution {
            Distribution::Float(d) => match d.step {
                Some(step) if step > 0.0 => {
                    let n_steps = ((d.high - d.low) / step).floor() as u64;
                    let k = rng.u64(0..=n_steps);
                    ParamValue::Float((k as f64).mul_add(step, d.low).min(d.high))
                }
                _ => {
                    if d.low >= d.high {
                        ParamValue::Float(d.low)
                    } else {
                        ParamValue::Float(rng_util::f64_range(&mut rng, d.low, d.high))
                    }
                }
            },
            Distribution::Int(d) => match d.step {
                Some(step) if step > 1 => {
                    let n_steps = (d.high - d.low) / step;
                    ParamValue::Int(d.low + rng.i64(0..=n_steps) * step)
                }
                _ => ParamValue::Int(rng.i64(d.low..=d.high)),
            },
            Distribution::Categorical(d) => {
                ParamValue::Categorical(rng.usize(0..d.choices.len().max(1)))
            }
        }
    }
}
