//! Picking one winner from a multi-objective Pareto front.
//!
//! Every objective of a multi-objective fit is the correlation over one time
//! segment, so a good configuration has a high mean across segments and a
//! low spread between them. The selector reduces each candidate to
//! `(mean, std)`, thins the candidates with an epsilon-dominance archive on
//! those two axes, and returns the survivor with the highest mean.

use crate::pareto;
use crate::sampler::CompletedTrial;
use crate::types::Direction;

/// Chooses the top trial among non-dominated candidates.
///
/// The epsilon box sizes scale with the standard deviation of the candidates'
/// means: `mean_epsilon_scale * std(means)` on the mean axis and
/// `spread_epsilon_scale * std(means)` on the spread axis.
///
/// ```
/// use tuneta::sampler::CompletedTrial;
/// use tuneta::{ParamSet, ParetoSelector};
///
/// // Trials 0 and 1 have almost the same mean, but 1 is far more even
/// // across segments.
/// let front = vec![
///     CompletedTrial::new(0, ParamSet::new(), vec![0.9, 0.1]),
///     CompletedTrial::new(1, ParamSet::new(), vec![0.5, 0.499]),
///     CompletedTrial::new(2, ParamSet::new(), vec![0.0, 0.0]),
/// ];
/// assert_eq!(ParetoSelector::default().select_top(&front), Some(1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParetoSelector {
    /// Box size on the mean axis, relative to `std(means)`.
    pub mean_epsilon_scale: f64,
    /// Box size on the spread axis, relative to `std(means)`.
    pub spread_epsilon_scale: f64,
}

impl Default for ParetoSelector {
    fn default() -> Self {
        Self {
            mean_epsilon_scale: 0.15,
            spread_epsilon_scale: 0.5,
        }
    }
}

impl ParetoSelector {
    /// The id of the top candidate, or `None` if there are none.
    ///
    /// Candidates without objective values are ignored. A single candidate
    /// is returned as is.
    #[must_use]
    pub fn select_top(&self, candidates: &[CompletedTrial]) -> Option<u64> {
        let mut summary: Vec<(u64, f64, f64)> = candidates
            .iter()
            .filter(|t| !t.values.is_empty())
            .map(|t| (t.id, t.mean_value(), population_std(&t.values)))
            .collect();
        summary.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(core::cmp::Ordering::Equal));

        if summary.len() <= 1 {
            return summary.first().map(|s| s.0);
        }

        let means: Vec<f64> = summary.iter().map(|s| s.1).collect();
        let spread_of_means = population_std(&means);
        let epsilons = [
            self.mean_epsilon_scale * spread_of_means,
            self.spread_epsilon_scale * spread_of_means,
        ];
        let points: Vec<Vec<f64>> = summary.iter().map(|s| vec![s.1, s.2]).collect();
        let survivors = pareto::epsilon_nondominated(
            &points,
            &epsilons,
            &[Direction::Maximize, Direction::Minimize],
        );

        // `summary` is already in descending-mean order, so the smallest
        // surviving position is the highest mean, earliest candidate on ties.
        survivors.into_iter().min().map(|i| summary[i].0)
    }
}

#[allow(clippy::cast_precision_loss)]
fn population_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
