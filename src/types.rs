/// Whether an objective is minimized or maximized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Lower values are better.
    Minimize,
    /// Higher values are better.
    Maximize,
}

/// Final state of a trial recorded in a [`Study`](crate::Study).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrialState {
    /// The objective returned values.
    Complete,
    /// The objective declined to score the trial (e.g. mostly-NaN output).
    /// Rejected trials never take part in best-trial or Pareto queries.
    Rejected,
    /// The objective returned an error.
    Failed,
}
