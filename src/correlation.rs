//! Weighted Pearson and Spearman correlation magnitudes.
//!
//! Both scorers compare a target `y` with a candidate `y_pred` and return
//! `|ρ|` in `[0, 1]`; the sign is irrelevant when searching for an
//! informative indicator, since a perfectly inverse signal is as useful as a
//! perfectly aligned one.
//!
//! # Missing values and degeneracy
//!
//! All inputs must have the same length; a mismatch is a caller bug and
//! panics. Positions where either series is NaN are dropped together with
//! their weight before anything else happens. Whatever remains may still be
//! degenerate (empty, zero total weight, zero variance); every such case
//! produces a non-finite intermediate and is reported as exactly `0.0`.
//!
//! # Spearman
//!
//! Spearman ranks both series (ties share their average rank) and runs the
//! weighted Pearson computation on the ranks. Ranks are computed after the
//! NaN drop, so they carry no NaNs of their own.

/// Which correlation an objective is scored with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Metric {
    /// Weighted rank correlation.
    #[default]
    Spearman,
    /// Weighted linear correlation.
    Pearson,
}

impl Metric {
    /// Score `y_pred` against `y` with this metric.
    #[must_use]
    pub fn score(self, y: &[f64], y_pred: &[f64], weights: Option<&[f64]>) -> f64 {
        match self {
            Self::Spearman => weighted_spearman(y, y_pred, weights),
            Self::Pearson => weighted_pearson(y, y_pred, weights),
        }
    }
}

/// Weighted Pearson correlation magnitude of `y` and `y_pred`.
///
/// `weights` defaults to all ones. Returns `0.0` when the result is not
/// finite.
///
/// # Panics
///
/// If `y_pred` or `weights` is not as long as `y`.
///
/// ```
/// use tuneta::weighted_pearson;
///
/// let y = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let y_pred = [5.0, 4.0, 3.0, 2.0, 1.0];
/// assert!((weighted_pearson(&y, &y_pred, None) - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn weighted_pearson(y: &[f64], y_pred: &[f64], weights: Option<&[f64]>) -> f64 {
    let (y, y_pred, w) = drop_missing(y, y_pred, weights);
    pearson(&y, &y_pred, &w)
}

/// Weighted Spearman correlation magnitude of `y` and `y_pred`.
///
/// `weights` defaults to all ones. Invariant under strictly monotonic
/// transforms of either series.
///
/// # Panics
///
/// If `y_pred` or `weights` is not as long as `y`.
#[must_use]
pub fn weighted_spearman(y: &[f64], y_pred: &[f64], weights: Option<&[f64]>) -> f64 {
    let (y, y_pred, w) = drop_missing(y, y_pred, weights);
    pearson(&rank(&y_pred), &rank(&y), &w)
}

/// Keep positions where both series are present, with their weights.
fn drop_missing(
    y: &[f64],
    y_pred: &[f64],
    weights: Option<&[f64]>,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = y.len();
    assert_eq!(y_pred.len(), n, "y_pred must be as long as y");
    if let Some(w) = weights {
        assert_eq!(w.len(), n, "weights must be as long as y");
    }
    let mut ys = Vec::with_capacity(n);
    let mut ps = Vec::with_capacity(n);
    let mut ws = Vec::with_capacity(n);
    for i in 0..n {
        if y[i].is_nan() || y_pred[i].is_nan() {
            continue;
        }
        ys.push(y[i]);
        ps.push(y_pred[i]);
        ws.push(weights.map_or(1.0, |w| w[i]));
    }
    (ys, ps, ws)
}

/// Weighted Pearson magnitude on already-filtered, equal-length slices.
fn pearson(x: &[f64], y: &[f64], w: &[f64]) -> f64 {
    let total: f64 = w.iter().sum();
    let mean_x = x.iter().zip(w).map(|(v, w)| v * w).sum::<f64>() / total;
    let mean_y = y.iter().zip(w).map(|(v, w)| v * w).sum::<f64>() / total;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for ((xi, yi), wi) in x.iter().zip(y).zip(w) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += wi * dx * dy;
        var_x += wi * dx * dx;
        var_y += wi * dy * dy;
    }

    let corr = (cov / total) / (var_x * var_y / (total * total)).sqrt();
    if corr.is_finite() { corr.abs() } else { 0.0 }
}

/// Assign average ranks to a slice of `f64` values (handles ties).
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub(crate) fn rank(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(core::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        // Find the run of tied values.
        let mut j = i + 1;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }
        // Average rank for the tie group (1-based ranks).
        let avg = (i + 1..=j).sum::<usize>() as f64 / (j - i) as f64;
        for item in &indexed[i..j] {
            ranks[item.0] = avg;
        }
        i = j;
    }
    ranks
}
