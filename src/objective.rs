//! Turning one indicator candidate into objective values.
//!
//! The [`Evaluator`] runs an indicator on the feature frame, aligns the
//! selected output column to the target's index, and either scores it or
//! rejects it as mostly missing. Aligned outputs are kept in an
//! [`OutputArchive`] so the winning column never has to be recomputed.

use std::sync::Arc;

use crate::correlation::Metric;
use crate::error::{Error, Result};
use crate::frame::{FeatureFrame, Target, reindex};
use crate::indicator::Indicator;
use crate::param::ParamSet;

/// Largest tolerated fraction of NaN rows in an aligned output.
pub const MAX_NAN_FRACTION: f64 = 0.95;

/// The outcome of evaluating one trial.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluation {
    /// One objective value per direction of the study.
    Scored(Vec<f64>),
    /// The candidate produced too little usable output to be scored.
    Rejected,
}

/// Aligned indicator outputs, positionally indexed by trial id.
///
/// Rejected trials hold `None`. Trial ids are dense from zero, so the
/// archive is a plain `Vec`.
#[derive(Clone, Debug, Default)]
pub struct OutputArchive {
    outputs: Vec<Option<Vec<f64>>>,
}

impl OutputArchive {
    /// An empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the output of `trial_id`, growing the archive as needed.
    pub fn record(&mut self, trial_id: u64, output: Option<Vec<f64>>) {
        let Ok(slot) = usize::try_from(trial_id) else {
            return;
        };
        if self.outputs.len() <= slot {
            self.outputs.resize(slot + 1, None);
        }
        self.outputs[slot] = output;
    }

    /// The aligned output of `trial_id`, if it was scored.
    #[must_use]
    pub fn get(&self, trial_id: u64) -> Option<&[f64]> {
        usize::try_from(trial_id)
            .ok()
            .and_then(|slot| self.outputs.get(slot))
            .and_then(|o| o.as_deref())
    }

    /// Number of slots, rejected ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Scores candidates of one indicator against a target.
#[derive(Clone)]
pub struct Evaluator {
    indicator: Arc<dyn Indicator>,
    output_index: usize,
    metric: Metric,
}

impl Evaluator {
    /// Evaluate column `output_index` of `indicator` with `metric`.
    #[must_use]
    pub fn new(indicator: Arc<dyn Indicator>, output_index: usize, metric: Metric) -> Self {
        Self {
            indicator,
            output_index,
            metric,
        }
    }

    /// The indicator being evaluated.
    #[must_use]
    pub fn indicator(&self) -> &Arc<dyn Indicator> {
        &self.indicator
    }

    /// Run the indicator with `params` and score the result.
    ///
    /// With `segments`, returns one score per `[b[i], b[i+1])` row range of
    /// the aligned series; otherwise a single score over all rows. The
    /// aligned column is stored in `archive` under `trial_id`, or `None` if
    /// the trial was rejected.
    ///
    /// # Errors
    ///
    /// [`Error::Execution`] if the indicator fails, has no column at the
    /// configured index, or returns a non-numeric column;
    /// [`Error::Shape`] if the column length differs from the frame's row
    /// count; [`Error::InvalidFrame`] if the frame index repeats a label.
    /// Mismatched weights or bad segment boundaries are reported before the
    /// indicator runs.
    #[allow(clippy::too_many_arguments, clippy::cast_precision_loss)]
    pub fn evaluate(
        &self,
        trial_id: u64,
        params: &ParamSet,
        frame: &FeatureFrame,
        target: &Target,
        weights: Option<&[f64]>,
        segments: Option<&[usize]>,
        archive: &mut OutputArchive,
    ) -> Result<Evaluation> {
        if let Some(w) = weights
            && w.len() != target.len()
        {
            return Err(Error::LengthMismatch {
                what: "weights",
                expected: target.len(),
                got: w.len(),
            });
        }
        if let Some(bounds) = segments {
            validate_segments(bounds, target.len())?;
        }

        let name = self.indicator.name();
        let execution = |reason: String| Error::Execution {
            indicator: name.to_owned(),
            reason,
        };
        let columns = self
            .indicator
            .compute(frame.data_frame(), params)
            .map_err(|e| execution(e.to_string()))?;
        let column = columns.get(self.output_index).ok_or_else(|| {
            execution(format!(
                "output index {} out of range for {} column(s)",
                self.output_index,
                columns.len()
            ))
        })?;
        if !column.dtype().is_primitive_numeric() {
            return Err(execution(format!(
                "output column '{}' has non-numeric type {}",
                column.name(),
                column.dtype()
            )));
        }
        if column.len() != frame.len() {
            return Err(Error::Shape {
                indicator: name.to_owned(),
                expected: frame.len(),
                got: column.len(),
            });
        }

        let aligned = reindex(frame.index(), column, target.index())?;
        let missing = aligned.iter().filter(|v| v.is_nan()).count();
        if aligned.is_empty() || missing as f64 / aligned.len() as f64 > MAX_NAN_FRACTION {
            trace_info!(
                trial = trial_id,
                params = %params.label(),
                missing,
                rows = aligned.len(),
                "trial rejected: indicator output is mostly NaN"
            );
            archive.record(trial_id, None);
            return Ok(Evaluation::Rejected);
        }

        let y = target.values();
        let scores = match segments {
            Some(bounds) => bounds
                .windows(2)
                .map(|pair| {
                    let (start, end) = (pair[0], pair[1]);
                    self.metric.score(
                        &y[start..end],
                        &aligned[start..end],
                        weights.map(|w| &w[start..end]),
                    )
                })
                .collect(),
            None => vec![self.metric.score(y, &aligned, weights)],
        };
        archive.record(trial_id, Some(aligned));
        Ok(Evaluation::Scored(scores))
    }
}

/// Check that `bounds` are usable segment boundaries for `len` rows.
///
/// # Errors
///
/// [`Error::InvalidSegments`] if there are fewer than two boundaries, they
/// are not strictly increasing, or the last exceeds `len`.
pub fn validate_segments(bounds: &[usize], len: usize) -> Result<()> {
    if bounds.len() < 2 {
        return Err(Error::InvalidSegments(format!(
            "need at least two boundaries, got {}",
            bounds.len()
        )));
    }
    if let Some(pair) = bounds.windows(2).find(|p| p[0] >= p[1]) {
        return Err(Error::InvalidSegments(format!(
            "boundaries must be strictly increasing, found {} then {}",
            pair[0], pair[1]
        )));
    }
    match bounds.last() {
        Some(&last) if last > len => Err(Error::InvalidSegments(format!(
            "last boundary {last} exceeds target length {len}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{NamedFrom, Series};

    use super::*;
    use crate::error::IndicatorError;
    use crate::indicator::IndicatorFn;

    fn frame(n: i64) -> FeatureFrame {
        FeatureFrame::new((0..n).collect())
    }

    fn target(values: Vec<f64>) -> Target {
        let n = i64::try_from(values.len()).unwrap();
        Target::new((0..n).collect(), values).unwrap()
    }

    fn constant_output(columns: Vec<Vec<f64>>) -> Arc<dyn Indicator> {
        Arc::new(IndicatorFn::new("fixed", Vec::new(), move |_, _| {
            Ok(columns
                .iter()
                .map(|c| Series::new("out".into(), c.clone()))
                .collect())
        }))
    }

    #[test]
    fn whole_series_yields_one_score() {
        let y: Vec<f64> = (0..10).map(f64::from).collect();
        let eval = Evaluator::new(constant_output(vec![y.clone()]), 0, Metric::Pearson);
        let mut archive = OutputArchive::new();
        let out = eval
            .evaluate(0, &ParamSet::new(), &frame(10), &target(y), None, None, &mut archive)
            .unwrap();
        let Evaluation::Scored(scores) = out else {
            panic!("expected a score");
        };
        assert_eq!(scores.len(), 1);
        assert!((scores[0] - 1.0).abs() < 1e-12);
        assert_eq!(archive.get(0).map(<[f64]>::len), Some(10));
    }

    #[test]
    fn segments_yield_one_score_each() {
        let y: Vec<f64> = (0..10).map(f64::from).collect();
        // Perfect in the first segment, constant in the second, inverse in
        // the third.
        let pred = vec![0.0, 1.0, 2.0, 5.0, 5.0, 5.0, 9.0, 8.0, 7.0, 6.0];
        let eval = Evaluator::new(constant_output(vec![pred]), 0, Metric::Spearman);
        let mut archive = OutputArchive::new();
        let out = eval
            .evaluate(
                0,
                &ParamSet::new(),
                &frame(10),
                &target(y),
                None,
                Some(&[0, 3, 6, 10]),
                &mut archive,
            )
            .unwrap();
        let Evaluation::Scored(scores) = out else {
            panic!("expected scores");
        };
        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 1.0).abs() < 1e-12);
        assert_eq!(scores[1], 0.0);
        assert!((scores[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mostly_nan_output_is_rejected() {
        let mut pred = vec![f64::NAN; 100];
        pred[0] = 1.0;
        pred[50] = 2.0;
        pred[99] = 3.0;
        let eval = Evaluator::new(constant_output(vec![pred]), 0, Metric::Spearman);
        let mut archive = OutputArchive::new();
        let y: Vec<f64> = (0..100).map(f64::from).collect();
        let out = eval
            .evaluate(3, &ParamSet::new(), &frame(100), &target(y), None, None, &mut archive)
            .unwrap();
        assert_eq!(out, Evaluation::Rejected);
        assert_eq!(archive.len(), 4);
        assert!(archive.get(3).is_none());
    }

    #[test]
    fn five_percent_usable_is_kept() {
        let pred: Vec<f64> = (0..100)
            .map(|i| if i % 20 == 0 { f64::from(i) } else { f64::NAN })
            .collect();
        let eval = Evaluator::new(constant_output(vec![pred]), 0, Metric::Spearman);
        let y: Vec<f64> = (0..100).map(f64::from).collect();
        let out = eval
            .evaluate(
                0,
                &ParamSet::new(),
                &frame(100),
                &target(y),
                None,
                None,
                &mut OutputArchive::new(),
            )
            .unwrap();
        assert!(matches!(out, Evaluation::Scored(_)));
    }

    #[test]
    fn indicator_failure_is_execution_error() {
        let failing: Arc<dyn Indicator> = Arc::new(IndicatorFn::new("bad", Vec::new(), |_, _| {
            Err(IndicatorError::Computation("division by zero".into()))
        }));
        let eval = Evaluator::new(failing, 0, Metric::Spearman);
        let err = eval
            .evaluate(
                0,
                &ParamSet::new(),
                &frame(3),
                &target(vec![1.0, 2.0, 3.0]),
                None,
                None,
                &mut OutputArchive::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Execution { indicator, .. } if indicator == "bad"));
    }

    #[test]
    fn missing_output_column_is_execution_error() {
        let eval = Evaluator::new(constant_output(vec![vec![1.0; 3]]), 2, Metric::Spearman);
        let err = eval
            .evaluate(
                0,
                &ParamSet::new(),
                &frame(3),
                &target(vec![1.0, 2.0, 3.0]),
                None,
                None,
                &mut OutputArchive::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
    }

    #[test]
    fn wrong_row_count_is_shape_error() {
        let eval = Evaluator::new(constant_output(vec![vec![1.0; 2]]), 0, Metric::Spearman);
        let err = eval
            .evaluate(
                0,
                &ParamSet::new(),
                &frame(3),
                &target(vec![1.0, 2.0, 3.0]),
                None,
                None,
                &mut OutputArchive::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Shape { expected: 3, got: 2, .. }));
    }

    #[test]
    fn non_numeric_output_is_execution_error() {
        let labels: Arc<dyn Indicator> = Arc::new(IndicatorFn::new("labels", Vec::new(), |_, _| {
            Ok(vec![Series::new("out".into(), ["a", "b", "c"])])
        }));
        let err = Evaluator::new(labels, 0, Metric::Spearman)
            .evaluate(
                0,
                &ParamSet::new(),
                &frame(3),
                &target(vec![1.0, 2.0, 3.0]),
                None,
                None,
                &mut OutputArchive::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Execution { reason, .. } if reason.contains("non-numeric")));
    }

    #[test]
    fn repeated_frame_labels_are_an_error() {
        let eval = Evaluator::new(constant_output(vec![vec![1.0, 2.0, 3.0]]), 0, Metric::Pearson);
        let err = eval
            .evaluate(
                0,
                &ParamSet::new(),
                &FeatureFrame::new(vec![0, 1, 1]),
                &target(vec![1.0, 2.0, 3.0]),
                None,
                None,
                &mut OutputArchive::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFrame(_)));
    }

    #[test]
    fn output_is_aligned_to_target_index() {
        let x = FeatureFrame::new(vec![10, 11, 12, 13]);
        let y = Target::new(vec![11, 12, 13, 14], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let eval = Evaluator::new(
            constant_output(vec![vec![0.0, 1.0, 2.0, 3.0]]),
            0,
            Metric::Pearson,
        );
        let mut archive = OutputArchive::new();
        eval.evaluate(0, &ParamSet::new(), &x, &y, None, None, &mut archive)
            .unwrap();
        let aligned = archive.get(0).unwrap();
        assert_eq!(&aligned[..3], &[1.0, 2.0, 3.0]);
        assert!(aligned[3].is_nan());
    }

    #[test]
    fn segment_validation() {
        assert!(validate_segments(&[0, 3, 6, 10], 10).is_ok());
        assert!(validate_segments(&[0], 10).is_err());
        assert!(validate_segments(&[0, 5, 5], 10).is_err());
        assert!(validate_segments(&[0, 5, 11], 10).is_err());
    }
}
