//! Built-in moving-average, momentum, and band indicators.
//!
//! Each reads one source column of the frame (`close` unless configured with
//! `on`) and tunes a window `length`; [`BollingerBands`] also tunes its
//! band width `std`. Warm-up rows are NaN, and a NaN input poisons only the
//! windows that contain it.

use polars::prelude::{DataFrame, NamedFrom, Series};

use crate::error::IndicatorError;
use crate::frame::float_values;
use crate::indicator::{Indicator, IndicatorResult};
use crate::param::{ParamSet, ParamSpec};

const DEFAULT_SOURCE: &str = "close";

/// The `column` of `frame` as `f64`, nulls read as NaN.
fn source(frame: &DataFrame, column: &str) -> Result<Vec<f64>, IndicatorError> {
    let series = frame
        .column(column)
        .map_err(|_| IndicatorError::MissingColumn(column.to_owned()))?
        .as_materialized_series();
    Ok(float_values(series)?)
}

fn window(params: &ParamSet, name: &str) -> Result<usize, IndicatorError> {
    let raw = params.int(name)?;
    match usize::try_from(raw) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(IndicatorError::InvalidParameter {
            name: name.to_owned(),
            reason: format!("window must be positive, got {raw}"),
        }),
    }
}

macro_rules! length_indicator {
    ($(#[$doc:meta])* $ty:ident, $name:literal, $low:literal, $high:literal) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $ty {
            source: String,
            low: i64,
            high: i64,
        }

        impl $ty {
            /// Reads the `close` column.
            #[must_use]
            pub fn new() -> Self {
                Self {
                    source: DEFAULT_SOURCE.to_owned(),
                    low: $low,
                    high: $high,
                }
            }

            /// Read `column` instead of `close`.
            #[must_use]
            pub fn on(mut self, column: impl Into<String>) -> Self {
                self.source = column.into();
                self
            }

            /// Search `length` over `[low, high]`.
            #[must_use]
            pub fn length_range(mut self, low: i64, high: i64) -> Self {
                self.low = low;
                self.high = high;
                self
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Indicator for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn schema(&self) -> Vec<ParamSpec> {
                vec![ParamSpec::int("length", self.low, self.high)]
            }

            fn compute(&self, frame: &DataFrame, params: &ParamSet) -> IndicatorResult {
                let values = source(frame, &self.source)?;
                let length = window(params, "length")?;
                Ok(vec![Series::new($name.into(), Self::apply(&values, length))])
            }
        }
    };
}

length_indicator!(
    /// Simple moving average over `length` rows.
    Sma, "sma", 2, 200
);

length_indicator!(
    /// Exponential moving average with `alpha = 2 / (length + 1)`, seeded
    /// with the simple average of the first window.
    Ema, "ema", 2, 200
);

length_indicator!(
    /// Relative strength index with Wilder smoothing.
    Rsi, "rsi", 2, 100
);

length_indicator!(
    /// Percent rate of change over `length` rows.
    RateOfChange, "roc", 1, 100
);

impl Sma {
    fn apply(values: &[f64], length: usize) -> Vec<f64> {
        rolling(values, length, mean)
    }
}

impl Ema {
    #[allow(clippy::cast_precision_loss)]
    fn apply(values: &[f64], length: usize) -> Vec<f64> {
        let alpha = 2.0 / (length as f64 + 1.0);
        let mut out = vec![f64::NAN; values.len()];
        if values.len() < length {
            return out;
        }
        let mut state = mean(&values[..length]);
        out[length - 1] = state;
        for (&v, slot) in values[length..].iter().zip(&mut out[length..]) {
            if v.is_nan() {
                continue;
            }
            state = if state.is_nan() { v } else { alpha * v + (1.0 - alpha) * state };
            *slot = state;
        }
        out
    }
}

impl Rsi {
    #[allow(clippy::cast_precision_loss)]
    fn apply(values: &[f64], length: usize) -> Vec<f64> {
        let n = values.len();
        let mut out = vec![f64::NAN; n];
        if n <= length {
            return out;
        }
        let change = |i: usize| values[i] - values[i - 1];
        let period = length as f64;

        let mut gain = 0.0;
        let mut loss = 0.0;
        for i in 1..=length {
            let d = change(i);
            gain += d.max(0.0);
            loss += (-d).max(0.0);
        }
        gain /= period;
        loss /= period;
        out[length] = strength(gain, loss);

        for i in length + 1..n {
            let d = change(i);
            if d.is_nan() {
                continue;
            }
            gain = (gain * (period - 1.0) + d.max(0.0)) / period;
            loss = (loss * (period - 1.0) + (-d).max(0.0)) / period;
            out[i] = strength(gain, loss);
        }
        out
    }
}

#[allow(clippy::float_cmp)]
fn strength(gain: f64, loss: f64) -> f64 {
    if gain.is_nan() || loss.is_nan() {
        f64::NAN
    } else if loss == 0.0 {
        if gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + gain / loss)
    }
}

impl RateOfChange {
    fn apply(values: &[f64], length: usize) -> Vec<f64> {
        (0..values.len())
            .map(|i| {
                if i < length {
                    f64::NAN
                } else {
                    let prev = values[i - length];
                    100.0 * (values[i] - prev) / prev
                }
            })
            .collect()
    }
}

/// Bollinger bands: a simple moving average with bands `std` population
/// standard deviations either side. Outputs lower, middle, upper.
#[derive(Clone, Debug)]
pub struct BollingerBands {
    source: String,
    low: i64,
    high: i64,
}

impl BollingerBands {
    /// Reads the `close` column.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_owned(),
            low: 5,
            high: 100,
        }
    }

    /// Read `column` instead of `close`.
    #[must_use]
    pub fn on(mut self, column: impl Into<String>) -> Self {
        self.source = column.into();
        self
    }

    /// Search `length` over `[low, high]`.
    #[must_use]
    pub fn length_range(mut self, low: i64, high: i64) -> Self {
        self.low = low;
        self.high = high;
        self
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &str {
        "bbands"
    }

    fn schema(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::int("length", self.low, self.high),
            ParamSpec::float("std", 1.0, 3.0).step(0.25),
        ]
    }

    fn compute(&self, frame: &DataFrame, params: &ParamSet) -> IndicatorResult {
        let values = source(frame, &self.source)?;
        let length = window(params, "length")?;
        let width = params.float("std")?;
        if !width.is_finite() || width < 0.0 {
            return Err(IndicatorError::InvalidParameter {
                name: "std".to_owned(),
                reason: format!("band width must be finite and non-negative, got {width}"),
            });
        }

        let middle = rolling(&values, length, mean);
        let spread = rolling(&values, length, population_std);
        let lower: Vec<f64> = middle.iter().zip(&spread).map(|(m, s)| m - width * s).collect();
        let upper: Vec<f64> = middle.iter().zip(&spread).map(|(m, s)| m + width * s).collect();
        Ok(vec![
            Series::new("lower".into(), lower),
            Series::new("middle".into(), middle),
            Series::new("upper".into(), upper),
        ])
    }
}

/// Apply `f` to every full trailing window of `length` rows.
fn rolling(values: &[f64], length: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i + 1 < length {
                f64::NAN
            } else {
                f(&values[i + 1 - length..=i])
            }
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean(w: &[f64]) -> f64 {
    w.iter().sum::<f64>() / w.len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn population_std(w: &[f64]) -> f64 {
    let m = mean(w);
    (w.iter().map(|v| (v - m).powi(2)).sum::<f64>() / w.len() as f64).sqrt()
}
