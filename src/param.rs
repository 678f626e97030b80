//! Parameter schemas and sampled parameter values.
//!
//! An [`Indicator`](crate::indicator::Indicator) declares its tunable
//! parameters as a list of [`ParamSpec`]s. For each trial the study samples
//! one [`ParamValue`] per spec and hands the indicator a [`ParamSet`], which
//! keeps the values in declaration order together with their distributions
//! so categorical indices can be resolved back to their labels.

use crate::distribution::{
    CategoricalDistribution, Distribution, FloatDistribution, IntDistribution,
};
use crate::error::{Error, Result};

/// A type-erased sampled parameter value.
///
/// Stores float, integer, or categorical (index) values uniformly.
/// For categorical parameters the `Categorical` variant stores the
/// zero-based index into the choices array, not the choice itself.
///
/// # Display
///
/// `ParamValue` implements [`Display`](core::fmt::Display): floats and
/// integers print their numeric value, and categoricals print `category(i)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    /// A floating-point parameter value.
    Float(f64),
    /// An integer parameter value.
    Int(i64),
    /// A categorical index into the choices array.
    Categorical(usize),
}

impl ParamValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Categorical(_) => "categorical",
        }
    }
}

impl core::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Categorical(v) => write!(f, "category({v})"),
        }
    }
}

/// Declaration of one tunable parameter: a name and the distribution to
/// sample it from.
///
/// # Examples
///
/// ```
/// use tuneta::ParamSpec;
///
/// let schema = vec![
///     ParamSpec::int("length", 2, 50),
///     ParamSpec::float("std", 1.0, 3.0).step(0.5),
///     ParamSpec::categorical("source", ["close", "open"]),
/// ];
/// assert_eq!(schema[0].name(), "length");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    name: String,
    distribution: Distribution,
}

impl ParamSpec {
    /// A float parameter sampled uniformly from `[low, high]`.
    #[must_use]
    pub fn float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            distribution: Distribution::Float(FloatDistribution {
                low,
                high,
                step: None,
            }),
        }
    }

    /// An integer parameter sampled uniformly from `[low, high]`.
    #[must_use]
    pub fn int(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            distribution: Distribution::Int(IntDistribution {
                low,
                high,
                step: None,
            }),
        }
    }

    /// A categorical parameter choosing one of `choices`.
    #[must_use]
    pub fn categorical<I, S>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            distribution: Distribution::Categorical(CategoricalDistribution {
                choices: choices.into_iter().map(Into::into).collect(),
            }),
        }
    }

    /// Discretize a float or integer range. Float steps are truncated
    /// toward zero for integer ranges; ignored for categoricals.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn step(mut self, step: f64) -> Self {
        match &mut self.distribution {
            Distribution::Float(d) => d.step = Some(step),
            Distribution::Int(d) => d.step = Some(step as i64),
            Distribution::Categorical(_) => {}
        }
        self
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The distribution this parameter is sampled from.
    #[must_use]
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Check bounds, step and choices before sampling.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBounds`], [`Error::InvalidStep`] or
    /// [`Error::EmptyChoices`].
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> Result<()> {
        match &self.distribution {
            Distribution::Float(d) => {
                if d.low.is_nan() || d.high.is_nan() || d.low > d.high {
                    return Err(Error::InvalidBounds {
                        low: d.low,
                        high: d.high,
                    });
                }
                if let Some(step) = d.step
                    && (step.is_nan() || step <= 0.0)
                {
                    return Err(Error::InvalidStep);
                }
            }
            Distribution::Int(d) => {
                if d.low > d.high {
                    return Err(Error::InvalidBounds {
                        low: d.low as f64,
                        high: d.high as f64,
                    });
                }
                if let Some(step) = d.step
                    && step <= 0
                {
                    return Err(Error::InvalidStep);
                }
            }
            Distribution::Categorical(d) => {
                if d.choices.is_empty() {
                    return Err(Error::EmptyChoices);
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct ParamEntry {
    name: String,
    value: ParamValue,
    distribution: Distribution,
}

/// The sampled parameters of one trial, in the order they were suggested.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamSet {
    entries: Vec<ParamEntry>,
}

impl ParamSet {
    /// An empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: ParamValue,
        distribution: Distribution,
    ) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.value = value;
            entry.distribution = distribution;
        } else {
            self.entries.push(ParamEntry {
                name,
                value,
                distribution,
            });
        }
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no parameter was sampled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw value of `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entry(name).map(|e| &e.value)
    }

    /// The distribution `name` was sampled from, if present.
    #[must_use]
    pub fn distribution(&self, name: &str) -> Option<&Distribution> {
        self.entry(name).map(|e| &e.distribution)
    }

    /// `(name, value)` pairs in suggestion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.value))
    }

    /// Read an integer parameter.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownParameter`] or [`Error::ParameterType`].
    pub fn int(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(type_error(name, "int", other)),
        }
    }

    /// Read a float parameter. Integer values are widened.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownParameter`] or [`Error::ParameterType`].
    #[allow(clippy::cast_precision_loss)]
    pub fn float(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other @ ParamValue::Categorical(_) => Err(type_error(name, "float", other)),
        }
    }

    /// Read a categorical parameter as its label.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownParameter`], [`Error::ParameterType`], or
    /// [`Error::Internal`] if the stored index is out of range.
    pub fn choice(&self, name: &str) -> Result<&str> {
        let entry = self
            .entry(name)
            .ok_or_else(|| Error::UnknownParameter(name.to_owned()))?;
        match (&entry.value, &entry.distribution) {
            (ParamValue::Categorical(i), Distribution::Categorical(d)) => d
                .choices
                .get(*i)
                .map(String::as_str)
                .ok_or(Error::Internal("categorical index out of range")),
            (other, _) => Err(type_error(name, "categorical", other)),
        }
    }

    /// Render the parameters as a column-name fragment: `name:value` pairs
    /// joined with `_`, keeping only ASCII alphanumerics, `_` and `:`.
    /// Categorical values render as their label.
    ///
    /// ```
    /// use tuneta::{ParamSet, ParamSpec, ParamValue};
    ///
    /// let mut params = ParamSet::new();
    /// let length = ParamSpec::int("length", 2, 50);
    /// params.insert("length", ParamValue::Int(14), length.distribution().clone());
    /// assert_eq!(params.label(), "length:14");
    /// ```
    #[must_use]
    pub fn label(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                let value = match (&e.value, &e.distribution) {
                    (ParamValue::Categorical(i), Distribution::Categorical(d)) => d
                        .choices
                        .get(*i)
                        .cloned()
                        .unwrap_or_else(|| i.to_string()),
                    (v, _) => v.to_string(),
                };
                sanitize(&format!("{}:{value}", e.name))
            })
            .collect::<Vec<_>>()
            .join("_")
    }

    fn entry(&self, name: &str) -> Option<&ParamEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn require(&self, name: &str) -> Result<&ParamValue> {
        self.get(name)
            .ok_or_else(|| Error::UnknownParameter(name.to_owned()))
    }
}

fn type_error(name: &str, requested: &'static str, actual: &ParamValue) -> Error {
    Error::ParameterType {
        name: name.to_owned(),
        requested,
        actual: actual.kind(),
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ':')
        .collect()
}
