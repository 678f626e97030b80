//! Parameter distributions a [`Sampler`](crate::sampler::Sampler) draws from.

/// A search-space distribution for one parameter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Distribution {
    /// Continuous range.
    Float(FloatDistribution),
    /// Integer range.
    Int(IntDistribution),
    /// A finite set of labelled choices.
    Categorical(CategoricalDistribution),
}

/// Uniform float range `[low, high]`, optionally discretized by `step`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatDistribution {
    /// Lower bound (inclusive).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
    /// Optional grid spacing starting at `low`.
    pub step: Option<f64>,
}

/// Uniform integer range `[low, high]`, optionally discretized by `step`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntDistribution {
    /// Lower bound (inclusive).
    pub low: i64,
    /// Upper bound (inclusive).
    pub high: i64,
    /// Optional grid spacing starting at `low`.
    pub step: Option<i64>,
}

/// Uniform choice over labelled options.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoricalDistribution {
    /// The option labels; sampled values are indices into this list.
    pub choices: Vec<String>,
}
