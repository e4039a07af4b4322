//! Error types for sightline-stats
//!
//! Every error here is a local input-validation failure. Nothing is retried
//! and no partial result is ever returned alongside an error.

use thiserror::Error;

/// Errors raised by the statistics engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Binning requested over an empty or constant array, or over a range
    /// narrower than a single bin
    #[error("Degenerate range for binning: {message}")]
    DegenerateRange { message: String },

    /// A log transform was requested on data containing zero or negative values
    #[error("Log transform of non-positive value {value} (index {index}) on {axis}")]
    NonPositiveLogInput {
        axis: String,
        index: usize,
        value: f64,
    },

    /// A selection produced no qualifying samples
    #[error("Empty population: {context}")]
    EmptyPopulation { context: String },

    /// Bin width not finite and positive
    #[error("Invalid bin width: {width}")]
    InvalidBinWidth { width: f64 },

    /// Zero bins requested
    #[error("Invalid bin count: {count}")]
    InvalidBinCount { count: usize },

    /// Explicit edges failed validation
    #[error("Invalid bin edges: {message}")]
    InvalidEdges { message: String },

    /// Two histograms combined element-wise were built on different edges
    #[error("Histograms do not share bin edges")]
    EdgeMismatch,

    /// Arrays consumed together do not share an index domain
    #[error("Length mismatch: {left} has {left_len} entries, {right} has {right_len}")]
    LengthMismatch {
        left: String,
        left_len: usize,
        right: String,
        right_len: usize,
    },

    /// An integer filter index points past the end of the array
    #[error("Index out of bounds: index {index}, size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    /// The least-squares system has no unique solution
    #[error("Singular line fit: {message}")]
    SingularFit { message: String },

    /// An option value outside its documented domain
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StatsError {
    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateRange {
            message: message.into(),
        }
    }

    pub(crate) fn empty(context: impl Into<String>) -> Self {
        Self::EmptyPopulation {
            context: context.into(),
        }
    }

    pub(crate) fn length_mismatch(
        left: &str,
        left_len: usize,
        right: &str,
        right_len: usize,
    ) -> Self {
        Self::LengthMismatch {
            left: left.to_string(),
            left_len,
            right: right.to_string(),
            right_len,
        }
    }
}

/// Result type alias for statistics operations
pub type StatsResult<T> = Result<T, StatsError>;

/// Apply `log10` to every value, refusing zero or negative input.
///
/// NaN passes through unchanged so the downstream reducers can drop it.
pub fn log10_checked(values: &[f64], axis: &str) -> StatsResult<Vec<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            if value <= 0.0 {
                Err(StatsError::NonPositiveLogInput {
                    axis: axis.to_string(),
                    index,
                    value,
                })
            } else {
                Ok(value.log10())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_display() {
        let err = StatsError::degenerate("min == max == 3");
        assert!(err.to_string().contains("min == max == 3"));
    }

    #[test]
    fn test_length_mismatch_display() {
        let err = StatsError::length_mismatch("x", 3, "y", 4);
        let msg = err.to_string();
        assert!(msg.contains("x has 3"));
        assert!(msg.contains("y has 4"));
    }

    #[test]
    fn test_log10_checked() {
        let logs = log10_checked(&[1.0, 10.0, 1000.0], "x").unwrap();
        let expected = [0.0, 1.0, 3.0];
        for (got, want) in logs.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_log10_checked_rejects_zero() {
        let err = log10_checked(&[1.0, 0.0], "metallicity").unwrap_err();
        assert_eq!(
            err,
            StatsError::NonPositiveLogInput {
                axis: "metallicity".to_string(),
                index: 1,
                value: 0.0,
            }
        );
    }
}
