//! Conditional breakdown of a histogram by a secondary covariate
//!
//! The population histogram is split by covariate ranges (typically the
//! virial velocity of the host halo) and each range is reported as its
//! fractional contribution to the total in every bin.
//!
//! Ranges are not validated: they may overlap or leave gaps, and each is
//! computed independently. Entries with a covariate `<= 0` (no associated
//! halo) belong to no range but still count toward the total.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::binning::{BinEdges, BinScale};
use crate::error::{StatsError, StatsResult};
use crate::histogram::Histogram;
use crate::sample::{select_columns, FilterIndex};

/// A labelled half-open covariate interval `[low, high)`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CovariateRange {
    pub low: f64,
    pub high: f64,
    pub label: String,
}

impl CovariateRange {
    pub fn new(low: f64, high: f64, label: impl Into<String>) -> Self {
        Self {
            low,
            high,
            label: label.into(),
        }
    }

    /// Whether a covariate value belongs to this range
    pub fn contains(&self, covariate: f64) -> bool {
        covariate > 0.0 && covariate >= self.low && covariate < self.high
    }
}

/// Ordered list of covariate ranges
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakdownSpec {
    ranges: Vec<CovariateRange>,
}

impl BreakdownSpec {
    pub fn new(ranges: Vec<CovariateRange>) -> Self {
        Self { ranges }
    }

    /// Append a range
    pub fn with_range(mut self, low: f64, high: f64, label: impl Into<String>) -> Self {
        self.ranges.push(CovariateRange::new(low, high, label));
        self
    }

    pub fn ranges(&self) -> &[CovariateRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// One fractional-contribution curve
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakdownCurve {
    pub label: String,
    pub low: f64,
    pub high: f64,
    /// Number of entries selected by the range
    pub count: usize,
    /// `H_subset / H_total` per bin
    pub fractions: Vec<f64>,
}

/// Per-range curves aligned to one set of bin centers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub edges: BinEdges,
    pub centers: Vec<f64>,
    /// Counts of the whole restricted population
    pub total: Vec<u64>,
    pub curves: Vec<BreakdownCurve>,
}

impl Breakdown {
    /// Curve for a label
    pub fn curve(&self, label: &str) -> Option<&BreakdownCurve> {
        self.curves.iter().find(|c| c.label == label)
    }

    /// Labels in range order
    pub fn labels(&self) -> Vec<&str> {
        self.curves.iter().map(|c| c.label.as_str()).collect()
    }
}

/// Break the histogram of `values` down by `covariate`.
///
/// `values` and `covariate` are restricted to `filter` first; bins are built
/// over the restricted values with `bin_width` on `scale`.
pub fn breakdown(
    values: &[f64],
    filter: &FilterIndex,
    covariate: &[f64],
    spec: &BreakdownSpec,
    bin_width: f64,
    scale: BinScale,
) -> StatsResult<Breakdown> {
    let restricted = select_columns(filter, &[("values", values), ("covariate", covariate)])?;
    let (values, covariate) = (&restricted[0], &restricted[1]);
    if values.is_empty() {
        return Err(StatsError::empty("breakdown filter selected no entries"));
    }

    let edges = BinEdges::from_values(values, bin_width, scale)?;
    let total = Histogram::new(values, &edges);
    debug!(
        population = values.len(),
        bins = edges.num_bins(),
        ranges = spec.ranges().len(),
        "computing covariate breakdown"
    );

    let mut curves = Vec::with_capacity(spec.ranges().len());
    for range in spec.ranges() {
        let subset: Vec<f64> = values
            .iter()
            .zip(covariate.iter())
            .filter(|(_, cov)| range.contains(**cov))
            .map(|(&v, _)| v)
            .collect();
        if subset.is_empty() {
            warn!(label = %range.label, low = range.low, high = range.high, "breakdown range selected no entries");
        }
        let fractions = Histogram::new(&subset, &edges).fraction_of(&total)?;
        curves.push(BreakdownCurve {
            label: range.label.clone(),
            low: range.low,
            high: range.high,
            count: subset.len(),
            fractions,
        });
    }

    Ok(Breakdown {
        centers: edges.centers(),
        total: total.counts().to_vec(),
        edges,
        curves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_ranges() -> BreakdownSpec {
        BreakdownSpec::default()
            .with_range(0.0, 100.0, "low")
            .with_range(100.0, 900.0, "high")
    }

    #[test]
    fn test_contains_half_open() {
        let range = CovariateRange::new(60.0, 120.0, "mid");
        assert!(range.contains(60.0));
        assert!(!range.contains(120.0));
        assert!(!CovariateRange::new(-10.0, 10.0, "x").contains(0.0));
    }

    #[test]
    fn test_breakdown_selects_by_covariate() {
        let values = [10.0, 20.0, 30.0, 40.0];
        let halo = [-1.0, 50.0, 150.0, 80.0];
        let result = breakdown(
            &values,
            &FilterIndex::All,
            &halo,
            &two_ranges(),
            10.0,
            BinScale::Linear,
        )
        .unwrap();

        assert_eq!(result.total, vec![1, 1, 1, 1]);
        let low = result.curve("low").unwrap();
        assert_eq!(low.count, 2);
        assert_eq!(low.fractions, vec![0.0, 1.0, 0.0, 1.0]);
        let high = result.curve("high").unwrap();
        assert_eq!(high.count, 1);
        assert_eq!(high.fractions, vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(result.labels(), vec!["low", "high"]);
    }

    #[test]
    fn test_breakdown_applies_filter() {
        let values = [10.0, 20.0, 30.0, 40.0];
        let halo = [-1.0, 50.0, 150.0, 80.0];
        let filter = FilterIndex::Indices(vec![1, 2]);
        let result = breakdown(&values, &filter, &halo, &two_ranges(), 5.0, BinScale::Linear)
            .unwrap();
        assert_eq!(result.curve("low").unwrap().count, 1);
        assert_eq!(result.curve("high").unwrap().count, 1);
    }

    #[test]
    fn test_empty_population() {
        let err = breakdown(
            &[1.0, 2.0],
            &FilterIndex::Mask(vec![false, false]),
            &[50.0, 60.0],
            &two_ranges(),
            0.1,
            BinScale::Log10,
        )
        .unwrap_err();
        assert!(matches!(err, StatsError::EmptyPopulation { .. }));
    }

    #[test]
    fn test_length_mismatch() {
        let err = breakdown(
            &[1.0, 2.0],
            &FilterIndex::All,
            &[50.0],
            &two_ranges(),
            0.1,
            BinScale::Log10,
        )
        .unwrap_err();
        assert!(matches!(err, StatsError::LengthMismatch { .. }));
    }

    #[test]
    fn test_overlapping_ranges_independent() {
        let spec = BreakdownSpec::default()
            .with_range(0.0, 200.0, "wide")
            .with_range(40.0, 60.0, "narrow");
        let result = breakdown(
            &[1.0, 2.0, 3.0],
            &FilterIndex::All,
            &[50.0, 50.0, 150.0],
            &spec,
            1.0,
            BinScale::Linear,
        )
        .unwrap();
        assert_eq!(result.curve("wide").unwrap().count, 3);
        assert_eq!(result.curve("narrow").unwrap().count, 2);
    }
}
