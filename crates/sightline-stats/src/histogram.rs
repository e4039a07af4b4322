//! Histogram reduction over engine-provided bins
//!
//! Counts are kept raw. Density normalisation and the zero-substitution used
//! for ratio denominators are separate, copying operations, so a histogram is
//! never modified after it has been built.

use serde::{Deserialize, Serialize};

use crate::binning::BinEdges;
use crate::error::{StatsError, StatsResult};
use crate::sample::FilterIndex;

/// Raw counts over a set of half-open bins
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    edges: BinEdges,
    counts: Vec<u64>,
    /// Values that fell outside every bin (or were NaN)
    dropped: usize,
}

impl Histogram {
    /// Count `values` into `edges`. Values outside `[lower, upper)` are dropped.
    pub fn new(values: &[f64], edges: &BinEdges) -> Self {
        let mut counts = vec![0u64; edges.num_bins()];
        let mut dropped = 0;
        for &value in values {
            match edges.bin_index(value) {
                Some(bin) => counts[bin] += 1,
                None => dropped += 1,
            }
        }
        Self {
            edges: edges.clone(),
            counts,
            dropped,
        }
    }

    /// Count only the entries of `values` selected by `filter`
    pub fn filtered(values: &[f64], filter: &FilterIndex, edges: &BinEdges) -> StatsResult<Self> {
        let selected = filter.select(values)?;
        Ok(Self::new(&selected, edges))
    }

    /// The bin edges
    pub fn edges(&self) -> &BinEdges {
        &self.edges
    }

    /// Raw counts per bin
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of values counted into some bin
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of values outside the bins
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Bin centers
    pub fn centers(&self) -> Vec<f64> {
        self.edges.centers()
    }

    /// Probability density: `count / (total * width)` with the true width of
    /// each bin, so log bins are normalised correctly.
    pub fn density(&self) -> StatsResult<Vec<f64>> {
        let total = self.total();
        if total == 0 {
            return Err(StatsError::empty("no values inside the histogram range"));
        }
        Ok(self
            .counts
            .iter()
            .zip(self.edges.widths())
            .map(|(&count, width)| count as f64 / (total as f64 * width))
            .collect())
    }

    /// Copy of the counts with every zero replaced by one.
    ///
    /// Ratio denominators use this copy. The substitution biases sparse-bin
    /// fractions toward zero instead of producing NaN.
    pub fn zero_substituted_counts(&self) -> Vec<f64> {
        self.counts
            .iter()
            .map(|&c| if c == 0 { 1.0 } else { c as f64 })
            .collect()
    }

    /// Element-wise `self / max(denominator, 1)`
    pub fn fraction_of(&self, denominator: &Histogram) -> StatsResult<Vec<f64>> {
        if self.edges != denominator.edges {
            return Err(StatsError::EdgeMismatch);
        }
        Ok(self
            .counts
            .iter()
            .zip(denominator.zero_substituted_counts())
            .map(|(&num, den)| num as f64 / den)
            .collect())
    }

    /// Counts or density paired with the bin centers
    pub fn to_series(&self, normalization: Normalization) -> StatsResult<BinnedSeries> {
        let values = match normalization {
            Normalization::Counts => self.counts.iter().map(|&c| c as f64).collect(),
            Normalization::Density => self.density()?,
        };
        Ok(BinnedSeries::new(self.centers(), values))
    }
}

/// How histogram counts are reported
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    /// Raw counts
    Counts,
    /// Probability density
    Density,
}

impl Normalization {
    pub fn from_density_flag(density: bool) -> Self {
        if density {
            Normalization::Density
        } else {
            Normalization::Counts
        }
    }
}

/// `(bin_centers, values)` as handed to a presentation layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinnedSeries {
    pub centers: Vec<f64>,
    pub values: Vec<f64>,
}

impl BinnedSeries {
    pub fn new(centers: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(centers.len(), values.len());
        Self { centers, values }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Check if the series has no points
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Iterate `(center, value)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.centers.iter().copied().zip(self.values.iter().copied())
    }

    /// Serialize for the rendering layer
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Reduce `values` to a histogram over `edges`, as counts or density
pub fn histogram(values: &[f64], edges: &BinEdges, density: bool) -> StatsResult<BinnedSeries> {
    Histogram::new(values, edges).to_series(Normalization::from_density_flag(density))
}
