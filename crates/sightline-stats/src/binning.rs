//! Bin edge construction for population histograms
//!
//! Edges are either linearly spaced or log-spaced (an exponentiated linear
//! sequence). All bins are half-open: `[edge[i], edge[i+1])`.
//!
//! # Examples
//!
//! ```
//! use sightline_stats::binning::{BinEdges, BinScale};
//!
//! let values = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0];
//! let edges = BinEdges::from_values(&values, 1.0, BinScale::Linear).unwrap();
//! assert_eq!(edges.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
//! assert_eq!(edges.centers(), vec![1.5, 2.5, 3.5]);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StatsError, StatsResult};

/// Upper limit on the number of bins a single call may produce
pub const MAX_BINS: usize = 1 << 20;

/// Spacing of a set of bin edges
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinScale {
    /// Evenly spaced edges
    Linear,
    /// Edges evenly spaced in log10
    Log10,
}

impl BinScale {
    /// Check if this is a log scale
    pub fn is_log(&self) -> bool {
        matches!(self, BinScale::Log10)
    }

    /// Map a value into the domain the edges are spaced in
    pub fn to_domain(&self, value: f64) -> f64 {
        match self {
            BinScale::Linear => value,
            BinScale::Log10 => value.log10(),
        }
    }

    /// Map a value from the spacing domain back to data units
    pub fn from_domain(&self, value: f64) -> f64 {
        match self {
            BinScale::Linear => value,
            BinScale::Log10 => 10f64.powf(value),
        }
    }
}

impl Default for BinScale {
    fn default() -> Self {
        BinScale::Linear
    }
}

/// A strictly increasing set of at least two bin edges
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinEdges {
    edges: Vec<f64>,
    scale: BinScale,
}

impl BinEdges {
    /// Build edges spanning the finite values of `values`.
    ///
    /// The first edge is the data minimum and edges advance by `bin_width`
    /// (in log10 for [`BinScale::Log10`]) until one lies above the maximum,
    /// so every finite input value lands in exactly one bin.
    pub fn from_values(values: &[f64], bin_width: f64, scale: BinScale) -> StatsResult<Self> {
        check_width(bin_width)?;
        let (min, max) = finite_extent(values)?;

        if scale.is_log() {
            if let Some((index, &value)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| v.is_finite() && **v <= 0.0)
            {
                return Err(StatsError::NonPositiveLogInput {
                    axis: "bin values".to_string(),
                    index,
                    value,
                });
            }
        }

        if min == max {
            return Err(StatsError::degenerate(format!("min == max == {}", min)));
        }

        let lo = scale.to_domain(min);
        let hi = scale.to_domain(max);
        let mut edges: Vec<f64> = covering_steps(lo, hi, bin_width)?
            .into_iter()
            .map(|e| scale.from_domain(e))
            .collect();

        // Pin the first edge so 10^log10(min) rounding cannot drop the minimum
        edges[0] = min;
        while let Some(&last) = edges.last().filter(|&&e| e <= max) {
            let next = scale.from_domain(scale.to_domain(last) + bin_width);
            // A step below the float resolution of the data never advances
            if !(next > last) || edges.len() > MAX_BINS {
                return Err(StatsError::InvalidBinWidth { width: bin_width });
            }
            edges.push(next);
        }

        debug!(
            bins = edges.len() - 1,
            ?scale,
            min,
            max,
            "built bin edges from sample"
        );
        Self::from_edges(edges, scale)
    }

    /// Linear edges `arange(lo, hi, bin_width)`; `hi` itself is never an edge.
    pub fn linear_range(lo: f64, hi: f64, bin_width: f64) -> StatsResult<Self> {
        check_width(bin_width)?;
        let edges = arange(lo, hi, bin_width)?;
        Self::from_edges(edges, BinScale::Linear)
    }

    /// Log edges `10 ** arange(log_lo, log_hi, bin_width)`
    pub fn log_range(log_lo: f64, log_hi: f64, bin_width: f64) -> StatsResult<Self> {
        check_width(bin_width)?;
        let edges = arange(log_lo, log_hi, bin_width)?
            .into_iter()
            .map(|e| 10f64.powf(e))
            .collect();
        Self::from_edges(edges, BinScale::Log10)
    }

    /// `n_edges` evenly spaced linear edges from `lo` to `hi` inclusive
    pub fn linspace(lo: f64, hi: f64, n_edges: usize) -> StatsResult<Self> {
        if n_edges < 2 || n_edges > MAX_BINS + 1 {
            return Err(StatsError::InvalidBinCount { count: n_edges });
        }
        let step = (hi - lo) / (n_edges - 1) as f64;
        let mut edges: Vec<f64> = (0..n_edges).map(|i| lo + i as f64 * step).collect();
        edges[n_edges - 1] = hi;
        Self::from_edges(edges, BinScale::Linear)
    }

    /// Validate caller-supplied edges
    pub fn from_edges(edges: Vec<f64>, scale: BinScale) -> StatsResult<Self> {
        if edges.len() < 2 {
            return Err(StatsError::degenerate(format!(
                "{} edge(s), at least 2 required",
                edges.len()
            )));
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(StatsError::InvalidEdges {
                message: format!("non-finite edge {}", bad),
            });
        }
        if let Some(w) = edges.windows(2).find(|w| w[1] <= w[0]) {
            return Err(StatsError::InvalidEdges {
                message: format!("edges not strictly increasing at {} -> {}", w[0], w[1]),
            });
        }
        if scale.is_log() && edges[0] <= 0.0 {
            return Err(StatsError::InvalidEdges {
                message: format!("log edges must be positive, got {}", edges[0]),
            });
        }
        Ok(Self { edges, scale })
    }

    /// The raw edges
    pub fn as_slice(&self) -> &[f64] {
        &self.edges
    }

    /// Spacing of the edges
    pub fn scale(&self) -> BinScale {
        self.scale
    }

    /// Number of bins (one fewer than the number of edges)
    pub fn num_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Lowest edge
    pub fn lower(&self) -> f64 {
        self.edges[0]
    }

    /// Highest edge
    pub fn upper(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Bin centers, averaged in the domain the edges are spaced in.
    ///
    /// Log bins average the log10 edges and re-exponentiate.
    pub fn centers(&self) -> Vec<f64> {
        self.edges
            .windows(2)
            .map(|w| {
                let mid = (self.scale.to_domain(w[0]) + self.scale.to_domain(w[1])) / 2.0;
                self.scale.from_domain(mid)
            })
            .collect()
    }

    /// True edge-to-edge width of every bin
    pub fn widths(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Index of the half-open bin containing `value`
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if !(value >= self.lower() && value < self.upper()) {
            return None;
        }
        Some(self.edges.partition_point(|e| *e <= value) - 1)
    }

    /// Like [`bin_index`](Self::bin_index) but the last bin also takes the
    /// upper edge. Used for grids derived from the data extent.
    pub fn bin_index_closed(&self, value: f64) -> Option<usize> {
        if value == self.upper() {
            return Some(self.num_bins() - 1);
        }
        self.bin_index(value)
    }

    /// Re-express log edges as linear edges over log10 of the data.
    ///
    /// Linear edges are returned unchanged.
    pub fn log_domain(&self) -> BinEdges {
        match self.scale {
            BinScale::Linear => self.clone(),
            BinScale::Log10 => BinEdges {
                edges: self.edges.iter().map(|e| e.log10()).collect(),
                scale: BinScale::Linear,
            },
        }
    }
}

/// Bin centers of `edges`
pub fn bin_centers(edges: &BinEdges) -> Vec<f64> {
    edges.centers()
}

/// Build bins spanning `values`
pub fn make_bins(values: &[f64], bin_width: f64, scale: BinScale) -> StatsResult<BinEdges> {
    BinEdges::from_values(values, bin_width, scale)
}

fn check_width(bin_width: f64) -> StatsResult<()> {
    if !(bin_width.is_finite() && bin_width > 0.0) {
        return Err(StatsError::InvalidBinWidth { width: bin_width });
    }
    Ok(())
}

/// Min and max of the finite entries
pub(crate) fn finite_extent(values: &[f64]) -> StatsResult<(f64, f64)> {
    let mut finite = values.iter().copied().filter(|v| v.is_finite()).peekable();
    if finite.peek().is_none() {
        return Err(StatsError::degenerate("no finite values to bin"));
    }
    Ok(finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    }))
}

fn arange(start: f64, stop: f64, step: f64) -> StatsResult<Vec<f64>> {
    let count = ((stop - start) / step).ceil();
    if !(count >= 2.0) {
        return Err(StatsError::degenerate(format!(
            "arange({}, {}, {}) yields fewer than 2 edges",
            start, stop, step
        )));
    }
    if count > (MAX_BINS + 1) as f64 {
        return Err(StatsError::InvalidBinWidth { width: step });
    }
    Ok((0..count as usize).map(|i| start + i as f64 * step).collect())
}

fn covering_steps(lo: f64, hi: f64, step: f64) -> StatsResult<Vec<f64>> {
    let bins = ((hi - lo) / step).floor() + 1.0;
    if bins > MAX_BINS as f64 {
        return Err(StatsError::InvalidBinWidth { width: step });
    }
    Ok((0..=bins as usize).map(|i| lo + i as f64 * step).collect())
}
