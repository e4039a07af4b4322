//! 2D correlation density maps with an optional power-law trend
//!
//! Both variables may be moved to log10 before binning. The map is an
//! `n_bins x n_bins` grid of equal-width bins over the extent of the
//! transformed data; bin centers are reported back in data units.
//!
//! Contour levels are three density tiers relative to the population size
//! per sample scale, not evenly spaced levels.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binning::{finite_extent, BinEdges, BinScale};
use crate::error::{log10_checked, StatsError, StatsResult};
use crate::fit::{fit_line, LineFit};

/// Multipliers applied to `population / sample_scale` for the contour tiers
pub const DEFAULT_CONTOUR_MULTIPLIERS: [f64; 3] = [0.15, 1.0, 10.0];

/// Normalisation for contour tiers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourScale {
    /// Total number of sightlines in the collection (not the filtered count)
    pub population: usize,
    /// Domain-specific normalisation; must be supplied explicitly
    pub sample_scale: f64,
    pub multipliers: [f64; 3],
}

impl ContourScale {
    pub fn new(population: usize, sample_scale: f64) -> Self {
        Self {
            population,
            sample_scale,
            multipliers: DEFAULT_CONTOUR_MULTIPLIERS,
        }
    }

    /// Override the tier multipliers
    pub fn with_multipliers(mut self, multipliers: [f64; 3]) -> Self {
        self.multipliers = multipliers;
        self
    }

    /// `(population / sample_scale) * multipliers`
    pub fn levels(&self) -> StatsResult<[f64; 3]> {
        if !(self.sample_scale.is_finite() && self.sample_scale > 0.0) {
            return Err(StatsError::InvalidConfig(format!(
                "sample scale must be finite and positive, got {}",
                self.sample_scale
            )));
        }
        let base = self.population as f64 / self.sample_scale;
        Ok(self.multipliers.map(|m| base * m))
    }
}

/// Options for [`correlate`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationOptions {
    /// Bins per axis
    pub n_bins: usize,
    pub log_x: bool,
    pub log_y: bool,
    /// Fit transformed y against transformed x
    pub fit: bool,
    /// Contour tiers; skipped when absent
    pub contours: Option<ContourScale>,
}

impl CorrelationOptions {
    /// Log-log map without fit or contours
    pub fn new(n_bins: usize) -> Self {
        Self {
            n_bins,
            log_x: true,
            log_y: true,
            fit: false,
            contours: None,
        }
    }

    pub fn with_log(mut self, log_x: bool, log_y: bool) -> Self {
        self.log_x = log_x;
        self.log_y = log_y;
        self
    }

    pub fn with_fit(mut self, fit: bool) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_contours(mut self, contours: ContourScale) -> Self {
        self.contours = Some(contours);
        self
    }
}

/// Counts of `(x, y)` pairs on a square grid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram2D {
    /// Counts indexed `[x_bin, y_bin]`
    pub counts: Array2<f64>,
    /// Edges in the transformed domain
    pub x_edges: BinEdges,
    pub y_edges: BinEdges,
    /// Centers in data units
    pub x_centers: Vec<f64>,
    pub y_centers: Vec<f64>,
    pub x_scale: BinScale,
    pub y_scale: BinScale,
}

impl Histogram2D {
    /// Total number of pairs counted
    pub fn total(&self) -> f64 {
        self.counts.sum()
    }

    /// Count in a cell
    pub fn get(&self, x_bin: usize, y_bin: usize) -> Option<f64> {
        self.counts.get((x_bin, y_bin)).copied()
    }
}

/// Least-squares trend in the transformed domain, with the axis scales
/// needed to report it in data units
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub line: LineFit,
    pub x_scale: BinScale,
    pub y_scale: BinScale,
}

impl FitResult {
    pub fn intercept(&self) -> f64 {
        self.line.intercept
    }

    pub fn slope(&self) -> f64 {
        self.line.slope
    }

    /// Trend at `x` in data units; `10^intercept * x^slope` on log-log axes
    pub fn evaluate(&self, x: f64) -> f64 {
        self.y_scale
            .from_domain(self.line.at(self.x_scale.to_domain(x)))
    }
}

/// A correlation density map
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMap {
    pub histogram: Histogram2D,
    /// Contour tiers, ascending
    pub levels: Option<[f64; 3]>,
    pub fit: Option<FitResult>,
}

impl CorrelationMap {
    /// Sample the fitted trend at `n` points spanning the x bin centers,
    /// log-spaced on a log x axis.
    pub fn trend(&self, n: usize) -> Option<Vec<(f64, f64)>> {
        let fit = self.fit?;
        let centers = &self.histogram.x_centers;
        let scale = self.histogram.x_scale;
        let lo = scale.to_domain(*centers.first()?);
        let hi = scale.to_domain(*centers.last()?);
        let step = if n > 1 { (hi - lo) / (n - 1) as f64 } else { 0.0 };
        Some(
            (0..n)
                .map(|i| {
                    let x = scale.from_domain(lo + i as f64 * step);
                    (x, fit.evaluate(x))
                })
                .collect(),
        )
    }
}

/// Build the 2D density map of `(x, y)`, with optional contour tiers and fit
pub fn correlate(x: &[f64], y: &[f64], options: &CorrelationOptions) -> StatsResult<CorrelationMap> {
    if x.len() != y.len() {
        return Err(StatsError::length_mismatch("x", x.len(), "y", y.len()));
    }
    if options.n_bins == 0 {
        return Err(StatsError::InvalidBinCount { count: 0 });
    }

    let x_scale = scale_for(options.log_x);
    let y_scale = scale_for(options.log_y);
    let tx = transform(x, x_scale, "x")?;
    let ty = transform(y, y_scale, "y")?;

    let (tx, ty): (Vec<f64>, Vec<f64>) = tx
        .into_iter()
        .zip(ty)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .unzip();
    if tx.is_empty() {
        return Err(StatsError::empty("no finite (x, y) pairs to correlate"));
    }

    let x_edges = extent_edges(&tx, options.n_bins, "x")?;
    let y_edges = extent_edges(&ty, options.n_bins, "y")?;

    let mut counts = Array2::<f64>::zeros((options.n_bins, options.n_bins));
    for (&a, &b) in tx.iter().zip(&ty) {
        if let (Some(i), Some(j)) = (x_edges.bin_index_closed(a), y_edges.bin_index_closed(b)) {
            counts[[i, j]] += 1.0;
        }
    }

    let levels = options
        .contours
        .as_ref()
        .map(ContourScale::levels)
        .transpose()?;

    let fit = if options.fit {
        Some(FitResult {
            line: fit_line(&tx, &ty)?,
            x_scale,
            y_scale,
        })
    } else {
        None
    };

    debug!(
        pairs = tx.len(),
        n_bins = options.n_bins,
        log_x = options.log_x,
        log_y = options.log_y,
        "built correlation map"
    );

    let histogram = Histogram2D {
        counts,
        x_centers: x_edges.centers().into_iter().map(|c| x_scale.from_domain(c)).collect(),
        y_centers: y_edges.centers().into_iter().map(|c| y_scale.from_domain(c)).collect(),
        x_edges,
        y_edges,
        x_scale,
        y_scale,
    };

    Ok(CorrelationMap {
        histogram,
        levels,
        fit,
    })
}

fn scale_for(log: bool) -> BinScale {
    if log {
        BinScale::Log10
    } else {
        BinScale::Linear
    }
}

fn transform(values: &[f64], scale: BinScale, axis: &str) -> StatsResult<Vec<f64>> {
    match scale {
        BinScale::Linear => Ok(values.to_vec()),
        BinScale::Log10 => log10_checked(values, axis),
    }
}

fn extent_edges(values: &[f64], n_bins: usize, axis: &str) -> StatsResult<BinEdges> {
    let (lo, hi) = finite_extent(values)?;
    if lo == hi {
        return Err(StatsError::degenerate(format!(
            "{} axis is constant at {}",
            axis, lo
        )));
    }
    BinEdges::linspace(lo, hi, n_bins + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_law_fit() {
        let x = [1.0, 10.0, 100.0];
        let options = CorrelationOptions::new(3).with_fit(true);
        let map = correlate(&x, &x, &options).unwrap();

        let fit = map.fit.unwrap();
        assert!((fit.slope() - 1.0).abs() < 1e-10);
        assert!(fit.intercept().abs() < 1e-10);
        assert!((fit.evaluate(50.0) - 50.0).abs() < 1e-8);

        assert_eq!(map.histogram.total(), 3.0);
        for i in 0..3 {
            assert_eq!(map.histogram.get(i, i), Some(1.0));
        }
    }

    #[test]
    fn test_centers_reexponentiated() {
        let x = [1.0, 100.0];
        let y = [5.0, 7.0];
        let options = CorrelationOptions::new(2).with_log(true, false);
        let map = correlate(&x, &y, &options).unwrap();
        let xc = &map.histogram.x_centers;
        assert!((xc[0] - 10f64.powf(0.5)).abs() < 1e-10);
        assert!((xc[1] - 10f64.powf(1.5)).abs() < 1e-10);
        assert_eq!(map.histogram.y_centers, vec![5.5, 6.5]);
    }

    #[test]
    fn test_non_positive_log_input() {
        let err = correlate(&[1.0, 0.0], &[1.0, 2.0], &CorrelationOptions::new(2)).unwrap_err();
        assert!(matches!(err, StatsError::NonPositiveLogInput { index: 1, .. }));
        let err = correlate(&[1.0, 2.0], &[-1.0, 2.0], &CorrelationOptions::new(2)).unwrap_err();
        assert!(matches!(err, StatsError::NonPositiveLogInput { index: 0, .. }));
    }

    #[test]
    fn test_linear_axes_allow_non_positive() {
        let options = CorrelationOptions::new(2).with_log(false, false);
        let map = correlate(&[-1.0, 0.0, 1.0], &[0.0, 0.0, 2.0], &options).unwrap();
        assert_eq!(map.histogram.total(), 3.0);
    }

    #[test]
    fn test_contour_levels() {
        let options = CorrelationOptions::new(2).with_contours(ContourScale::new(400, 40.0));
        let map = correlate(&[1.0, 10.0], &[1.0, 10.0], &options).unwrap();
        let levels = map.levels.unwrap();
        assert!((levels[0] - 1.5).abs() < 1e-12);
        assert!((levels[1] - 10.0).abs() < 1e-12);
        assert!((levels[2] - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_sample_scale() {
        let options = CorrelationOptions::new(2).with_contours(ContourScale::new(400, 0.0));
        let err = correlate(&[1.0, 10.0], &[1.0, 10.0], &options).unwrap_err();
        assert!(matches!(err, StatsError::InvalidConfig(_)));
    }

    #[test]
    fn test_constant_axis() {
        let err = correlate(&[3.0, 3.0], &[1.0, 2.0], &CorrelationOptions::new(2)).unwrap_err();
        assert!(matches!(err, StatsError::DegenerateRange { .. }));
    }

    #[test]
    fn test_empty_and_mismatch() {
        assert!(matches!(
            correlate(&[], &[], &CorrelationOptions::new(2)),
            Err(StatsError::EmptyPopulation { .. })
        ));
        assert!(matches!(
            correlate(&[1.0], &[], &CorrelationOptions::new(2)),
            Err(StatsError::LengthMismatch { .. })
        ));
        assert!(matches!(
            correlate(&[1.0, 2.0], &[1.0, 2.0], &CorrelationOptions::new(0)),
            Err(StatsError::InvalidBinCount { count: 0 })
        ));
    }

    #[test]
    fn test_trend_spans_centers() {
        let x = [1.0, 10.0, 100.0, 1000.0];
        let y = [2.0, 20.0, 200.0, 2000.0];
        let map = correlate(&x, &y, &CorrelationOptions::new(3).with_fit(true)).unwrap();
        let trend = map.trend(15).unwrap();
        assert_eq!(trend.len(), 15);
        let first = trend[0];
        assert!((first.0 - map.histogram.x_centers[0]).abs() < 1e-9);
        assert!((first.1 / first.0 - 2.0).abs() < 1e-8);
    }

    #[test]
    fn test_no_trend_without_fit() {
        let map = correlate(&[1.0, 10.0], &[1.0, 10.0], &CorrelationOptions::new(2)).unwrap();
        assert!(map.trend(15).is_none());
    }
}
