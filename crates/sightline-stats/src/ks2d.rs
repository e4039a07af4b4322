//! Two-sample, two-dimensional Kolmogorov-Smirnov test
//!
//! Uses the Fasano-Franceschini quadrant statistic: around every point of
//! each sample, the four quadrants are compared between the two empirical
//! distributions. The p-value follows the Peacock/Press approximation through
//! the Kolmogorov distribution, corrected by the root-mean-square correlation
//! of the two samples.
//!
//! The statistic is symmetric: swapping the samples gives the same result.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{log10_checked, StatsError, StatsResult};

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

/// A 2D point set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSet2D {
    points: Vec<Point2D>,
}

impl PointSet2D {
    /// Pair up `x` and `y`
    pub fn build(x: &[f64], y: &[f64]) -> StatsResult<Self> {
        if x.len() != y.len() {
            return Err(StatsError::length_mismatch("x", x.len(), "y", y.len()));
        }
        let points = x
            .iter()
            .zip(y.iter())
            .map(|(&x, &y)| Point2D { x, y })
            .collect();
        Ok(Self { points })
    }

    /// Pair up `(log10 metallicity, log10 velocity width)`.
    ///
    /// Every value must be positive.
    pub fn log_pairs(metallicity: &[f64], velocity_width: &[f64]) -> StatsResult<Self> {
        if metallicity.len() != velocity_width.len() {
            return Err(StatsError::length_mismatch(
                "metallicity",
                metallicity.len(),
                "velocity width",
                velocity_width.len(),
            ));
        }
        let x = log10_checked(metallicity, "metallicity")?;
        let y = log10_checked(velocity_width, "velocity width")?;
        Self::build(&x, &y)
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fractions of the set in the four quadrants around `origin`:
    /// (x > x0, y > y0), (x <= x0, y > y0), (x <= x0, y <= y0), (x > x0, y <= y0)
    pub fn quadrant_fractions(&self, origin: Point2D) -> [f64; 4] {
        let mut counts = [0usize; 4];
        for p in &self.points {
            let quadrant = match (p.x > origin.x, p.y > origin.y) {
                (true, true) => 0,
                (false, true) => 1,
                (false, false) => 2,
                (true, false) => 3,
            };
            counts[quadrant] += 1;
        }
        let n = self.points.len() as f64;
        counts.map(|c| c as f64 / n)
    }

    /// Pearson correlation of x and y; zero when either has no variance
    pub fn correlation(&self) -> f64 {
        let n = self.points.len() as f64;
        let mean_x = self.points.iter().map(|p| p.x).sum::<f64>() / n;
        let mean_y = self.points.iter().map(|p| p.y).sum::<f64>() / n;
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for p in &self.points {
            let dx = p.x - mean_x;
            let dy = p.y - mean_y;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }
        if sxx <= 0.0 || syy <= 0.0 {
            return 0.0;
        }
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    }
}

/// Outcome of a two-sample 2D KS test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsResult {
    /// Mean of the two maximal quadrant differences
    pub statistic: f64,
    /// Approximate significance
    pub p_value: f64,
    pub n_a: usize,
    pub n_b: usize,
}

/// Compare two 2D samples
pub fn ks_2d_2sample(a: &PointSet2D, b: &PointSet2D) -> StatsResult<KsResult> {
    if a.is_empty() || b.is_empty() {
        return Err(StatsError::empty(format!(
            "KS test needs both samples non-empty (got {} and {})",
            a.len(),
            b.len()
        )));
    }

    let d_a = max_quadrant_difference(a, a, b);
    let d_b = max_quadrant_difference(b, a, b);
    let statistic = (d_a + d_b) / 2.0;

    let (n_a, n_b) = (a.len() as f64, b.len() as f64);
    let sqrt_n = (n_a * n_b / (n_a + n_b)).sqrt();
    let lambda = ks_lambda(statistic, sqrt_n, a.correlation(), b.correlation());
    let p_value = kolmogorov_q(lambda);

    debug!(
        n_a = a.len(),
        n_b = b.len(),
        statistic,
        p_value,
        "2D KS comparison"
    );

    Ok(KsResult {
        statistic,
        p_value,
        n_a: a.len(),
        n_b: b.len(),
    })
}

/// The KS statistic alone
pub fn ks_2d(a: &PointSet2D, b: &PointSet2D) -> StatsResult<f64> {
    Ok(ks_2d_2sample(a, b)?.statistic)
}

/// Kolmogorov argument for statistic `d`, corrected by the RMS correlation
/// of the two samples
fn ks_lambda(d: f64, sqrt_n: f64, r_a: f64, r_b: f64) -> f64 {
    let rr = (1.0 - 0.5 * (r_a * r_a + r_b * r_b)).max(0.0).sqrt();
    sqrt_n * d / (1.0 + rr * (0.25 - 0.75 / sqrt_n))
}

fn quadrant_difference(origin: Point2D, a: &PointSet2D, b: &PointSet2D) -> f64 {
    let fa = a.quadrant_fractions(origin);
    let fb = b.quadrant_fractions(origin);
    fa.iter()
        .zip(fb.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

#[cfg(not(feature = "parallel"))]
fn max_quadrant_difference(origins: &PointSet2D, a: &PointSet2D, b: &PointSet2D) -> f64 {
    origins
        .points
        .iter()
        .map(|&p| quadrant_difference(p, a, b))
        .fold(0.0, f64::max)
}

#[cfg(feature = "parallel")]
fn max_quadrant_difference(origins: &PointSet2D, a: &PointSet2D, b: &PointSet2D) -> f64 {
    use rayon::prelude::*;

    origins
        .points
        .par_iter()
        .map(|&p| quadrant_difference(p, a, b))
        .reduce(|| 0.0, f64::max)
}

/// Kolmogorov distribution tail `Q_KS(lambda)`
pub fn kolmogorov_q(lambda: f64) -> f64 {
    const EPS1: f64 = 1e-3;
    const EPS2: f64 = 1e-8;

    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous = 0.0;
    for j in 1..=100 {
        let j = j as f64;
        let term = fac * (a2 * j * j).exp();
        sum += term;
        if term.abs() <= EPS1 * previous || term.abs() <= EPS2 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous = term.abs();
    }
    // The series only fails to converge for tiny lambda, where Q -> 1
    1.0
}
