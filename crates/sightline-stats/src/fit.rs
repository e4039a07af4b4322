//! Ordinary least-squares line fit

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// `y = intercept + slope * x`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
    /// Sum of squared residuals
    pub residual: f64,
}

impl LineFit {
    /// Evaluate the line
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit `y` against `x` by solving the 2x2 normal equations
pub fn fit_line(x: &[f64], y: &[f64]) -> StatsResult<LineFit> {
    if x.len() != y.len() {
        return Err(StatsError::length_mismatch("x", x.len(), "y", y.len()));
    }
    if x.len() < 2 {
        return Err(StatsError::SingularFit {
            message: format!("{} point(s), at least 2 required", x.len()),
        });
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let spread: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    if !(spread > f64::EPSILON * n * mean_x.abs().max(1.0)) {
        return Err(StatsError::SingularFit {
            message: "x has zero variance".to_string(),
        });
    }

    let sum_x: f64 = x.iter().sum();
    let sum_xx: f64 = x.iter().map(|xi| xi * xi).sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(xi, yi)| xi * yi).sum();

    let normal = Matrix2::new(n, sum_x, sum_x, sum_xx);
    let rhs = Vector2::new(sum_y, sum_xy);
    let solution = normal.lu().solve(&rhs).ok_or_else(|| StatsError::SingularFit {
        message: "normal equations are singular".to_string(),
    })?;

    let (intercept, slope) = (solution[0], solution[1]);
    let residual = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();

    Ok(LineFit {
        intercept,
        slope,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-10);
        assert!((fit.intercept - 1.0).abs() < 1e-10);
        assert!(fit.residual < 1e-12);
        assert!((fit.at(4.0) - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_noisy_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.1, 3.9, 6.2, 7.8, 10.1];
        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.slope - 1.99).abs() < 1e-10);
        assert!((fit.intercept - 0.05).abs() < 1e-10);
        assert!(fit.residual > 0.0);
    }

    #[test]
    fn test_constant_x() {
        let err = fit_line(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, StatsError::SingularFit { .. }));
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            fit_line(&[1.0], &[1.0]),
            Err(StatsError::SingularFit { .. })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            fit_line(&[1.0, 2.0], &[1.0]),
            Err(StatsError::LengthMismatch { .. })
        ));
    }
}
