//! sightline-stats - Population statistics for absorber sightlines
//!
//! This crate turns per-sightline diagnostics into population summaries:
//!
//! - **Binning**: linear and log-spaced bin edges and centers
//! - **Histogram**: raw and density histograms, zero-substituted ratios
//! - **Breakdown**: fractional contribution of covariate ranges per bin
//! - **Correlation**: 2D density maps, contour tiers and power-law fits
//! - **KS 2D**: two-sample, two-dimensional Kolmogorov-Smirnov test
//!
//! # Design Philosophy
//!
//! Every operation is a pure function of its inputs. Caller arrays are only
//! read; filtering and zero substitution always work on owned copies.

pub mod binning;
pub mod breakdown;
pub mod correlation;
pub mod error;
pub mod fit;
pub mod histogram;
pub mod ks2d;
pub mod sample;
pub mod summary;

pub use binning::*;
pub use breakdown::*;
pub use correlation::*;
pub use error::*;
pub use fit::*;
pub use histogram::*;
pub use ks2d::*;
pub use sample::*;
pub use summary::*;
