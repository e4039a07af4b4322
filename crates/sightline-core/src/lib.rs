//! sightline-core - Population analysis of simulated absorber sightlines
//!
//! This crate connects a population of sightlines to the statistics engine
//! in `sightline-stats`.
//!
//! # Key Components
//!
//! - **SpectraAccessor**: Capability trait over per-sightline quantities,
//!   with full-population and halo-restricted variants
//! - **PopulationAnalysis**: Velocity width, metallicity and edge-statistic
//!   distributions, virial breakdowns, correlation maps and the 2D KS test
//! - **AnalysisConfig**: Every tunable constant, loadable from TOML
//!
//! # Logging
//!
//! Events are emitted through `tracing`; installing a subscriber is left to
//! the application.

pub mod accessor;
pub mod analysis;
pub mod config;
pub mod error;
pub mod species;

pub use accessor::*;
pub use analysis::PopulationAnalysis;
pub use config::*;
pub use error::*;
pub use species::Species;
