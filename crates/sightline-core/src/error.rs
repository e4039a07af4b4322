//! Error types for sightline-core
//!
//! Provides error handling for:
//! - Statistics failures raised by `sightline-stats`
//! - Table and catalogue loading
//! - Accessor lookups (missing columns, unknown halos)
//! - Configuration parsing and validation

use sightline_io::IoError;
use sightline_stats::StatsError;
use thiserror::Error;

/// Main error type for population analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Statistics errors
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// A per-sightline quantity is not available
    #[error("Column '{column}' not available")]
    MissingColumn { column: String },

    /// A halo index points past the end of the catalogue
    #[error("Halo {halo} not in catalogue of {size} halos")]
    MissingHalo { halo: i64, size: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AnalysisError {
    pub(crate) fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }
}

/// Result type alias for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
