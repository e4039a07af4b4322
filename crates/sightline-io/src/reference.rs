//! External reference samples (observed metallicities and velocity widths)

use serde::{Deserialize, Serialize};

use crate::reader::{open_file, IoError, IoResult};
use crate::table::DataTable;

/// Default column holding metallicities (linear, solar units)
pub const DEFAULT_METALLICITY_COLUMN: &str = "metallicity";

/// Default column holding velocity widths (km/s)
pub const DEFAULT_VELOCITY_WIDTH_COLUMN: &str = "velocity_width";

/// Paired metallicity and velocity width measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSample {
    pub metallicity: Vec<f64>,
    pub velocity_width: Vec<f64>,
}

impl ReferenceSample {
    /// Pair two equal-length columns
    pub fn new(metallicity: Vec<f64>, velocity_width: Vec<f64>) -> IoResult<Self> {
        if metallicity.len() != velocity_width.len() {
            return Err(IoError::ColumnLength {
                column: DEFAULT_VELOCITY_WIDTH_COLUMN.to_string(),
                expected: metallicity.len(),
                actual: velocity_width.len(),
            });
        }
        Ok(Self {
            metallicity,
            velocity_width,
        })
    }

    /// Extract the two named columns from a table
    pub fn from_table(table: &DataTable, metallicity: &str, velocity_width: &str) -> IoResult<Self> {
        Self::new(
            table.column(metallicity)?.to_vec(),
            table.column(velocity_width)?.to_vec(),
        )
    }

    /// Load from a file with the default column names
    pub fn load(path: &str) -> IoResult<Self> {
        Self::load_columns(path, DEFAULT_METALLICITY_COLUMN, DEFAULT_VELOCITY_WIDTH_COLUMN)
    }

    /// Load from a file with explicit column names
    pub fn load_columns(path: &str, metallicity: &str, velocity_width: &str) -> IoResult<Self> {
        let table = open_file(path)?.read_table()?;
        Self::from_table(&table, metallicity, velocity_width)
    }

    /// Number of measurements
    pub fn len(&self) -> usize {
        self.metallicity.len()
    }

    /// Check if there are no measurements
    pub fn is_empty(&self) -> bool {
        self.metallicity.is_empty()
    }
}
