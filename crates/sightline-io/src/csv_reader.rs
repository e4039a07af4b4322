//! CSV reader for numeric sightline tables
//!
//! The first row is the header. Every cell must parse as a float, except
//! that empty cells read as NaN and `true`/`false` read as 1/0 so filter
//! columns can be stored as booleans.

use crate::reader::{DataReader, IoError, IoResult};
use crate::table::DataTable;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// CSV file reader
pub struct CsvReader {
    path: String,
    delimiter: u8,
}

impl CsvReader {
    /// Open a comma-separated file
    pub fn open(path: &str) -> IoResult<Self> {
        Self::open_with_options(path, b',')
    }

    /// Open a file with a custom delimiter
    pub fn open_with_options(path: &str, delimiter: u8) -> IoResult<Self> {
        if !Path::new(path).exists() {
            return Err(IoError::FileNotFound(path.to_string()));
        }
        Ok(Self {
            path: path.to_string(),
            delimiter,
        })
    }
}

impl DataReader for CsvReader {
    fn read_table(&self) -> IoResult<DataTable> {
        let file = File::open(&self.path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
        let table = parse_table(BufReader::new(file), self.delimiter)?;
        debug!(
            path = %self.path,
            rows = table.num_rows(),
            columns = table.num_columns(),
            "read CSV table"
        );
        Ok(table)
    }

    fn path(&self) -> Option<&str> {
        Some(&self.path)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

/// Parse a numeric table from any reader
pub fn parse_table<R: Read>(input: R, delimiter: u8) -> IoResult<DataTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IoError::InvalidFormat(e.to_string()))?
        .iter()
        .map(|s| s.to_string())
        .collect();
    if headers.is_empty() {
        return Err(IoError::InvalidFormat("missing header row".to_string()));
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| IoError::InvalidFormat(e.to_string()))?;
        if record.len() != headers.len() {
            return Err(IoError::InvalidFormat(format!(
                "line {} has {} fields, header has {}",
                row + 2,
                record.len(),
                headers.len()
            )));
        }
        for (j, cell) in record.iter().enumerate() {
            let value = parse_cell(cell).ok_or_else(|| IoError::Parse {
                line: row + 2,
                column: headers[j].clone(),
                value: cell.to_string(),
            })?;
            columns[j].push(value);
        }
    }

    DataTable::from_columns(headers.into_iter().zip(columns).collect())
}

/// Parse one cell as a float
fn parse_cell(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return Some(f64::NAN);
    }
    match cell.to_lowercase().as_str() {
        "true" | "yes" => Some(1.0),
        "false" | "no" => Some(0.0),
        other => other.parse().ok(),
    }
}
