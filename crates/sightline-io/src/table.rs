//! In-memory numeric tables

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::reader::{IoError, IoResult};

/// Named `f64` columns with a shared row count
///
/// Column order is preserved as inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    names: Vec<String>,
    columns: HashMap<String, Vec<f64>>,
    num_rows: usize,
}

impl DataTable {
    /// An empty table with a fixed row count
    pub fn with_rows(num_rows: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: HashMap::new(),
            num_rows,
        }
    }

    /// Build a table from `(name, values)` pairs
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> IoResult<Self> {
        let mut iter = columns.into_iter().peekable();
        let num_rows = iter.peek().map(|(_, v)| v.len()).unwrap_or(0);
        let mut table = Self::with_rows(num_rows);
        for (name, values) in iter {
            table.insert(name, values)?;
        }
        Ok(table)
    }

    /// Add or replace a column; its length must match the row count
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> IoResult<()> {
        let name = name.into();
        if values.len() != self.num_rows {
            return Err(IoError::ColumnLength {
                column: name,
                expected: self.num_rows,
                actual: values.len(),
            });
        }
        if !self.columns.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Get a column, failing if absent
    pub fn column(&self, name: &str) -> IoResult<&[f64]> {
        self.get(name)
            .ok_or_else(|| IoError::ColumnNotFound(name.to_string()))
    }

    /// Get a column if present
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// Check whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.names.iter().map(|s| s.as_str()).collect()
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns() {
        let table = DataTable::from_columns(vec![
            ("a", vec![1.0, 2.0]),
            ("b", vec![3.0, 4.0]),
        ])
        .unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.column("b").unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn test_length_checked() {
        let err = DataTable::from_columns(vec![("a", vec![1.0, 2.0]), ("b", vec![3.0])])
            .unwrap_err();
        assert!(matches!(err, IoError::ColumnLength { .. }));
    }

    #[test]
    fn test_missing_column() {
        let table = DataTable::with_rows(0);
        assert!(matches!(
            table.column("halo"),
            Err(IoError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut table = DataTable::from_columns(vec![("a", vec![1.0]), ("b", vec![2.0])]).unwrap();
        table.insert("a", vec![5.0]).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.column("a").unwrap(), &[5.0]);
    }
}
