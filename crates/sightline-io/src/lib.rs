//! sightline-io - Data I/O for sightline populations
//!
//! This crate reads the tables the statistics layer consumes:
//!
//! - **Sightline tables**: one row per sightline, one column per diagnostic
//! - **Halo catalogues**: one row per halo
//! - **Reference samples**: observed metallicity / velocity width pairs
//!
//! # Design
//!
//! All readers implement the `DataReader` trait and produce a `DataTable`
//! of named `f64` columns.

pub mod csv_reader;
pub mod reader;
pub mod reference;
pub mod table;

pub use reader::*;
pub use reference::*;
pub use table::*;
