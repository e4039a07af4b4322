//! File-backed CSV reading

use std::io::Write;

use rstest::rstest;
use sightline_io::csv_reader::CsvReader;
use sightline_io::{open_file, DataReader, IoError, ReferenceSample};
use tempfile::NamedTempFile;

fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_read_sightline_table() {
    let file = write_temp(
        ".csv",
        "halo,halo_distance,vel_width_Si2,filter_Si2\n-1,0,25.0,true\n3,12.5,140.0,false\n",
    );
    let reader = CsvReader::open(file.path().to_str().unwrap()).unwrap();
    assert_eq!(reader.format_name(), "CSV");

    let table = reader.read_table().unwrap();
    assert_eq!(table.num_rows(), 2);
    assert_eq!(table.column("filter_Si2").unwrap(), &[1.0, 0.0]);
    assert_eq!(table.column("halo_distance").unwrap(), &[0.0, 12.5]);
}

#[rstest]
#[case(".csv", "metallicity,velocity_width\n0.01,45\n0.2,180\n")]
#[case(".tsv", "metallicity\tvelocity_width\n0.01\t45\n0.2\t180\n")]
fn test_load_reference(#[case] suffix: &str, #[case] contents: &str) {
    let file = write_temp(suffix, contents);
    let sample = ReferenceSample::load(file.path().to_str().unwrap()).unwrap();
    assert_eq!(sample.metallicity, vec![0.01, 0.2]);
    assert_eq!(sample.velocity_width, vec![45.0, 180.0]);
}

#[test]
fn test_reference_missing_column() {
    let file = write_temp(".csv", "Z,v90\n0.01,45\n");
    let err = ReferenceSample::load(file.path().to_str().unwrap()).unwrap_err();
    assert!(matches!(err, IoError::ColumnNotFound(ref c) if c == "metallicity"));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        open_file("/nonexistent/sightlines.csv"),
        Err(IoError::FileNotFound(_))
    ));
}
