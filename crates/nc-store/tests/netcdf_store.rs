//! Integration tests for the NetCDF store against real files.
#![cfg(feature = "netcdf")]

use nc_store::{DatasetStore, NetCdfSink, NetCdfSource, NetCdfStore, RowSink, RowSource, StoreError};
use ncio_common::DatasetLayout;

fn layout() -> DatasetLayout {
    DatasetLayout::new("varxy", "x", "y")
}

#[test]
fn test_create_write_reopen_read() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("ranges.nc");

    let mut sink: NetCdfSink<f64> = NetCdfStore.create(&path, &layout(), 3).expect("create");
    sink.write_range(0, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("first range");
    // Unlimited row dimension grows with each write
    sink.write_range(2, 1, &[7.0, 8.0, 9.0]).expect("second range");
    sink.write_range(3, 0, &[]).expect("zero-row write");
    assert_eq!(sink.descriptor().nrows, 3);
    sink.close().expect("close");
    sink.close().expect("second close is a no-op");

    let mut source: NetCdfSource<f64> = NetCdfStore.open(&path, &layout()).expect("open");
    assert_eq!(source.descriptor().nrows, 3);
    assert_eq!(source.descriptor().ncols, 3);
    assert_eq!(source.descriptor().dtype, "double");
    assert_eq!(source.inquire_dimension("x").unwrap(), 3);
    assert_eq!(source.inquire_dimension("y").unwrap(), 3);

    let mut out = vec![0.0; 6];
    source.read_range(1, 2, &mut out).expect("read");
    assert_eq!(out, vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);

    let mut out = vec![0.0; 6];
    let err = source.read_range(2, 2, &mut out).unwrap_err();
    assert!(matches!(err, StoreError::OutOfRange { nrows: 3, .. }));

    source.close().unwrap();
    assert!(!source.is_open());
    assert!(matches!(
        source.read_range(0, 1, &mut [0.0; 3]),
        Err(StoreError::Closed(_))
    ));
}

#[test]
fn test_open_missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("does_not_exist.nc");

    let result: Result<NetCdfSource<f32>, _> = NetCdfStore.open(&path, &layout());
    assert!(matches!(result, Err(StoreError::Io { .. })));
}

#[test]
fn test_open_missing_dimension() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("dims.nc");

    let mut sink: NetCdfSink<f32> = NetCdfStore.create(&path, &layout(), 2).unwrap();
    sink.write_range(0, 1, &[1.0, 2.0]).unwrap();
    sink.close().unwrap();

    let wrong = DatasetLayout::new("varxy", "time", "y");
    let result: Result<NetCdfSource<f32>, _> = NetCdfStore.open(&path, &wrong);
    match result {
        Err(StoreError::Dimension { name, .. }) => assert_eq!(name, "time"),
        Err(other) => panic!("expected dimension error, got {other}"),
        Ok(_) => panic!("expected dimension error"),
    }

    let wrong = DatasetLayout::new("missing", "x", "y");
    let result: Result<NetCdfSource<f32>, _> = NetCdfStore.open(&path, &wrong);
    assert!(matches!(result, Err(StoreError::Variable { .. })));
}

#[test]
fn test_zero_columns_rejected() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("zero.nc");

    let result: Result<NetCdfSink<f32>, _> = NetCdfStore.create(&path, &layout(), 0);
    assert!(matches!(result, Err(StoreError::Io { .. })));
}

#[test]
fn test_open_with_other_element_type_rejected() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("typed.nc");

    let mut sink: NetCdfSink<f64> = NetCdfStore.create(&path, &layout(), 1).unwrap();
    sink.write_range(0, 1, &[1.5]).unwrap();
    sink.close().unwrap();

    let result: Result<NetCdfSource<f32>, _> = NetCdfStore.open(&path, &layout());
    match result {
        Err(StoreError::TypeMismatch {
            stored, requested, ..
        }) => {
            assert_eq!(stored, "double");
            assert_eq!(requested, "float");
        }
        Err(other) => panic!("expected type mismatch, got {other}"),
        Ok(_) => panic!("expected type mismatch"),
    }

    let source: NetCdfSource<f64> = NetCdfStore.open(&path, &layout()).unwrap();
    assert_eq!(source.descriptor().dtype, "double");
}
