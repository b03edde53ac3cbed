//! Store contract used by the buffered streams.

use std::path::Path;

use ncio_common::{DatasetDescriptor, DatasetLayout};

use crate::element::Element;
use crate::error::StoreResult;

/// Read handle on an existing 2D dataset.
pub trait RowSource<T: Element> {
    /// Descriptor discovered at open time.
    fn descriptor(&self) -> &DatasetDescriptor;

    /// Length of a named dimension.
    fn inquire_dimension(&self, name: &str) -> StoreResult<usize>;

    /// Read rows `start_row..start_row + row_count` into `out`.
    ///
    /// `out` must hold exactly `row_count * ncols` values. Fails if the range
    /// extends past the stored extent.
    fn read_range(&mut self, start_row: usize, row_count: usize, out: &mut [T])
        -> StoreResult<()>;

    /// Release the handle. Closing twice is a no-op.
    fn close(&mut self) -> StoreResult<()>;

    fn is_open(&self) -> bool;
}

/// Write handle on a newly created 2D dataset with an unlimited row dimension.
pub trait RowSink<T: Element> {
    /// Descriptor of the dataset; `nrows` grows as ranges are written.
    fn descriptor(&self) -> &DatasetDescriptor;

    /// Write `row_count` rows from `rows` starting at `start_row`.
    ///
    /// The row dimension is unlimited, so the write may extend it. A zero-row
    /// write is legal and changes nothing.
    fn write_range(&mut self, start_row: usize, row_count: usize, rows: &[T]) -> StoreResult<()>;

    /// Release the handle. Closing twice is a no-op.
    fn close(&mut self) -> StoreResult<()>;

    fn is_open(&self) -> bool;
}

/// Factory for dataset handles.
pub trait DatasetStore<T: Element> {
    type Source: RowSource<T>;
    type Sink: RowSink<T>;

    /// Open an existing dataset for reading.
    fn open(&self, path: &Path, layout: &DatasetLayout) -> StoreResult<Self::Source>;

    /// Create a new dataset with `ncols` columns for writing.
    fn create(&self, path: &Path, layout: &DatasetLayout, ncols: usize)
        -> StoreResult<Self::Sink>;
}

/// Check that a caller buffer matches a row range.
pub(crate) fn check_buffer_len(row_count: usize, ncols: usize, actual: usize) -> StoreResult<()> {
    let expected = row_count * ncols;
    if actual != expected {
        return Err(crate::StoreError::BufferSize { expected, actual });
    }
    Ok(())
}
