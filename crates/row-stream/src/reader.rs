//! Buffered chunk reader.
//!
//! The reader serves caller chunks of any row count from a fixed-capacity
//! buffer and only goes back to the store when every loaded row has been
//! served:
//!
//! ```text
//! read_chunk(chunk)
//!      │
//!      ├─► current_row == nrows? ──► pad whole chunk, report end of stream
//!      │
//!      └─► for each chunk row while current_row < nrows
//!               │
//!               ├─► buffer exhausted? ──► refill min(capacity, nrows - current_row) rows
//!               │
//!               └─► copy one buffer row into the chunk
//!      │
//!      └─► pad the chunk rows that are left, if any
//! ```

use std::path::Path;

use nc_store::{DatasetStore, Element, RowSource};
use ncio_common::{DatasetDescriptor, DatasetLayout, Dense2D, StreamMode};
use tracing::{debug, error, trace, warn};

use crate::buffer::RowBuffer;
use crate::error::{StreamError, StreamResult};
use crate::stream::{ChunkRead, ChunkStream, StreamStats};

/// Sequential reader over an existing 2D dataset.
pub struct BufferedReader<T: Element, S: RowSource<T>> {
    source: S,
    buffer: RowBuffer<T>,
    current_row: usize,
    stats: StreamStats,
    closed: bool,
}

impl<T: Element, S: RowSource<T>> BufferedReader<T, S> {
    /// Wrap an open source and perform the first buffer fill.
    ///
    /// A `buffer_rows` larger than the dataset is clamped to the dataset's
    /// row count; that is reported as a warning, not an error.
    pub fn new(source: S, buffer_rows: usize) -> StreamResult<Self> {
        if buffer_rows == 0 {
            return Err(StreamError::invalid_config("buffer_rows must be > 0"));
        }

        let desc = source.descriptor();
        let capacity = if buffer_rows > desc.nrows {
            warn!(
                path = %desc.path.display(),
                requested = buffer_rows,
                nrows = desc.nrows,
                "Buffer larger than dataset, resizing to match number of rows"
            );
            desc.nrows
        } else {
            buffer_rows
        };
        let buffer = RowBuffer::new(capacity, desc.ncols);

        let mut reader = Self {
            source,
            buffer,
            current_row: 0,
            stats: StreamStats::default(),
            closed: false,
        };
        reader.refill()?;

        debug!(
            descriptor = %reader.descriptor(),
            buffer_rows = capacity,
            "Opened buffered reader"
        );
        Ok(reader)
    }

    /// Open `path` through `store` and wrap it.
    pub fn open_in<D>(
        store: &D,
        path: impl AsRef<Path>,
        layout: &DatasetLayout,
        buffer_rows: usize,
    ) -> StreamResult<Self>
    where
        D: DatasetStore<T, Source = S>,
    {
        let source = store.open(path.as_ref(), layout)?;
        Self::new(source, buffer_rows)
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        self.source.descriptor()
    }

    /// Total rows in the dataset.
    pub fn nrows(&self) -> usize {
        self.descriptor().nrows
    }

    pub fn ncols(&self) -> usize {
        self.descriptor().ncols
    }

    /// Effective buffer capacity after clamping.
    pub fn buffer_rows(&self) -> usize {
        self.buffer.capacity()
    }

    /// Absolute index of the next row to be served.
    pub fn position(&self) -> usize {
        self.current_row
    }

    /// Real rows not yet served.
    pub fn remaining_rows(&self) -> usize {
        self.nrows().saturating_sub(self.current_row)
    }

    /// Every real row has been served.
    pub fn is_at_end(&self) -> bool {
        self.current_row >= self.nrows()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Fill `chunk` with the next `chunk.rows()` rows.
    ///
    /// Rows past the end of the dataset are set to [`Element::padding`] in
    /// every column; rows holding real data are never padded. Once the data
    /// is exhausted every call returns a fully padded chunk and reports end
    /// of stream.
    pub fn read_chunk(&mut self, chunk: &mut Dense2D<T>) -> StreamResult<ChunkRead> {
        self.ensure_open()?;
        self.check_shape(chunk)?;

        let nrows = self.nrows();
        let wanted = chunk.rows();

        if self.current_row >= nrows {
            chunk.fill(T::padding());
            self.stats.padded_rows += wanted as u64;
            debug!(
                path = %self.descriptor().path.display(),
                rows_padded = wanted,
                "End of file reached"
            );
            return Ok(ChunkRead {
                rows_read: 0,
                rows_padded: wanted,
                end_of_stream: true,
            });
        }

        let mut filled = 0;
        while filled < wanted && self.current_row < nrows {
            if self.buffer.is_exhausted() {
                self.refill().map_err(|e| match e {
                    StreamError::Store(source) => StreamError::Refill {
                        rows_read: filled,
                        source,
                    },
                    other => other,
                })?;
            }
            let row = self.buffer.take_row()?;
            chunk.copy_row_from(filled, row)?;
            self.current_row += 1;
            self.stats.rows += 1;
            filled += 1;
        }

        let padded = wanted - filled;
        if padded > 0 {
            chunk.fill_rows_from(filled, T::padding())?;
            self.stats.padded_rows += padded as u64;
            debug!(
                rows_read = filled,
                rows_padded = padded,
                "Reached end of data, padding chunk"
            );
        }

        Ok(ChunkRead {
            rows_read: filled,
            rows_padded: padded,
            end_of_stream: false,
        })
    }

    /// Release the store handle. A second call is a no-op.
    pub fn close(&mut self) -> StreamResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.source.close()?;
        debug!(
            path = %self.descriptor().path.display(),
            rows_read = self.stats.rows,
            refills = self.stats.store_calls,
            "Closed buffered reader"
        );
        Ok(())
    }

    /// Load the next `min(capacity, nrows - current_row)` rows.
    fn refill(&mut self) -> StreamResult<()> {
        let capacity = self.buffer.capacity();
        let start = self.current_row;
        let count = capacity.min(self.nrows() - start);

        if count < capacity {
            debug!(
                start_row = start,
                rows = count,
                capacity = capacity,
                "Loading final partial buffer"
            );
        }

        if count > 0 {
            let target = self.buffer.refill_target(count)?;
            self.source.read_range(start, count, target)?;
            self.stats.store_calls += 1;
        }
        self.buffer.mark_loaded(count);

        trace!(start_row = start, rows = count, "Refilled read buffer");
        Ok(())
    }

    fn ensure_open(&self) -> StreamResult<()> {
        if self.closed {
            return Err(StreamError::Closed(self.descriptor().path.clone()));
        }
        Ok(())
    }

    fn check_shape(&self, chunk: &Dense2D<T>) -> StreamResult<()> {
        let expected = self.ncols();
        if chunk.cols() != expected {
            return Err(StreamError::ShapeMismatch {
                path: self.descriptor().path.clone(),
                expected,
                actual: chunk.cols(),
            });
        }
        Ok(())
    }
}

impl<T: Element, S: RowSource<T>> ChunkStream<T> for BufferedReader<T, S> {
    fn mode(&self) -> StreamMode {
        StreamMode::Read
    }

    fn descriptor(&self) -> &DatasetDescriptor {
        BufferedReader::descriptor(self)
    }

    fn read_chunk(&mut self, chunk: &mut Dense2D<T>) -> StreamResult<ChunkRead> {
        BufferedReader::read_chunk(self, chunk)
    }

    fn write_chunk(&mut self, _chunk: &Dense2D<T>) -> StreamResult<()> {
        let path = self.descriptor().path.clone();
        warn!(path = %path.display(), "Can't write file; it's open in read mode");
        Err(StreamError::ModeViolation {
            path,
            mode: StreamMode::Read,
            operation: "write",
        })
    }

    fn close(&mut self) -> StreamResult<()> {
        BufferedReader::close(self)
    }

    fn stats(&self) -> StreamStats {
        self.stats
    }
}

impl<T: Element, S: RowSource<T>> Drop for BufferedReader<T, S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!(
                path = %self.descriptor().path.display(),
                error = %e,
                "Failed to close reader"
            );
        }
    }
}

#[cfg(feature = "netcdf")]
mod netcdf_reader {
    use std::path::Path;

    use nc_store::{Element, NetCdfSource, NetCdfStore};
    use ncio_common::DatasetLayout;

    use super::BufferedReader;
    use crate::config::StreamConfig;
    use crate::error::{StreamError, StreamResult};

    impl<T: Element> BufferedReader<T, NetCdfSource<T>> {
        /// Open an existing NetCDF file and perform the first buffer fill.
        pub fn open(
            path: impl AsRef<Path>,
            variable: &str,
            row_dimension: &str,
            column_dimension: &str,
            buffer_rows: usize,
        ) -> StreamResult<Self> {
            let layout = DatasetLayout::new(variable, row_dimension, column_dimension);
            Self::open_in(&NetCdfStore, path, &layout, buffer_rows)
        }

        /// Open using names and buffer capacity from `config`.
        pub fn open_with(path: impl AsRef<Path>, config: &StreamConfig) -> StreamResult<Self> {
            config.validate().map_err(StreamError::InvalidConfig)?;
            Self::open_in(&NetCdfStore, path, &config.layout(), config.buffer_rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_store::{MemorySource, MemoryStore, RangeCall};

    fn layout() -> DatasetLayout {
        DatasetLayout::new("varxy", "x", "y")
    }

    /// Rows 0..nrows where every column of row r holds r.
    fn seeded(store: &MemoryStore, path: &str, nrows: usize, ncols: usize) {
        let values = (0..nrows)
            .flat_map(|r| std::iter::repeat(r as f32).take(ncols))
            .collect();
        store.insert(path, layout(), ncols, values).unwrap();
    }

    fn reader(
        store: &MemoryStore,
        path: &str,
        buffer_rows: usize,
    ) -> BufferedReader<f32, MemorySource<f32>> {
        BufferedReader::open_in(store, path, &layout(), buffer_rows).unwrap()
    }

    fn first_column(chunk: &Dense2D<f32>) -> Vec<f32> {
        chunk.iter_rows().map(|r| r[0]).collect()
    }

    #[test]
    fn test_first_fill_on_construction() {
        let store = MemoryStore::new();
        seeded(&store, "a", 10, 2);

        let reader = reader(&store, "a", 4);
        assert_eq!(reader.buffer_rows(), 4);
        assert_eq!(reader.stats().store_calls, 1);
        assert_eq!(
            store.read_calls("a"),
            vec![RangeCall {
                start_row: 0,
                row_count: 4
            }]
        );
    }

    #[test]
    fn test_chunk_spanning_refill() {
        let store = MemoryStore::new();
        seeded(&store, "a", 10, 2);
        let mut reader = reader(&store, "a", 4);

        let mut chunk = Dense2D::new(3, 2);
        reader.read_chunk(&mut chunk).unwrap();
        assert_eq!(first_column(&chunk), vec![0.0, 1.0, 2.0]);

        // Rows 3 | 4, 5 straddle the first and second buffer loads
        let read = reader.read_chunk(&mut chunk).unwrap();
        assert_eq!(first_column(&chunk), vec![3.0, 4.0, 5.0]);
        assert_eq!(read.rows_read, 3);
        assert!(!read.is_padded());
        assert_eq!(store.read_calls("a").len(), 2);
        assert_eq!(reader.position(), 6);
        assert_eq!(reader.remaining_rows(), 4);
    }

    #[test]
    fn test_padding_starts_at_first_unfilled_row() {
        let store = MemoryStore::new();
        seeded(&store, "a", 5, 3);
        let mut reader = reader(&store, "a", 2);

        let mut chunk = Dense2D::filled(4, 3, -1.0);
        reader.read_chunk(&mut chunk).unwrap();

        let mut chunk = Dense2D::filled(4, 3, -1.0);
        let read = reader.read_chunk(&mut chunk).unwrap();
        assert_eq!(read.rows_read, 1);
        assert_eq!(read.rows_padded, 3);
        assert!(!read.is_end_of_stream());
        assert_eq!(chunk.row(0).unwrap(), &[4.0, 4.0, 4.0]);
        for r in 1..4 {
            assert!(chunk.row(r).unwrap().iter().all(|&v| v == 32767.0));
        }
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_reads_after_end_are_all_padding() {
        let store = MemoryStore::new();
        seeded(&store, "a", 2, 1);
        let mut reader = reader(&store, "a", 2);

        let mut chunk = Dense2D::new(2, 1);
        let read = reader.read_chunk(&mut chunk).unwrap();
        assert_eq!(read.rows_read, 2);
        assert!(!read.is_end_of_stream());

        for _ in 0..3 {
            let read = reader.read_chunk(&mut chunk).unwrap();
            assert!(read.is_end_of_stream());
            assert_eq!(read.rows_padded, 2);
            assert_eq!(chunk.as_slice(), &[32767.0, 32767.0]);
        }
        assert_eq!(reader.stats().padded_rows, 6);
        // No refill once the data is exhausted
        assert_eq!(store.read_calls("a").len(), 1);
    }

    #[test]
    fn test_buffer_clamped_to_dataset() {
        let store = MemoryStore::new();
        seeded(&store, "a", 12, 5);

        let reader = reader(&store, "a", 14);
        assert_eq!(reader.buffer_rows(), 12);
        assert_eq!(
            store.read_calls("a"),
            vec![RangeCall {
                start_row: 0,
                row_count: 12
            }]
        );
    }

    #[test]
    fn test_empty_dataset_pads_immediately() {
        let store = MemoryStore::new();
        store
            .insert::<f32>("empty", layout(), 3, Vec::new())
            .unwrap();

        let mut reader = reader(&store, "empty", 8);
        assert_eq!(reader.buffer_rows(), 0);
        assert!(store.read_calls("empty").is_empty());

        let mut chunk = Dense2D::new(2, 3);
        let read = reader.read_chunk(&mut chunk).unwrap();
        assert!(read.is_end_of_stream());
        assert!(chunk.as_slice().iter().all(|&v| v == 32767.0));
    }

    #[test]
    fn test_zero_row_chunk_is_noop() {
        let store = MemoryStore::new();
        seeded(&store, "a", 3, 2);
        let mut reader = reader(&store, "a", 2);

        let mut chunk = Dense2D::new(0, 2);
        let read = reader.read_chunk(&mut chunk).unwrap();
        assert_eq!(read.rows_read, 0);
        assert_eq!(read.rows_padded, 0);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_shape_mismatch_leaves_state_untouched() {
        let store = MemoryStore::new();
        seeded(&store, "a", 4, 2);
        let mut reader = reader(&store, "a", 2);

        let mut wrong = Dense2D::new(2, 3);
        let err = reader.read_chunk(&mut wrong).unwrap_err();
        assert!(matches!(
            err,
            StreamError::ShapeMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
        assert_eq!(reader.position(), 0);

        let mut chunk = Dense2D::new(1, 2);
        reader.read_chunk(&mut chunk).unwrap();
        assert_eq!(chunk.row(0).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_write_on_reader_is_mode_violation() {
        let store = MemoryStore::new();
        seeded(&store, "a", 4, 2);
        let mut reader = reader(&store, "a", 2);

        let chunk = Dense2D::new(1, 2);
        let err = ChunkStream::write_chunk(&mut reader, &chunk).unwrap_err();
        assert!(matches!(
            err,
            StreamError::ModeViolation {
                mode: StreamMode::Read,
                ..
            }
        ));
        assert!(err.is_recoverable());
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.mode(), StreamMode::Read);
    }

    #[test]
    fn test_refill_failure_keeps_served_rows_and_retries() {
        let store = MemoryStore::new();
        seeded(&store, "a", 10, 1);
        let mut reader = reader(&store, "a", 2);
        store.fail_next_reads("a", 1).unwrap();

        let mut chunk = Dense2D::new(3, 1);
        let err = reader.read_chunk(&mut chunk).unwrap_err();
        assert!(matches!(err, StreamError::Refill { rows_read: 2, .. }));
        assert!(err.is_recoverable());
        assert_eq!(first_column(&chunk)[..2], [0.0, 1.0]);
        assert_eq!(reader.position(), 2);

        let read = reader.read_chunk(&mut chunk).unwrap();
        assert_eq!(read.rows_read, 3);
        assert_eq!(first_column(&chunk), vec![2.0, 3.0, 4.0]);
        assert_eq!(reader.position(), 5);
        assert_eq!(
            store.read_calls("a"),
            vec![
                RangeCall {
                    start_row: 0,
                    row_count: 2
                },
                RangeCall {
                    start_row: 2,
                    row_count: 2
                },
                RangeCall {
                    start_row: 2,
                    row_count: 2
                },
                RangeCall {
                    start_row: 4,
                    row_count: 2
                },
            ]
        );
        // The failed attempt is not counted as a refill
        assert_eq!(reader.stats().store_calls, 3);
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_reads() {
        let store = MemoryStore::new();
        seeded(&store, "a", 4, 2);
        let mut reader = reader(&store, "a", 2);

        reader.close().unwrap();
        reader.close().unwrap();
        assert!(reader.is_closed());

        let mut chunk = Dense2D::new(1, 2);
        assert!(matches!(
            reader.read_chunk(&mut chunk),
            Err(StreamError::Closed(_))
        ));
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let store = MemoryStore::new();
        seeded(&store, "a", 4, 2);
        let result: StreamResult<BufferedReader<f32, MemorySource<f32>>> =
            BufferedReader::open_in(&store, "a", &layout(), 0);
        assert!(matches!(result, Err(StreamError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_dimension_fails_construction() {
        let store = MemoryStore::new();
        seeded(&store, "a", 4, 2);
        let wrong = DatasetLayout::new("varxy", "time", "y");
        let result: StreamResult<BufferedReader<f32, MemorySource<f32>>> =
            BufferedReader::open_in(&store, "a", &wrong, 2);
        assert!(matches!(
            result,
            Err(StreamError::Store(nc_store::StoreError::Dimension { .. }))
        ));
    }
}
