//! Buffered chunk writer.
//!
//! Rows from caller chunks are copied into a fixed-capacity buffer. Each time
//! the buffer fills it is flushed to the store as one contiguous range, as
//! many times per chunk as needed. `close` flushes whatever is left, which may
//! be less than a full buffer; dropping an unclosed writer does the same.

use std::path::Path;

use nc_store::{DatasetStore, Element, RowSink};
use ncio_common::{DatasetDescriptor, DatasetLayout, Dense2D, StreamMode};
use tracing::{debug, error, info, warn};

use crate::buffer::RowBuffer;
use crate::error::{StreamError, StreamResult};
use crate::stream::{ChunkRead, ChunkStream, StreamStats};

/// Sequential writer that appends rows to a new 2D dataset.
pub struct BufferedWriter<T: Element, S: RowSink<T>> {
    sink: S,
    buffer: RowBuffer<T>,
    current_row: usize,
    stats: StreamStats,
    closed: bool,
}

impl<T: Element, S: RowSink<T>> BufferedWriter<T, S> {
    /// Wrap a freshly created sink.
    pub fn new(sink: S, buffer_rows: usize) -> StreamResult<Self> {
        let ncols = sink.descriptor().ncols;
        check_shape_params(ncols, buffer_rows)?;
        Ok(Self::from_sink(sink, buffer_rows, ncols))
    }

    /// Create `path` through `store` with `ncols` columns and wrap it.
    ///
    /// Parameters are checked before the store is touched.
    pub fn create_in<D>(
        store: &D,
        path: impl AsRef<Path>,
        layout: &DatasetLayout,
        ncols: usize,
        buffer_rows: usize,
    ) -> StreamResult<Self>
    where
        D: DatasetStore<T, Sink = S>,
    {
        check_shape_params(ncols, buffer_rows)?;
        let sink = store.create(path.as_ref(), layout, ncols)?;
        Ok(Self::from_sink(sink, buffer_rows, ncols))
    }

    fn from_sink(sink: S, buffer_rows: usize, ncols: usize) -> Self {
        debug!(
            descriptor = %sink.descriptor(),
            buffer_rows = buffer_rows,
            "Opened buffered writer"
        );
        Self {
            current_row: sink.descriptor().nrows,
            sink,
            buffer: RowBuffer::new(buffer_rows, ncols),
            stats: StreamStats::default(),
            closed: false,
        }
    }

    /// Descriptor of the dataset; `nrows` counts flushed rows only.
    pub fn descriptor(&self) -> &DatasetDescriptor {
        self.sink.descriptor()
    }

    pub fn ncols(&self) -> usize {
        self.buffer.ncols()
    }

    pub fn buffer_rows(&self) -> usize {
        self.buffer.capacity()
    }

    /// Absolute index the next flush will start at.
    pub fn position(&self) -> usize {
        self.current_row
    }

    /// Rows sitting in the buffer, not yet in the store.
    pub fn pending_rows(&self) -> usize {
        self.buffer.cursor()
    }

    /// Rows accepted so far, flushed or not.
    pub fn rows_written(&self) -> usize {
        self.current_row + self.buffer.cursor()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Append every row of `chunk`, flushing each time the buffer fills.
    ///
    /// On a flush failure the buffered rows are kept and the error reports
    /// how many chunk rows were accepted; the next `write_chunk` or `close`
    /// retries the flush first.
    pub fn write_chunk(&mut self, chunk: &Dense2D<T>) -> StreamResult<()> {
        self.ensure_open()?;
        self.check_shape(chunk)?;

        if self.buffer.is_full() {
            self.flush().map_err(|e| flush_failed(e, 0))?;
        }

        for (i, row) in chunk.iter_rows().enumerate() {
            self.buffer.push_row(row)?;
            if self.buffer.is_full() {
                self.flush().map_err(|e| flush_failed(e, i + 1))?;
            }
        }
        Ok(())
    }

    /// Flush the partially filled buffer and release the store handle.
    ///
    /// A final flush is always issued, even with zero pending rows. If it
    /// fails the handle is kept open so `close` can be retried. A second
    /// successful call is a no-op.
    pub fn close(&mut self) -> StreamResult<()> {
        if self.closed {
            return Ok(());
        }

        self.flush()?;
        self.closed = true;
        self.sink.close()?;

        info!(
            path = %self.descriptor().path.display(),
            rows = self.current_row,
            flushes = self.stats.store_calls,
            "Closed buffered writer"
        );
        Ok(())
    }

    /// Write the buffered rows at `current_row` and rewind the buffer.
    fn flush(&mut self) -> StreamResult<()> {
        let count = self.buffer.cursor();
        let rows = self.buffer.filled()?;
        self.sink.write_range(self.current_row, count, rows)?;

        debug!(start_row = self.current_row, rows = count, "Flushed write buffer");
        self.stats.store_calls += 1;
        self.stats.rows += count as u64;
        self.current_row += count;
        self.buffer.reset();
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

fn check_shape_params(ncols: usize, buffer_rows: usize) -> StreamResult<()> {
    if buffer_rows == 0 {
        return Err(StreamError::invalid_config("buffer_rows must be > 0"));
    }
    if ncols == 0 {
        return Err(StreamError::invalid_config("column count must be > 0"));
    }
    Ok(())
}

fn flush_failed(err: StreamError, accepted_rows: usize) -> StreamError {
    match err {
        StreamError::Store(source) => StreamError::Flush {
            accepted_rows,
            source,
        },
        other => other,
    }
}

impl<T: Element, S: RowSink<T>> ChunkStream<T> for BufferedWriter<T, S> {
    fn mode(&self) -> StreamMode {
        StreamMode::Write
    }

    fn descriptor(&self) -> &DatasetDescriptor {
        BufferedWriter::descriptor(self)
    }

    fn read_chunk(&mut self, _chunk: &mut Dense2D<T>) -> StreamResult<ChunkRead> {
        let path = self.descriptor().path.clone();
        warn!(path = %path.display(), "Can't read file; it's open in write mode");
        Err(StreamError::ModeViolation {
            path,
            mode: StreamMode::Write,
            operation: "read",
        })
    }

    fn write_chunk(&mut self, chunk: &Dense2D<T>) -> StreamResult<()> {
        BufferedWriter::write_chunk(self, chunk)
    }

    fn close(&mut self) -> StreamResult<()> {
        BufferedWriter::close(self)
    }

    fn stats(&self) -> StreamStats {
        self.stats
    }
}

impl<T: Element, S: RowSink<T>> Drop for BufferedWriter<T, S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let pending = self.buffer.cursor();
        if let Err(e) = self.close() {
            error!(
                path = %self.descriptor().path.display(),
                error = %e,
                pending_rows = pending,
                "Failed to flush writer on drop, buffered rows lost"
            );
            if let Err(e) = self.sink.close() {
                error!(error = %e, "Failed to release dataset handle");
            }
        }
    }
}

#[cfg(feature = "netcdf")]
mod netcdf_writer {
    use std::path::Path;

    use nc_store::{Element, NetCdfSink, NetCdfStore};
    use ncio_common::DatasetLayout;

    use super::BufferedWriter;
    use crate::config::StreamConfig;
    use crate::error::{StreamError, StreamResult};

    impl<T: Element> BufferedWriter<T, NetCdfSink<T>> {
        /// Create a new NetCDF file with an unlimited row dimension and
        /// `ncols` columns. An existing file at `path` is overwritten.
        pub fn create(
            path: impl AsRef<Path>,
            variable: &str,
            row_dimension: &str,
            column_dimension: &str,
            ncols: usize,
            buffer_rows: usize,
        ) -> StreamResult<Self> {
            let layout = DatasetLayout::new(variable, row_dimension, column_dimension);
            Self::create_in(&NetCdfStore, path, &layout, ncols, buffer_rows)
        }

        /// Create using names and buffer capacity from `config`.
        pub fn create_with(
            path: impl AsRef<Path>,
            ncols: usize,
            config: &StreamConfig,
        ) -> StreamResult<Self> {
            config.validate().map_err(StreamError::InvalidConfig)?;
            Self::create_in(&NetCdfStore, path, &config.layout(), ncols, config.buffer_rows)
        }
    }
}
