//! Fixed-capacity row buffer shared by readers and writers.

use nc_store::Element;
use ncio_common::{Dense2D, GridError, GridResult};

/// A fixed number of rows plus a cursor.
///
/// For a reader the cursor is the next row to serve and `loaded` is how many
/// rows the last refill produced. For a writer the cursor is the next free
/// row. The buffer itself never talks to a store.
#[derive(Debug, Clone)]
pub struct RowBuffer<T> {
    rows: Dense2D<T>,
    cursor: usize,
    loaded: usize,
}

impl<T: Element> RowBuffer<T> {
    /// Allocate an empty buffer of `capacity` rows by `ncols` columns.
    pub fn new(capacity: usize, ncols: usize) -> Self {
        Self {
            rows: Dense2D::new(capacity, ncols),
            cursor: 0,
            loaded: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows.rows()
    }

    pub fn ncols(&self) -> usize {
        self.rows.cols()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rows produced by the last refill.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Reader side: every loaded row has been served.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.loaded
    }

    /// Writer side: no free rows left.
    pub fn is_full(&self) -> bool {
        self.cursor >= self.capacity()
    }

    /// Move the cursor back to the first row.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Region the next refill of `count` rows should land in.
    pub fn refill_target(&mut self, count: usize) -> GridResult<&mut [T]> {
        self.rows.row_block_mut(0, count)
    }

    /// Record that a refill produced `count` rows and rewind the cursor.
    pub fn mark_loaded(&mut self, count: usize) {
        debug_assert!(count <= self.capacity());
        self.loaded = count;
        self.cursor = 0;
    }

    /// Reader side: the row under the cursor, then advance.
    pub fn take_row(&mut self) -> GridResult<&[T]> {
        let row = self.cursor;
        if row >= self.loaded {
            return Err(GridError::RowOutOfBounds {
                row,
                rows: self.loaded,
            });
        }
        let values = self.rows.row(row)?;
        self.cursor += 1;
        Ok(values)
    }

    /// Writer side: copy `values` into the row under the cursor, then advance.
    pub fn push_row(&mut self, values: &[T]) -> GridResult<()> {
        self.rows.copy_row_from(self.cursor, values)?;
        self.cursor += 1;
        Ok(())
    }

    /// Writer side: rows filled so far, as one flat slice.
    pub fn filled(&self) -> GridResult<&[T]> {
        self.rows.row_block(0, self.cursor)
    }
}
