//! Dense row-major 2D container used for stream buffers and caller chunks.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Fixed-shape row-major grid of numeric values.
///
/// The shape never changes after construction. Element access goes through
/// checked indices: the `get`/`row` family returns a [`GridError`] on a bad
/// index, while `Index<(row, col)>` panics like slice indexing does.
/// Deserialized grids go through the same length check as [`Dense2D::from_vec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDense2D<T>")]
pub struct Dense2D<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// Unchecked wire form of [`Dense2D`].
#[derive(Deserialize)]
struct RawDense2D<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> TryFrom<RawDense2D<T>> for Dense2D<T> {
    type Error = GridError;

    fn try_from(raw: RawDense2D<T>) -> GridResult<Self> {
        Self::from_vec(raw.rows, raw.cols, raw.data)
    }
}

impl<T> Dense2D<T> {
    /// Wrap row-major values. `data.len()` must equal `rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> GridResult<Self> {
        match rows.checked_mul(cols) {
            Some(expected) if expected == data.len() => Ok(Self { rows, cols, data }),
            expected => Err(GridError::LengthMismatch {
                rows,
                cols,
                expected: expected.unwrap_or(usize::MAX),
                actual: data.len(),
            }),
        }
    }
}

impl<T: Copy + Default> Dense2D<T> {
    /// Create a grid with every element set to `T::default()`.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::default())
    }
}

impl<T: Copy> Dense2D<T> {
    /// Create a grid with every element set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> GridResult<T> {
        let idx = self.flat_index(row, col)?;
        Ok(self.data[idx])
    }

    /// Set the element at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> GridResult<()> {
        let idx = self.flat_index(row, col)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Borrow one row.
    pub fn row(&self, row: usize) -> GridResult<&[T]> {
        let range = self.row_range(row, 1)?;
        Ok(&self.data[range])
    }

    /// Mutably borrow one row.
    pub fn row_mut(&mut self, row: usize) -> GridResult<&mut [T]> {
        let range = self.row_range(row, 1)?;
        Ok(&mut self.data[range])
    }

    /// Borrow `count` consecutive rows starting at `start` as one flat slice.
    pub fn row_block(&self, start: usize, count: usize) -> GridResult<&[T]> {
        let range = self.row_range(start, count)?;
        Ok(&self.data[range])
    }

    /// Mutably borrow `count` consecutive rows starting at `start`.
    pub fn row_block_mut(&mut self, start: usize, count: usize) -> GridResult<&mut [T]> {
        let range = self.row_range(start, count)?;
        Ok(&mut self.data[range])
    }

    /// Overwrite one row with `values`, which must be exactly `cols` long.
    pub fn copy_row_from(&mut self, row: usize, values: &[T]) -> GridResult<()> {
        if values.len() != self.cols {
            return Err(GridError::RowLengthMismatch {
                cols: self.cols,
                actual: values.len(),
            });
        }
        self.row_mut(row)?.copy_from_slice(values);
        Ok(())
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// Set every element of rows `first_row..rows` to `value`.
    ///
    /// `first_row == rows` is allowed and touches nothing.
    pub fn fill_rows_from(&mut self, first_row: usize, value: T) -> GridResult<()> {
        if first_row > self.rows {
            return Err(GridError::RowOutOfBounds {
                row: first_row,
                rows: self.rows,
            });
        }
        let start = first_row * self.cols;
        self.data[start..].iter_mut().for_each(|v| *v = value);
        Ok(())
    }

    /// Iterate over rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |r| {
            let start = r * self.cols;
            &self.data[start..start + self.cols]
        })
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn flat_index(&self, row: usize, col: usize) -> GridResult<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(GridError::IndexOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    fn row_range(&self, start: usize, count: usize) -> GridResult<std::ops::Range<usize>> {
        match start.checked_add(count) {
            Some(end) if end <= self.rows => Ok(start * self.cols..end * self.cols),
            _ => Err(GridError::RowOutOfBounds {
                row: start.saturating_add(count.saturating_sub(1)),
                rows: self.rows,
            }),
        }
    }
}

impl<T: Copy> Index<(usize, usize)> for Dense2D<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for {}x{} grid",
            row,
            col,
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

impl<T: Copy> IndexMut<(usize, usize)> for Dense2D<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for {}x{} grid",
            row,
            col,
            self.rows,
            self.cols
        );
        &mut self.data[row * self.cols + col]
    }
}
