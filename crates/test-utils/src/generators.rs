//! Chunk and dataset generators with predictable, verifiable values.

use ncio_common::Dense2D;

/// Value stored at `(row, col)` by [`index_rows`]: `col * 1000 + row`.
///
/// Rows up to 1000 stay unambiguous, so a misplaced or duplicated row shows
/// up immediately when compared against this function.
pub fn index_value(row: usize, col: usize) -> f64 {
    (col * 1000 + row) as f64
}

/// Row-major dataset values where every cell holds [`index_value`].
pub fn index_rows(nrows: usize, ncols: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(nrows * ncols);
    for row in 0..nrows {
        for col in 0..ncols {
            data.push(index_value(row, col));
        }
    }
    data
}

/// Rows `first_row..first_row + rows` of the [`index_rows`] dataset as a chunk.
pub fn index_chunk(first_row: usize, rows: usize, ncols: usize) -> Dense2D<f64> {
    let mut chunk = Dense2D::new(rows, ncols);
    for r in 0..rows {
        for c in 0..ncols {
            chunk[(r, c)] = index_value(first_row + r, c);
        }
    }
    chunk
}

/// A chunk whose every cell holds `value`.
pub fn step_chunk<T: From<i16> + Copy>(value: i16, rows: usize, ncols: usize) -> Dense2D<T> {
    Dense2D::filled(rows, ncols, T::from(value))
}

/// Split `total` rows into chunk sizes cycling through `sizes`.
///
/// The last chunk is truncated so the sizes sum to exactly `total`. Zero
/// entries in `sizes` produce empty chunks.
pub fn chunk_plan(total: usize, sizes: &[usize]) -> Vec<usize> {
    let mut plan = Vec::new();
    if sizes.iter().all(|&s| s == 0) {
        return plan;
    }
    let mut left = total;
    for &size in sizes.iter().cycle() {
        if left == 0 {
            break;
        }
        let take = size.min(left);
        plan.push(take);
        left -= take;
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_rows() {
        let data = index_rows(5, 3);
        assert_eq!(data.len(), 15);
        assert_eq!(data[0], 0.0); // col=0, row=0
        assert_eq!(data[1], 1000.0); // col=1, row=0
        assert_eq!(data[3], 1.0); // col=0, row=1
    }

    #[test]
    fn test_index_chunk_matches_rows() {
        let chunk = index_chunk(2, 2, 3);
        assert_eq!(chunk.as_slice(), &index_rows(4, 3)[6..]);
    }

    #[test]
    fn test_step_chunk() {
        let chunk: Dense2D<f32> = step_chunk(4, 3, 5);
        assert_eq!(chunk.rows(), 3);
        assert!(chunk.as_slice().iter().all(|&v| v == 4.0));
    }

    #[test]
    fn test_chunk_plan_sums_to_total() {
        assert_eq!(chunk_plan(10, &[3]), vec![3, 3, 3, 1]);
        assert_eq!(chunk_plan(7, &[1, 4, 0]), vec![1, 4, 0, 1, 1]);
        assert!(chunk_plan(0, &[3]).is_empty());
        assert!(chunk_plan(5, &[0]).is_empty());
    }
}
