//! The reference write-then-read scenario.
//!
//! Four chunks of three rows each are written with every cell of chunk `k`
//! set to `k` (1..=4), through a writer with a 7-row buffer. The resulting
//! 12-row file is read back in 5-row chunks through a reader asking for a
//! 14-row buffer, which gets clamped to 12.

/// Dataset variable and dimension names.
pub mod layout {
    pub const VARIABLE: &str = "varxy";
    pub const ROW_DIM: &str = "x";
    pub const COL_DIM: &str = "y";
}

pub mod scenario {
    /// Columns per row.
    pub const NCOLS: usize = 5;

    /// Rows per written chunk.
    pub const WRITE_CHUNK_ROWS: usize = 3;

    /// Value written into every cell of each chunk, in order.
    pub const STEP_VALUES: [i16; 4] = [1, 2, 3, 4];

    /// Total rows in the file once written.
    pub const NROWS: usize = WRITE_CHUNK_ROWS * STEP_VALUES.len();

    /// Writer buffer capacity.
    pub const WRITE_BUFFER_ROWS: usize = 7;

    /// Row counts of each flush: one when the buffer fills, one at close.
    pub const EXPECTED_FLUSHES: [usize; 2] = [7, 5];

    /// Reader buffer capacity before clamping.
    pub const READ_BUFFER_ROWS: usize = 14;

    /// Rows per read chunk.
    pub const READ_CHUNK_ROWS: usize = 5;

    /// Sentinel used for padding rows.
    pub const P: i16 = 32767;

    /// Per-row value of each read chunk; the fourth read is all padding.
    pub const EXPECTED_READS: [[i16; READ_CHUNK_ROWS]; 4] = [
        [1, 1, 1, 2, 2],
        [2, 3, 3, 3, 4],
        [4, 4, P, P, P],
        [P, P, P, P, P],
    ];
}

#[cfg(test)]
mod tests {
    use super::scenario::*;

    #[test]
    fn test_scenario_is_consistent() {
        assert_eq!(EXPECTED_FLUSHES.iter().sum::<usize>(), NROWS);
        assert!(READ_BUFFER_ROWS > NROWS);

        let real: usize = EXPECTED_READS
            .iter()
            .flatten()
            .filter(|&&v| v != P)
            .count();
        assert_eq!(real, NROWS);
    }
}
