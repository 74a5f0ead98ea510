use std::fmt;

use log::trace;
use thiserror::Error;

use super::{Scalar, NOT_FOUND};

/// Errors produced by the precondition checks on [`BucketSums`]
///
/// Only the `checks` feature makes these reachable; without it the
/// preconditions are part of the caller contract and go unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BucketError {
    /// A row index outside `0..rows` was passed to a row update
    #[error("row index {row} out of range for {rows} rows")]
    RowIndexOutOfRange { row: usize, rows: usize },
    /// An upper-bound threshold outside the open interval `(0, total)`
    #[error("threshold {reason}")]
    ValueOutOfRange { reason: &'static str },
}

// Compiles to nothing without the `checks` feature; precondition violations
// are then the caller's problem, not ours.
macro_rules! check {
    ($cond:expr, $err:expr) => {
        if cfg!(feature = "checks") && !($cond) {
            return Err($err);
        }
    };
}

/// A two-level partial-sum table over an external flat sequence of weights,
/// built for the mutate → update-row → refresh → query cycle of kinetic
/// Monte Carlo inner loops.
///
/// The sequence is viewed as `rows` logical rows of `cols` entries each,
/// zero-padded past its real length. The table caches one sum per row plus a
/// cumulative array over those sums, so a weighted lookup costs a binary
/// search over rows and a scan of a single row instead of a rescan of the
/// whole sequence, and a local change costs one row re-sum plus a cheap
/// cumulative repair. With `cols` near √N both sides stay sublinear.
///
/// The sequence itself is never stored: every operation that reads weights
/// borrows it for the duration of the call, and the caller must pass the
/// same logical sequence each time. After mutating weights, re-sum the
/// touched rows with [`BucketSums::update_row`] and repair the cumulative
/// array with [`BucketSums::refresh_cumsums`] (or
/// [`BucketSums::rebuild_cumsums`]) before querying again. Weights are
/// assumed non-negative; this is not checked, and upper-bound queries are
/// meaningless without it.
///
/// ### Example
/// ```
/// use kmc::ds::BucketSums;
///
/// let mut weights = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
/// let mut bucket = BucketSums::new(3, 3, &weights);
/// assert_eq!(bucket.find_upper_bound(&weights, 2.2).unwrap(), 6);
///
/// weights[4] = 1.5;
/// bucket.update_row(&weights, 1).unwrap();
/// bucket.refresh_cumsums();
/// assert_eq!(bucket.find_upper_bound(&weights, 5.0).unwrap(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct BucketSums<T> {
    rows: usize,
    cols: usize,
    row_sums: Vec<T>,
    cum_sums: Vec<T>,
    // Dirty rows span [dirty_min, dirty_max]; empty is encoded as (rows, 0)
    // so any real row index extends it with two unconditional comparisons.
    dirty_min: usize,
    dirty_max: usize,
}

impl<T: Scalar> BucketSums<T> {
    /// Build a table over `values` partitioned into `rows` × `cols`
    ///
    /// `values` may be any contiguous sequence of scalars (a `Vec`, an
    /// array, a slice) no longer than `rows * cols`; slots past its real
    /// length count as zero. Row sums and cumulative sums are fully
    /// materialized and the table starts clean.
    ///
    /// **Panics** if the shape is empty or `values` does not fit it.
    pub fn new<S>(rows: usize, cols: usize, values: &S) -> Self
    where
        S: AsRef<[T]> + ?Sized,
    {
        let values = values.as_ref();
        assert!(rows > 0 && cols > 0, "bucket shape must be non-empty");
        assert!(
            values.len() <= rows * cols,
            "sequence of length {} does not fit a {}x{} view",
            values.len(),
            rows,
            cols
        );

        let mut bucket = Self {
            rows,
            cols,
            row_sums: vec![T::zero(); rows],
            cum_sums: vec![T::zero(); rows + 1],
            dirty_min: rows,
            dirty_max: 0,
        };
        bucket.update_all_rows(values);
        bucket.rebuild_cumsums();
        trace!("bucket sums over {} rows x {} cols", rows, cols);
        bucket
    }

    /// Number of logical rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of entries per row
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of slots in the padded view, `rows * cols`
    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    /// The inclusive range of rows re-summed since the last cumulative
    /// refresh, or `None` if the table is clean
    pub fn dirty_range(&self) -> Option<(usize, usize)> {
        (self.dirty_min <= self.dirty_max).then_some((self.dirty_min, self.dirty_max))
    }

    /// Per-row sums as last materialized
    pub fn row_sums(&self) -> &[T] {
        &self.row_sums
    }

    /// Cumulative row sums, one entry longer than the row count; entry 0 is
    /// always zero and the last entry is the grand total
    pub fn cum_sums(&self) -> &[T] {
        &self.cum_sums
    }

    /// Sum of the entire (padded) sequence as of the last refresh
    pub fn total(&self) -> T {
        self.cum_sums[self.rows]
    }

    fn sum_row(&mut self, values: &[T], row: usize) {
        let start = (row * self.cols).min(values.len());
        let end = ((row + 1) * self.cols).min(values.len());
        self.row_sums[row] = values[start..end].iter().fold(T::zero(), |acc, &w| acc + w);

        if row < self.dirty_min {
            self.dirty_min = row;
        }
        if row > self.dirty_max {
            self.dirty_max = row;
        }
    }

    /// Re-sum a single row after its weights changed; `O(cols)`
    ///
    /// Marks the row dirty so a later [`BucketSums::refresh_cumsums`] knows
    /// which span of the cumulative array to repair. The cumulative array
    /// itself is left stale until a refresh runs.
    ///
    /// With the `checks` feature enabled, a row index outside `0..rows` is
    /// rejected with [`BucketError::RowIndexOutOfRange`] before any state is
    /// touched; without it the index is trusted.
    pub fn update_row<S>(&mut self, values: &S, row: usize) -> Result<(), BucketError>
    where
        S: AsRef<[T]> + ?Sized,
    {
        check!(
            row < self.rows,
            BucketError::RowIndexOutOfRange {
                row,
                rows: self.rows
            }
        );
        self.sum_row(values.as_ref(), row);
        Ok(())
    }

    /// Re-sum every row; `O(rows * cols)`
    ///
    /// For when the whole sequence may have changed. Leaves the entire table
    /// dirty, so a refresh is still required before querying.
    pub fn update_all_rows<S>(&mut self, values: &S)
    where
        S: AsRef<[T]> + ?Sized,
    {
        let values = values.as_ref();
        for row in 0..self.rows {
            self.sum_row(values, row);
        }
    }

    /// Recompute the whole cumulative array from the row sums; `O(rows)`
    ///
    /// Correct no matter what state the table is in. Clears the dirty range.
    pub fn rebuild_cumsums(&mut self) {
        self.cum_sums[0] = T::zero();
        for row in 0..self.rows {
            self.cum_sums[row + 1] = self.cum_sums[row] + self.row_sums[row];
        }
        self.clear_dirty();
    }

    /// Repair the cumulative array across the dirty span only
    ///
    /// The prefix recurrence is re-run over `[dirty_min, dirty_max]` — the
    /// entry at `dirty_min` is still correct because no earlier row changed —
    /// and every later entry is then shifted by the span's net change, one
    /// scalar operation apiece with no further reads of the row sums. Clears
    /// the dirty range; a no-op on a clean table.
    ///
    /// Sound only if no row outside the tracked dirty span had its weights
    /// changed since the last refresh. The table cannot verify that cheaply,
    /// so it is a caller contract: always [`BucketSums::update_row`] every
    /// touched row before refreshing.
    pub fn refresh_cumsums(&mut self) {
        let Some((lo, hi)) = self.dirty_range() else {
            return;
        };

        let old_boundary = self.cum_sums[hi + 1];
        for row in lo..=hi {
            self.cum_sums[row + 1] = self.cum_sums[row] + self.row_sums[row];
        }
        let new_boundary = self.cum_sums[hi + 1];

        // Rows past the span kept their sums, so their entries move by the
        // span's net change. Sign-split keeps the arithmetic in range for
        // unsigned scalars.
        if new_boundary >= old_boundary {
            let delta = new_boundary - old_boundary;
            for row in hi + 1..self.rows {
                self.cum_sums[row + 1] += delta;
            }
        } else {
            let delta = old_boundary - new_boundary;
            for row in hi + 1..self.rows {
                self.cum_sums[row + 1] -= delta;
            }
        }
        self.clear_dirty();
    }

    fn clear_dirty(&mut self) {
        self.dirty_min = self.rows;
        self.dirty_max = 0;
    }

    /// Find the smallest index whose inclusive running total reaches
    /// `threshold`, or [`NOT_FOUND`] if the scan exhausts its row
    ///
    /// A binary search over the cumulative array picks the row holding the
    /// answer, then that row's weights are accumulated in order until the
    /// running total reaches the threshold; `O(log rows + cols)`. Exhausting
    /// the row is only possible when the cached sums are stale or weights are
    /// negative, so [`NOT_FOUND`] signals an invariant violation rather than
    /// a contract violation. Only meaningful on a clean table.
    ///
    /// With the `checks` feature enabled, thresholds outside the open
    /// interval `(0, total)` are rejected with
    /// [`BucketError::ValueOutOfRange`]; without it they are trusted.
    pub fn find_upper_bound<S>(&self, values: &S, threshold: T) -> Result<usize, BucketError>
    where
        S: AsRef<[T]> + ?Sized,
    {
        check!(
            threshold > T::zero(),
            BucketError::ValueOutOfRange {
                reason: "below the first element"
            }
        );
        check!(
            threshold < self.total(),
            BucketError::ValueOutOfRange {
                reason: "at or beyond the total sum"
            }
        );

        // The first cumulative entry strictly above the threshold sits one
        // past the row containing the answer.
        let row = self.cum_sums.partition_point(|&c| c <= threshold) - 1;

        let values = values.as_ref();
        let start = (row * self.cols).min(values.len());
        let end = ((row + 1) * self.cols).min(values.len());
        let mut running = self.cum_sums[row];
        for (offset, &w) in values[start..end].iter().enumerate() {
            running += w;
            if running >= threshold {
                return Ok(start + offset);
            }
        }
        Ok(NOT_FOUND)
    }

    /// Whether `index` is a real query result rather than [`NOT_FOUND`]
    pub fn is_valid_index(&self, index: usize) -> bool {
        index != NOT_FOUND
    }
}

/// Diagnostic dump of the cumulative array, comma-separated
impl<T: Scalar + fmt::Display> fmt::Display for BucketSums<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for c in &self.cum_sums {
            write!(f, "{}{}", sep, c)?;
            sep = ",";
        }
        Ok(())
    }
}
