use std::ops::{AddAssign, SubAssign};

use num_traits::Num;

/// Sentinel index returned when an upper-bound query scans past the end of
/// its row without reaching the threshold
pub const NOT_FOUND: usize = usize::MAX;

/// Numeric scalar types usable as sampling weights
///
/// Blanket-implemented for the primitive integer and float types. `bool` and
/// character-like types do not satisfy `Num`, so a `BucketSums<bool>` fails
/// to compile.
pub trait Scalar: Num + Copy + PartialOrd + AddAssign + SubAssign {}

impl<T> Scalar for T where T: Num + Copy + PartialOrd + AddAssign + SubAssign {}

mod bucket_sums;
mod prefix_scan;

pub use bucket_sums::{BucketError, BucketSums};
pub use prefix_scan::PrefixScan;
