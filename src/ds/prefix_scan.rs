use super::{Scalar, NOT_FOUND};

/// A fully materialized prefix-sum array over a flat sequence of weights
///
/// The baseline [`BucketSums`](super::BucketSums) is measured against:
/// lookups binary-search the prefix array in `O(log n)`, but any change to
/// the sequence forces a full `O(n)` rescan. Cheap queries, expensive
/// updates — the opposite trade to the bucket table.
#[derive(Debug, Clone)]
pub struct PrefixScan<T> {
    prefix: Vec<T>,
}

impl<T: Scalar> PrefixScan<T> {
    /// Materialize inclusive prefix sums over `values`
    pub fn new<S>(values: &S) -> Self
    where
        S: AsRef<[T]> + ?Sized,
    {
        let values = values.as_ref();
        let mut scan = Self {
            prefix: Vec::with_capacity(values.len() + 1),
        };
        scan.rebuild(values);
        scan
    }

    /// Rescan the whole sequence; `O(n)`
    pub fn rebuild<S>(&mut self, values: &S)
    where
        S: AsRef<[T]> + ?Sized,
    {
        self.prefix.clear();
        self.prefix.push(T::zero());
        let mut running = T::zero();
        for &w in values.as_ref() {
            running += w;
            self.prefix.push(running);
        }
    }

    /// Sum of the whole sequence as of the last rebuild
    pub fn total(&self) -> T {
        self.prefix[self.prefix.len() - 1]
    }

    /// First index whose inclusive running total reaches `threshold`, or
    /// [`NOT_FOUND`] when no prefix does (or the threshold is not positive)
    pub fn find_upper_bound(&self, threshold: T) -> usize {
        let k = self.prefix.partition_point(|&p| p < threshold);
        if k == 0 || k == self.prefix.len() {
            return NOT_FOUND;
        }
        k - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_scan_functional() {
        let mut weights = vec![0.5, 1.5, 1.0, 2.0];
        let mut scan = PrefixScan::new(&weights);
        assert_eq!(scan.total(), 5.0, "total is the last prefix entry");
        assert_eq!(scan.find_upper_bound(0.4), 0, "lands in the first element");
        assert_eq!(scan.find_upper_bound(2.5), 2, "lands mid-sequence");
        assert_eq!(scan.find_upper_bound(4.9), 3, "lands in the last element");
        assert_eq!(
            scan.find_upper_bound(5.1),
            NOT_FOUND,
            "beyond the total finds nothing"
        );

        weights[0] = 3.0;
        scan.rebuild(&weights);
        assert_eq!(scan.total(), 7.5, "rebuild follows the sequence");
        assert_eq!(scan.find_upper_bound(2.5), 0, "grown head absorbs the threshold");
    }
}
