//! Classifier trait and bucket tables

/// Trait for attribute classifiers
pub trait Classifier {
    /// Output class produced for an input value
    type Output;

    /// Get the name of this classifier
    fn name(&self) -> &str;

    /// Classify an input value; never fails
    fn classify(&self, value: f64) -> Self::Output;
}

/// One half-open range `[min, max)` bound to an output value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket<T> {
    pub min: f64,
    pub max: f64,
    pub value: T,
}

impl<T> Bucket<T> {
    pub const fn new(min: f64, max: f64, value: T) -> Self {
        Self { min, max, value }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }
}

/// Ordered range-to-output lookup table
///
/// Buckets are scanned in order and the first range containing the value
/// wins. Values outside every range (negative input, NaN) resolve to the
/// table's default rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct BucketTable<T: 'static> {
    name: &'static str,
    buckets: &'static [Bucket<T>],
    default: T,
}

impl<T: Copy + 'static> BucketTable<T> {
    pub const fn new(name: &'static str, buckets: &'static [Bucket<T>], default: T) -> Self {
        Self {
            name,
            buckets,
            default,
        }
    }

    /// Index of the bucket containing `value`
    pub fn index_of(&self, value: f64) -> Option<usize> {
        self.buckets.iter().position(|b| b.contains(value))
    }

    /// Bucket containing `value`
    pub fn lookup(&self, value: f64) -> Option<&Bucket<T>> {
        self.buckets.iter().find(|b| b.contains(value))
    }

    pub fn buckets(&self) -> &'static [Bucket<T>] {
        self.buckets
    }

    pub fn default_value(&self) -> T {
        self.default
    }

    /// Check that the buckets are contiguous and cover `[0, inf)`
    pub fn is_partition(&self) -> bool {
        let Some(first) = self.buckets.first() else {
            return false;
        };
        let contiguous = self.buckets.windows(2).all(|w| w[0].max == w[1].min);
        let ordered = self.buckets.iter().all(|b| b.min < b.max);
        let last_unbounded = self
            .buckets
            .last()
            .is_some_and(|b| b.max == f64::INFINITY);
        first.min == 0.0 && contiguous && ordered && last_unbounded
    }
}

impl<T: Copy + 'static> Classifier for BucketTable<T> {
    type Output = T;

    fn name(&self) -> &str {
        self.name
    }

    fn classify(&self, value: f64) -> T {
        self.lookup(value).map(|b| b.value).unwrap_or(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: BucketTable<u8> = BucketTable::new(
        "test",
        &[
            Bucket::new(0.0, 10.0, 1),
            Bucket::new(10.0, 20.0, 2),
            Bucket::new(20.0, f64::INFINITY, 3),
        ],
        0,
    );

    #[test]
    fn test_half_open_boundaries() {
        assert_eq!(TABLE.classify(0.0), 1);
        assert_eq!(TABLE.classify(9.999), 1);
        assert_eq!(TABLE.classify(10.0), 2);
        assert_eq!(TABLE.classify(20.0), 3);
        assert_eq!(TABLE.classify(1.0e12), 3);
    }

    #[test]
    fn test_out_of_range_uses_default() {
        assert_eq!(TABLE.classify(-1.0), 0);
        assert_eq!(TABLE.classify(f64::NAN), 0);
        assert_eq!(TABLE.index_of(-0.5), None);
    }

    #[test]
    fn test_partition_check() {
        assert!(TABLE.is_partition());

        const GAPPY: BucketTable<u8> = BucketTable::new(
            "gappy",
            &[Bucket::new(0.0, 5.0, 1), Bucket::new(6.0, f64::INFINITY, 2)],
            0,
        );
        assert!(!GAPPY.is_partition());
    }

    #[test]
    fn test_name() {
        assert_eq!(TABLE.name(), "test");
    }
}
