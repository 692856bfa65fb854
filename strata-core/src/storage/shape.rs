//! Cheap per-partition length snapshots.

/// Per-partition byte lengths of an array.
///
/// Captured once per array per pass so that iterators can plan batches
/// without touching partition contents again. Constant once the array's
/// writing pass has completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayShape {
    lens: Vec<u64>,
}

impl ArrayShape {
    /// Build a shape from per-partition byte lengths.
    #[must_use]
    pub fn new(lens: Vec<u64>) -> Self {
        Self { lens }
    }

    /// Number of partitions.
    #[must_use]
    pub fn npart(&self) -> usize {
        self.lens.len()
    }

    /// Byte length of partition `part`.
    #[must_use]
    pub fn len(&self, part: usize) -> u64 {
        self.lens[part]
    }

    /// Total bytes across all partitions.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.lens.iter().sum()
    }

    /// Whether the whole array is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_accessors() {
        let shape = ArrayShape::new(vec![16, 0, 8]);
        assert_eq!(shape.npart(), 3);
        assert_eq!(shape.len(1), 0);
        assert_eq!(shape.total(), 24);
        assert!(!shape.is_empty());
        assert!(ArrayShape::new(vec![0, 0]).is_empty());
    }
}
