/// Positions of two objects in the world's index-ordered object list, `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectPair {
    pub a: usize,
    pub b: usize,
}

/// Yields every unordered pair `(i, j)` with `i < j` over `count` objects,
/// in ascending `(i, j)` order.
#[derive(Debug, Clone)]
pub struct PairEnumerator {
    count: usize,
    next: ObjectPair,
    remaining: usize,
}

impl PairEnumerator {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            next: ObjectPair { a: 0, b: 1 },
            remaining: Self::pair_count(count),
        }
    }

    /// `n(n-1)/2`; zero for fewer than two objects.
    pub fn pair_count(count: usize) -> usize {
        count * count.saturating_sub(1) / 2
    }
}

impl Iterator for PairEnumerator {
    type Item = ObjectPair;

    fn next(&mut self) -> Option<ObjectPair> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.remaining -= 1;
        self.next.b += 1;
        if self.next.b == self.count {
            self.next.a += 1;
            self.next.b = self.next.a + 1;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PairEnumerator {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_objects_yield_nothing() {
        assert_eq!(PairEnumerator::new(0).count(), 0);
        assert_eq!(PairEnumerator::new(1).count(), 0);
    }

    #[test]
    fn pairs_are_canonical_and_complete() {
        let pairs: Vec<(usize, usize)> = PairEnumerator::new(4).map(|p| (p.a, p.b)).collect();
        assert_eq!(
            pairs,
            vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]
        );
    }

    #[test]
    fn length_matches_pair_count() {
        for n in 0..12 {
            let enumerator = PairEnumerator::new(n);
            assert_eq!(enumerator.len(), PairEnumerator::pair_count(n));
            assert_eq!(enumerator.count(), n * n.saturating_sub(1) / 2);
        }
    }
}
