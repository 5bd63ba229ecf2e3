use std::time::{Duration, Instant};

/// Counters collected while computing one distance matrix.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueryStats {
    pub pairs_evaluated: usize,
    pub manifold_hits: usize,
    pub separation_queries: usize,
    pub node_pairs_visited: usize,
    pub node_pairs_pruned: usize,
    pub leaf_pair_tests: usize,
    pub elapsed: Duration,
}

impl QueryStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Folds per-pair counters into the running totals. `elapsed` is owned by
    /// the caller and left untouched.
    pub fn merge(&mut self, other: &Self) {
        self.pairs_evaluated += other.pairs_evaluated;
        self.manifold_hits += other.manifold_hits;
        self.separation_queries += other.separation_queries;
        self.node_pairs_visited += other.node_pairs_visited;
        self.node_pairs_pruned += other.node_pairs_pruned;
        self.leaf_pair_tests += other.leaf_pair_tests;
    }

    /// Share of visited node pairs discarded by the box bound.
    pub fn prune_ratio(&self) -> f32 {
        if self.node_pairs_visited == 0 {
            return 0.0;
        }
        self.node_pairs_pruned as f32 / self.node_pairs_visited as f32
    }

    pub fn report(&self) {
        log::info!(
            "pairs: {}, manifold hits: {}, separation queries: {}, elapsed: {:.3} ms",
            self.pairs_evaluated,
            self.manifold_hits,
            self.separation_queries,
            self.elapsed.as_secs_f32() * 1000.0
        );
        log::debug!(
            "  node pairs: {} visited, {} pruned ({:.1}%), leaf tests: {}",
            self.node_pairs_visited,
            self.node_pairs_pruned,
            self.prune_ratio() * 100.0,
            self.leaf_pair_tests
        );
    }
}

/// Adds the lifetime of the guard to `output` on drop.
pub struct ScopedTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_counters() {
        let mut total = QueryStats {
            pairs_evaluated: 1,
            node_pairs_visited: 10,
            node_pairs_pruned: 4,
            ..QueryStats::default()
        };
        let other = QueryStats {
            pairs_evaluated: 2,
            manifold_hits: 1,
            node_pairs_visited: 10,
            node_pairs_pruned: 6,
            leaf_pair_tests: 3,
            ..QueryStats::default()
        };
        total.merge(&other);
        assert_eq!(total.pairs_evaluated, 3);
        assert_eq!(total.manifold_hits, 1);
        assert_eq!(total.leaf_pair_tests, 3);
        assert!((total.prune_ratio() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn scoped_timer_accumulates() {
        let mut elapsed = Duration::ZERO;
        {
            let _timer = ScopedTimer::new(&mut elapsed);
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(elapsed >= Duration::from_millis(1));
    }
}
