use std::fmt;
use std::ops::Index;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    config::DistanceConfig,
    core::shape::{lock_object_shape, BoundingHierarchy, CollisionShape},
    distance::{
        manifold::ManifoldSelector,
        pairs::{ObjectPair, PairEnumerator},
        separation::SeparationSolver,
    },
    error::{DistanceError, Result},
    utils::{
        allocator::EntityId,
        logging::{self, warn_if_touching_without_manifold},
        profiling::{self, QueryStats},
    },
    world::{CollisionWorld, ObjectView},
};

/// How a pair's record was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairKind {
    /// Taken from an existing contact manifold.
    Collision,
    /// Measured by the separation query; no manifold exists.
    Free,
}

impl fmt::Display for PairKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairKind::Collision => f.write_str("collision"),
            PairKind::Free => f.write_str("free"),
        }
    }
}

/// Outcome for one unordered object pair. `obj_a` has the lower index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub obj_a: EntityId,
    pub obj_b: EntityId,
    pub kind: PairKind,
    pub distance: f32,
    pub point_on_a: Vec3,
    pub point_on_b: Vec3,
}

impl PairRecord {
    pub fn witness_distance(&self) -> f32 {
        self.point_on_a.distance(self.point_on_b)
    }

    pub fn is_collision(&self) -> bool {
        self.kind == PairKind::Collision
    }

    fn sort_key(&self) -> (usize, usize) {
        (self.obj_a.index(), self.obj_b.index())
    }
}

impl fmt::Display for PairRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}: {} distance={:.6} a={:?} b={:?}",
            self.obj_a, self.obj_b, self.kind, self.distance, self.point_on_a, self.point_on_b
        )
    }
}

/// One record per unordered object pair, ascending by `(index_a, index_b)`.
///
/// Holds copies of all point data; it stays valid after the world changes,
/// though its ids only resolve while the objects live. Deserialized and
/// converted matrices are re-sorted so lookups keep working.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SerializedMatrix")]
pub struct DistanceMatrix {
    records: Vec<PairRecord>,
}

#[derive(Deserialize)]
struct SerializedMatrix {
    records: Vec<PairRecord>,
}

impl From<SerializedMatrix> for DistanceMatrix {
    fn from(raw: SerializedMatrix) -> Self {
        Self::from(raw.records)
    }
}

impl From<Vec<PairRecord>> for DistanceMatrix {
    fn from(mut records: Vec<PairRecord>) -> Self {
        records.sort_by_key(PairRecord::sort_key);
        Self { records }
    }
}

impl DistanceMatrix {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PairRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[PairRecord] {
        &self.records
    }

    /// Record for the unordered pair `{a, b}`.
    pub fn get(&self, a: EntityId, b: EntityId) -> Option<&PairRecord> {
        let (lo, hi) = if a.index() <= b.index() { (a, b) } else { (b, a) };
        self.records
            .binary_search_by_key(&(lo.index(), hi.index()), PairRecord::sort_key)
            .ok()
            .map(|position| &self.records[position])
            .filter(|record| record.obj_a == lo && record.obj_b == hi)
    }

    pub fn collisions(&self) -> impl Iterator<Item = &PairRecord> + '_ {
        self.records.iter().filter(|record| record.is_collision())
    }

    /// Record with the smallest distance; the earliest wins ties.
    pub fn closest(&self) -> Option<&PairRecord> {
        self.records.iter().fold(None, |best: Option<&PairRecord>, r| match best {
            Some(b) if b.distance <= r.distance => Some(b),
            _ => Some(r),
        })
    }

    pub fn into_records(self) -> Vec<PairRecord> {
        self.records
    }
}

impl Index<usize> for DistanceMatrix {
    type Output = PairRecord;

    fn index(&self, index: usize) -> &PairRecord {
        &self.records[index]
    }
}

impl IntoIterator for DistanceMatrix {
    type Item = PairRecord;
    type IntoIter = std::vec::IntoIter<PairRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a DistanceMatrix {
    type Item = &'a PairRecord;
    type IntoIter = std::slice::Iter<'a, PairRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Drives pair enumeration and assembles the distance matrix.
///
/// For each pair the manifold is consulted first; only pairs without one run
/// the separation query. Any precondition failure aborts the whole matrix.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    config: DistanceConfig,
    stats: QueryStats,
}

impl ResultAggregator {
    pub fn new(config: DistanceConfig) -> Self {
        Self {
            config,
            stats: QueryStats::default(),
        }
    }

    pub fn config(&self) -> &DistanceConfig {
        &self.config
    }

    /// Counters from the most recent [`compute`](Self::compute).
    pub fn last_stats(&self) -> &QueryStats {
        &self.stats
    }

    pub fn compute<W: CollisionWorld>(&mut self, world: &W) -> Result<DistanceMatrix> {
        let _trace = logging::ScopedTimer::new("distance::compute_matrix");
        self.stats.reset();

        let mut elapsed = Duration::ZERO;
        let result = {
            let _timer = profiling::ScopedTimer::new(&mut elapsed);
            self.evaluate(world)
        };
        self.stats.elapsed = elapsed;

        let matrix = result?;
        log::info!(
            "distance matrix: {} records, {} collisions",
            matrix.len(),
            self.stats.manifold_hits
        );
        self.stats.report();
        Ok(matrix)
    }

    fn evaluate<W: CollisionWorld>(&mut self, world: &W) -> Result<DistanceMatrix> {
        let objects = world.objects();
        if objects.len() < 2 {
            return Ok(DistanceMatrix::default());
        }
        let pairs = PairEnumerator::new(objects.len());
        for view in &objects {
            validate(view)?;
        }

        let selector = ManifoldSelector::new(world.manifolds());
        let config = self.config;
        let evaluate = |pair: &ObjectPair| {
            evaluate_pair(&selector, &objects[pair.a], &objects[pair.b], &config)
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<(PairRecord, QueryStats)> =
            if config.parallel && pairs.len() >= config.parallel_threshold {
                let pairs: Vec<ObjectPair> = pairs.collect();
                pairs.par_iter().map(evaluate).collect::<Result<_>>()?
            } else {
                pairs.map(|pair| evaluate(&pair)).collect::<Result<_>>()?
            };
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<(PairRecord, QueryStats)> =
            pairs.map(|pair| evaluate(&pair)).collect::<Result<_>>()?;

        let mut records = Vec::with_capacity(outcomes.len());
        for (record, stats) in outcomes {
            self.stats.merge(&stats);
            records.push(record);
        }
        // Workers may finish in any order.
        Ok(DistanceMatrix::from(records))
    }
}

/// Checks one object's query preconditions up front so the reported error
/// does not depend on pair evaluation order.
fn validate<S: CollisionShape>(view: &ObjectView<'_, S>) -> Result<()> {
    let (_, hierarchy) = lock_object_shape(view.id, view.shape)?;
    if hierarchy.root().is_none() {
        return Err(DistanceError::DegenerateShape { object: view.id });
    }
    Ok(())
}

fn evaluate_pair<S: CollisionShape>(
    selector: &ManifoldSelector<'_>,
    a: &ObjectView<'_, S>,
    b: &ObjectView<'_, S>,
    config: &DistanceConfig,
) -> Result<(PairRecord, QueryStats)> {
    let mut stats = QueryStats {
        pairs_evaluated: 1,
        ..QueryStats::default()
    };

    if let Some(record) = selector.select(a.id, b.id) {
        stats.manifold_hits = 1;
        log::debug!("{record}");
        return Ok((record, stats));
    }

    let separation = SeparationSolver::solve(a, b)?;
    stats.separation_queries = 1;
    stats.node_pairs_visited = separation.traversal.node_pairs_visited;
    stats.node_pairs_pruned = separation.traversal.node_pairs_pruned;
    stats.leaf_pair_tests = separation.traversal.leaf_pair_tests;

    if config.warn_on_touching {
        warn_if_touching_without_manifold(
            (a.id.index(), b.id.index()),
            separation.distance,
            separation.tolerance,
        );
    }

    let record = PairRecord {
        obj_a: a.id,
        obj_b: b.id,
        kind: PairKind::Free,
        distance: separation.distance,
        point_on_a: separation.point_on_a,
        point_on_b: separation.point_on_b,
    };
    log::debug!("{record}");
    Ok((record, stats))
}
