use std::collections::{HashMap, HashSet};

use glam::Vec3;

use crate::{core::mesh::Aabb, utils::allocator::EntityId};

/// Boxes spanning more cells than this bypass the grid and are tested against everything.
const MAX_CELLS_PER_ENTRY: i64 = 4096;

/// Uniform grid spatial partitioning used by the broad-phase.
pub struct SpatialGrid {
    cell_size: f32,
    grid: HashMap<(i32, i32, i32), Vec<usize>>,
    oversized: Vec<usize>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            crate::config::DEFAULT_BROADPHASE_CELL_SIZE
        };
        Self {
            cell_size,
            grid: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    fn world_to_grid(&self, pos: Vec3) -> (i32, i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
            (pos.z / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.grid.clear();
        self.oversized.clear();
    }

    /// Registers entry `slot` in every cell its box touches.
    pub fn insert(&mut self, slot: usize, bounds: &Aabb) {
        let min_cell = self.world_to_grid(bounds.min);
        let max_cell = self.world_to_grid(bounds.max);
        let span = (max_cell.0 as i64 - min_cell.0 as i64 + 1)
            * (max_cell.1 as i64 - min_cell.1 as i64 + 1)
            * (max_cell.2 as i64 - min_cell.2 as i64 + 1);
        if span > MAX_CELLS_PER_ENTRY {
            self.oversized.push(slot);
            return;
        }

        for x in min_cell.0..=max_cell.0 {
            for y in min_cell.1..=max_cell.1 {
                for z in min_cell.2..=max_cell.2 {
                    self.grid.entry((x, y, z)).or_default().push(slot);
                }
            }
        }
    }

    /// Slot pairs `(i, j)`, `i < j`, sharing at least one cell or involving an oversized box.
    fn candidate_pairs(&self, slots: usize) -> HashSet<(usize, usize)> {
        let mut checked = HashSet::new();
        for entries in self.grid.values() {
            for (i, &a) in entries.iter().enumerate() {
                for &b in &entries[i + 1..] {
                    if a != b {
                        checked.insert((a.min(b), a.max(b)));
                    }
                }
            }
        }
        for &big in &self.oversized {
            for other in 0..slots {
                if other != big {
                    checked.insert((big.min(other), big.max(other)));
                }
            }
        }
        checked
    }
}

/// Broad phase driver returning object pairs whose margin-inflated boxes overlap.
pub struct BroadPhase {
    grid: SpatialGrid,
}

impl BroadPhase {
    pub fn new(cell_size: f32) -> Self {
        Self {
            grid: SpatialGrid::new(cell_size),
        }
    }

    /// `entries` must be ordered by stable index. Returns pairs in ascending
    /// `(index_a, index_b)` order; empty boxes never pair.
    pub fn get_potential_pairs(&mut self, entries: &[(EntityId, Aabb)]) -> Vec<(EntityId, EntityId)> {
        self.grid.clear();
        for (slot, (_, bounds)) in entries.iter().enumerate() {
            if !bounds.is_empty() {
                self.grid.insert(slot, bounds);
            }
        }

        let mut pairs: Vec<(usize, usize)> = self
            .grid
            .candidate_pairs(entries.len())
            .into_iter()
            .filter(|&(a, b)| {
                let (box_a, box_b) = (&entries[a].1, &entries[b].1);
                !box_a.is_empty() && !box_b.is_empty() && box_a.overlaps(box_b)
            })
            .collect();
        pairs.sort_unstable();
        pairs
            .into_iter()
            .map(|(a, b)| (entries[a].0, entries[b].0))
            .collect()
    }
}
