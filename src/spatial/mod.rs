//! Spatial index - uniform grid of entity buckets

use std::collections::HashMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Integer cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl CellKey {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Chebyshev distance in cells
    pub fn distance(&self, other: CellKey) -> u64 {
        self.x
            .abs_diff(other.x)
            .max(self.y.abs_diff(other.y))
            .max(self.z.abs_diff(other.z))
    }

    fn offset(&self, dx: i64, dy: i64, dz: i64) -> Option<CellKey> {
        Some(CellKey::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }
}

// Reach at this bound is treated as unbounded.
const MAX_REACH: i64 = i64::MAX / 4;

fn default_cell_size() -> f64 {
    10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
        }
    }
}

/// Buckets entity indices by cell. Rebuilt from scratch every tick; entities
/// never migrate between cells incrementally.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
    entity_count: usize,
}

impl SpatialGrid {
    /// Non-positive or non-finite sizes fall back to the default of 10.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            default_cell_size()
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            entity_count: 0,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cell_key(&self, position: DVec3) -> CellKey {
        let cell = (position / self.cell_size).floor();
        CellKey::new(cell.x as i64, cell.y as i64, cell.z as i64)
    }

    pub fn insert(&mut self, index: usize, position: DVec3) {
        let key = self.cell_key(position);
        self.cells.entry(key).or_default().push(index);
        self.entity_count += 1;
    }

    /// Clear every cell and re-insert each active entity under its current
    /// position. Buckets hold indices into `entities`.
    pub fn rebuild(&mut self, entities: &[Entity]) {
        self.clear();
        for (index, entity) in entities.iter().enumerate() {
            if entity.is_active() {
                self.insert(index, entity.position);
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entity_count = 0;
    }

    /// Contents of every cell within `ceil(radius / cell_size)` cells of the
    /// centre cell. Not filtered by true distance, so callers that need an
    /// exact neighbourhood must check it themselves.
    pub fn neighbors(&self, position: DVec3, radius: f64) -> Vec<usize> {
        let center = self.cell_key(position);
        // NaN radius reads as zero through `max`; infinity saturates the cast
        let reach = ((radius.max(0.0) / self.cell_size).ceil() as i64).min(MAX_REACH);
        let mut result = Vec::new();

        let span = reach.saturating_mul(2).saturating_add(1);
        let scanned = span.saturating_mul(span).saturating_mul(span);
        if usize::try_from(scanned).map_or(false, |scanned| scanned <= self.cells.len()) {
            for dx in -reach..=reach {
                for dy in -reach..=reach {
                    for dz in -reach..=reach {
                        let Some(key) = center.offset(dx, dy, dz) else {
                            continue;
                        };
                        if let Some(bucket) = self.cells.get(&key) {
                            result.extend_from_slice(bucket);
                        }
                    }
                }
            }
        } else {
            // Fewer occupied cells than offsets: walk the occupied ones instead.
            let mut keys: Vec<&CellKey> = self
                .cells
                .keys()
                .filter(|key| reach == MAX_REACH || key.distance(center) <= reach as u64)
                .collect();
            keys.sort();
            for key in keys {
                result.extend_from_slice(&self.cells[key]);
            }
        }

        result
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entity_count
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(default_cell_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, Role};

    fn entity_at(id: u64, position: DVec3) -> Entity {
        Entity::new(EntityId::new(id), "g", Role::Core, position)
    }

    #[test]
    fn test_cell_key_floors_negative_coordinates() {
        let grid = SpatialGrid::new(10.0);
        assert_eq!(grid.cell_key(DVec3::new(5.0, -0.1, 19.9)), CellKey::new(0, -1, 1));
        assert_eq!(grid.cell_key(DVec3::new(-10.0, 10.0, 0.0)), CellKey::new(-1, 1, 0));
    }

    #[test]
    fn test_invalid_cell_size_falls_back() {
        assert_eq!(SpatialGrid::new(0.0).cell_size(), 10.0);
        assert_eq!(SpatialGrid::new(f64::NAN).cell_size(), 10.0);
    }

    #[test]
    fn test_rebuild_skips_inactive() {
        let mut entities = vec![
            entity_at(0, DVec3::ZERO),
            entity_at(1, DVec3::new(1.0, 1.0, 1.0)),
            entity_at(2, DVec3::new(25.0, 0.0, 0.0)),
        ];
        entities[1].deactivate();

        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(&entities);
        assert_eq!(grid.entity_count(), 2);
        assert_eq!(grid.cell_count(), 2);

        grid.rebuild(&entities[..1]);
        assert_eq!(grid.entity_count(), 1);
    }

    #[test]
    fn test_neighbors_chebyshev_reach() {
        let entities = vec![
            entity_at(0, DVec3::new(1.0, 1.0, 1.0)),
            entity_at(1, DVec3::new(11.0, 1.0, 1.0)),
            entity_at(2, DVec3::new(21.0, 1.0, 1.0)),
            entity_at(3, DVec3::new(-9.0, -9.0, -9.0)),
        ];
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(&entities);

        let mut near = grid.neighbors(DVec3::new(1.0, 1.0, 1.0), 5.0);
        near.sort();
        assert_eq!(near, vec![0, 1, 3]);

        let mut wide = grid.neighbors(DVec3::new(1.0, 1.0, 1.0), 15.0);
        wide.sort();
        assert_eq!(wide, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_sparse_and_dense_scans_agree() {
        let mut grid = SpatialGrid::new(1.0);
        for i in 0..50 {
            let t = i as f64;
            grid.insert(i, DVec3::new(t * 0.7 - 15.0, (t * 1.3) % 9.0, -t * 0.4));
        }
        let center = DVec3::new(-3.0, 2.0, -4.0);
        // reach 1 scans 27 offsets; reach 4 scans 729 and walks occupied cells
        let mut small = grid.neighbors(center, 1.0);
        let mut large = grid.neighbors(center, 4.0);
        small.sort();
        large.sort();
        assert!(small.iter().all(|index| large.contains(index)));
    }

    #[test]
    fn test_huge_radius_returns_everything() {
        let entities = vec![
            entity_at(0, DVec3::ZERO),
            entity_at(1, DVec3::splat(1e6)),
            entity_at(2, DVec3::splat(-1e6)),
        ];
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(&entities);

        for radius in [1e20, f64::MAX, f64::INFINITY] {
            let mut all = grid.neighbors(DVec3::ZERO, radius);
            all.sort();
            assert_eq!(all, vec![0, 1, 2], "radius {radius}");
        }
        assert!(grid.neighbors(DVec3::ZERO, f64::NAN).contains(&0));
    }

    #[test]
    fn test_extreme_coordinates_saturate_cleanly() {
        let far = CellKey::new(i64::MAX, i64::MAX, i64::MAX);
        let near = CellKey::new(i64::MIN, 0, 0);
        assert_eq!(far.distance(near), u64::MAX);

        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(&[entity_at(0, DVec3::splat(1e300))]);
        assert!(grid.neighbors(DVec3::splat(-1e300), 5.0).is_empty());
        assert_eq!(grid.neighbors(DVec3::splat(1e300), 5.0), vec![0]);
        assert_eq!(grid.neighbors(DVec3::splat(-1e300), f64::INFINITY), vec![0]);
    }
}
