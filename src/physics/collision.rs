use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::spatial::SpatialGrid;

/// Below this separation two entities are treated as coincident.
const COINCIDENT_EPSILON: f64 = 1e-12;

/// How the collision pass finds candidate pairs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionMode {
    Off,
    /// Every unordered pair of active entities.
    #[default]
    AllPairs,
    /// Candidate pairs from the uniform grid.
    Grid,
}

/// Resolves contact between two overlapping entities.
pub trait CollisionResolver {
    /// Returns true if the pair was in contact and its state changed.
    fn resolve(&self, a: &mut Entity, b: &mut Entity) -> bool;
}

/// Impulse response along the contact normal followed by positional
/// separation weighted by inverse mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseResolver {
    pub restitution: f64,
}

impl ImpulseResolver {
    pub const DEFAULT_RESTITUTION: f64 = 0.8;

    pub fn new(restitution: f64) -> Self {
        Self { restitution }
    }
}

impl Default for ImpulseResolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RESTITUTION)
    }
}

impl CollisionResolver for ImpulseResolver {
    fn resolve(&self, a: &mut Entity, b: &mut Entity) -> bool {
        let delta = b.position - a.position;
        let min_distance = a.radius() + b.radius();
        let distance_sq = delta.length_squared();
        if distance_sq >= min_distance * min_distance {
            return false;
        }

        let distance = distance_sq.sqrt();
        let normal = if distance > COINCIDENT_EPSILON {
            delta / distance
        } else {
            DVec3::Y
        };

        let approach = (b.velocity - a.velocity).dot(normal);
        if approach > 0.0 {
            return false;
        }

        let inv_a = a.inverse_mass();
        let inv_b = b.inverse_mass();
        let inv_total = inv_a + inv_b;

        let impulse = -(1.0 + self.restitution) * approach / inv_total;
        a.velocity -= normal * (impulse * inv_a);
        b.velocity += normal * (impulse * inv_b);

        let overlap = min_distance - distance;
        a.position -= normal * (overlap * inv_a / inv_total);
        b.position += normal * (overlap * inv_b / inv_total);
        true
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollisionReport {
    pub pairs_tested: usize,
    /// Slice indices of every pair that touched, in resolution order.
    pub contacts: Vec<(usize, usize)>,
}

impl CollisionReport {
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }
}

/// Mutable references to two distinct entities, `i < j`.
fn pair_mut(entities: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    let (head, tail) = entities.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

fn resolve_pair(
    entities: &mut [Entity],
    i: usize,
    j: usize,
    resolver: &dyn CollisionResolver,
    report: &mut CollisionReport,
) {
    let (a, b) = pair_mut(entities, i, j);
    if !a.is_active() || !b.is_active() {
        return;
    }
    report.pairs_tested += 1;
    if resolver.resolve(a, b) {
        report.contacts.push((i, j));
    }
}

/// O(n²) pass over every unordered pair of active entities, in index order.
pub fn resolve_all_pairs(
    entities: &mut [Entity],
    resolver: &dyn CollisionResolver,
) -> CollisionReport {
    let mut report = CollisionReport::default();
    for i in 0..entities.len() {
        if !entities[i].is_active() {
            continue;
        }
        for j in (i + 1)..entities.len() {
            resolve_pair(entities, i, j, resolver, &mut report);
        }
    }
    report
}

/// Same pair order as [`resolve_all_pairs`], restricted to grid candidates.
/// `grid` must have been rebuilt from `entities` this tick.
pub fn resolve_with_grid(
    entities: &mut [Entity],
    grid: &SpatialGrid,
    resolver: &dyn CollisionResolver,
) -> CollisionReport {
    let max_radius = entities
        .iter()
        .filter(|entity| entity.is_active())
        .map(Entity::radius)
        .fold(0.0, f64::max);

    let mut report = CollisionReport::default();
    for i in 0..entities.len() {
        if !entities[i].is_active() {
            continue;
        }
        let reach = entities[i].radius() + max_radius;
        let mut candidates = grid.neighbors(entities[i].position, reach);
        candidates.retain(|&j| j > i && j < entities.len());
        candidates.sort_unstable();
        candidates.dedup();
        for j in candidates {
            resolve_pair(entities, i, j, resolver, &mut report);
        }
    }
    report
}
