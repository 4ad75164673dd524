use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Distance from a face at which [`containment_force`] starts pushing back.
pub const CONTAINMENT_THRESHOLD: f64 = 10.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoundaryPolicy {
    /// Teleport to the opposite face.
    Wrap,
    /// Clamp to the face and reflect the outward velocity component.
    #[default]
    Bounce,
    /// Deactivate on exit.
    Destroy,
}

fn default_min() -> DVec3 {
    DVec3::splat(-50.0)
}

fn default_max() -> DVec3 {
    DVec3::splat(50.0)
}

fn default_bounce_restitution() -> f64 {
    1.0
}

/// Axis-aligned world box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    #[serde(default = "default_min")]
    pub min: DVec3,
    #[serde(default = "default_max")]
    pub max: DVec3,
    #[serde(default)]
    pub policy: BoundaryPolicy,
    /// Fraction of the outward speed kept by a bounce.
    #[serde(default = "default_bounce_restitution")]
    pub restitution: f64,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
            policy: BoundaryPolicy::default(),
            restitution: default_bounce_restitution(),
        }
    }
}

impl WorldBounds {
    pub fn new(min: DVec3, max: DVec3, policy: BoundaryPolicy) -> Self {
        Self {
            min,
            max,
            policy,
            restitution: default_bounce_restitution(),
        }
    }

    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOutcome {
    Inside,
    Wrapped,
    Bounced,
    Destroyed,
}

impl BoundaryOutcome {
    /// True when position or velocity was rewritten.
    pub fn moved(self) -> bool {
        matches!(self, BoundaryOutcome::Wrapped | BoundaryOutcome::Bounced)
    }
}

/// Apply the bounds' policy to one entity. Inactive entities are left alone.
pub fn apply_boundary(entity: &mut Entity, bounds: &WorldBounds) -> BoundaryOutcome {
    if !entity.is_active() || bounds.contains(entity.position) {
        return BoundaryOutcome::Inside;
    }

    match bounds.policy {
        BoundaryPolicy::Wrap => {
            for axis in 0..3 {
                if entity.position[axis] < bounds.min[axis] {
                    entity.position[axis] = bounds.max[axis];
                } else if entity.position[axis] > bounds.max[axis] {
                    entity.position[axis] = bounds.min[axis];
                }
            }
            BoundaryOutcome::Wrapped
        }
        BoundaryPolicy::Bounce => {
            for axis in 0..3 {
                if entity.position[axis] < bounds.min[axis] {
                    entity.position[axis] = bounds.min[axis];
                    entity.velocity[axis] = entity.velocity[axis].abs() * bounds.restitution;
                } else if entity.position[axis] > bounds.max[axis] {
                    entity.position[axis] = bounds.max[axis];
                    entity.velocity[axis] = -entity.velocity[axis].abs() * bounds.restitution;
                }
            }
            BoundaryOutcome::Bounced
        }
        BoundaryPolicy::Destroy => {
            entity.deactivate();
            BoundaryOutcome::Destroyed
        }
    }
}

/// Inclusive on every face.
pub fn is_within_bounds(entity: &Entity, bounds: &WorldBounds) -> bool {
    bounds.contains(entity.position)
}

/// Distance to the nearest face; negative once outside on that axis.
pub fn distance_to_boundary(entity: &Entity, bounds: &WorldBounds) -> f64 {
    let to_min = entity.position - bounds.min;
    let to_max = bounds.max - entity.position;
    to_min.min(to_max).min_element()
}

/// Soft push away from any face closer than [`CONTAINMENT_THRESHOLD`],
/// ramping linearly from zero at the threshold to `strength` at the face.
pub fn containment_force(entity: &Entity, bounds: &WorldBounds, strength: f64) -> DVec3 {
    let mut force = DVec3::ZERO;
    for axis in 0..3 {
        let to_min = entity.position[axis] - bounds.min[axis];
        let to_max = bounds.max[axis] - entity.position[axis];
        if to_min < CONTAINMENT_THRESHOLD {
            force[axis] += strength * (1.0 - to_min / CONTAINMENT_THRESHOLD);
        }
        if to_max < CONTAINMENT_THRESHOLD {
            force[axis] -= strength * (1.0 - to_max / CONTAINMENT_THRESHOLD);
        }
    }
    force
}
