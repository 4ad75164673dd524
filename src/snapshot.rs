//! Read-only serialisable views of simulation state.

use glam::DVec3;
use serde::Serialize;

use crate::entity::{Color, Entity, Group, Role};
use crate::simulation::SimulationState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: u64,
    pub role: Role,
    pub group_id: String,
    pub position: DVec3,
    pub velocity: DVec3,
    pub energy: f64,
    pub active: bool,
    pub color: Color,
    pub interaction_radius: f64,
    pub force_field_influence: f64,
}

impl From<&Entity> for EntitySnapshot {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id().raw(),
            role: entity.role(),
            group_id: entity.group_id().to_string(),
            position: entity.position,
            velocity: entity.velocity,
            energy: entity.energy(),
            active: entity.is_active(),
            color: entity.visual.color,
            interaction_radius: entity.interaction_radius,
            force_field_influence: entity.force_field_influence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub seed: u32,
    pub tick: u64,
    pub elapsed: f64,
    pub active_count: usize,
    pub total_energy: f64,
    pub groups: Vec<Group>,
    pub entities: Vec<EntitySnapshot>,
}

impl WorldSnapshot {
    pub fn capture(state: &SimulationState) -> Self {
        Self {
            seed: state.seed(),
            tick: state.current_tick(),
            elapsed: state.elapsed(),
            active_count: state.active_count(),
            total_energy: state.total_energy(),
            groups: state.groups().to_vec(),
            entities: state.entities().iter().map(EntitySnapshot::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
