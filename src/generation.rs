//! Seeded population generation.
//!
//! One generator, seeded with the block nonce, drives the whole run. Draw
//! order:
//!
//! 1. group colours, three draws per role in [`Role::ALL`] order;
//! 2. per group, one bonus-count draw;
//! 3. per entity, three sphere-sampling draws, then three jitter draws when
//!    `velocity_jitter > 0`.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{Color, Entity, EntityId, Group, Role, RoleTable};
use crate::rng::helpers::{random_float, random_int, random_position_in_sphere};
use crate::rng::{Generator, Mulberry32};

fn default_base_count() -> usize {
    40
}

fn default_spawn_radius() -> f64 {
    10.0
}

fn default_initial_energy() -> f64 {
    Entity::INITIAL_ENERGY
}

fn default_interaction_radius() -> f64 {
    Entity::INTERACTION_RADIUS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_base_count")]
    pub base_count_per_role: usize,
    /// Each group gets `random_int(0, bonus_count_max + 1)` extra entities.
    #[serde(default)]
    pub bonus_count_max: usize,
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f64,
    /// Half-width of the uniform initial velocity draw per axis.
    #[serde(default)]
    pub velocity_jitter: f64,
    #[serde(default = "default_initial_energy")]
    pub initial_energy: f64,
    #[serde(default = "default_interaction_radius")]
    pub interaction_radius: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_count_per_role: default_base_count(),
            bonus_count_max: 0,
            spawn_radius: default_spawn_radius(),
            velocity_jitter: 0.0,
            initial_energy: default_initial_energy(),
            interaction_radius: default_interaction_radius(),
        }
    }
}

/// Output of [`generate`]: groups in role order and entities in id order.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    pub groups: Vec<Group>,
    pub entities: Vec<Entity>,
}

impl Population {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn positions(&self) -> Vec<DVec3> {
        self.entities.iter().map(|entity| entity.position).collect()
    }
}

pub fn group_id(role: Role, index: usize) -> String {
    format!("group_{}_{}", role.as_str(), index)
}

/// Build the population for `seed`. Identical seeds give identical output.
pub fn generate(seed: u32, config: &GenerationConfig) -> Population {
    let mut rng = Mulberry32::new(seed);

    let mut colors = RoleTable::new([Color::WHITE; Role::COUNT]);
    for role in Role::ALL {
        colors[role] = Color::new(rng.next_f64(), rng.next_f64(), rng.next_f64());
    }

    let mut groups = Vec::with_capacity(Role::COUNT);
    let mut entities = Vec::new();

    for (index, (role, &color)) in colors.iter().enumerate() {
        let bonus = random_int(&mut rng, 0, config.bonus_count_max as i64 + 1);
        let count = config.base_count_per_role + bonus.max(0) as usize;
        let id = group_id(role, index);

        for _ in 0..count {
            let position = random_position_in_sphere(&mut rng, config.spawn_radius);
            let mut entity = Entity::new(EntityId::new(entities.len() as u64), &id, role, position);
            entity.visual.color = color;
            entity.set_energy(config.initial_energy);
            entity.interaction_radius = config.interaction_radius;
            if config.velocity_jitter > 0.0 {
                entity.velocity = jitter(&mut rng, config.velocity_jitter);
            }
            entities.push(entity);
        }

        groups.push(Group {
            id,
            role,
            color,
            entity_count: count,
        });
    }

    debug!(
        seed,
        groups = groups.len(),
        entities = entities.len(),
        "generated population"
    );

    Population { groups, entities }
}

fn jitter<G: Generator>(rng: &mut G, amount: f64) -> DVec3 {
    DVec3::new(
        random_float(rng, -amount, amount),
        random_float(rng, -amount, amount),
        random_float(rng, -amount, amount),
    )
}
