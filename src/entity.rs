use std::fmt;
use std::ops::{Index, IndexMut};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Floor applied wherever a degenerate mass would otherwise be divided by.
pub const MIN_MASS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Entities live in a contiguous arena, so the id doubles as the index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Core,
    Control,
    Movement,
    Defense,
    Attack,
}

impl Role {
    pub const COUNT: usize = 5;

    /// Declaration order. Generation walks roles in exactly this order.
    pub const ALL: [Role; Role::COUNT] = [
        Role::Core,
        Role::Control,
        Role::Movement,
        Role::Defense,
        Role::Attack,
    ];

    pub fn index(self) -> usize {
        match self {
            Role::Core => 0,
            Role::Control => 1,
            Role::Movement => 2,
            Role::Defense => 3,
            Role::Attack => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Core => "CORE",
            Role::Control => "CONTROL",
            Role::Movement => "MOVEMENT",
            Role::Defense => "DEFENSE",
            Role::Attack => "ATTACK",
        }
    }

    pub fn default_mass(self) -> f64 {
        ROLE_MASSES[self]
    }

    pub fn default_size(self) -> f64 {
        ROLE_SIZES[self]
    }

    pub fn default_trail_length(self) -> f64 {
        ROLE_TRAIL_LENGTHS[self]
    }

    pub fn default_color(self) -> Color {
        ROLE_COLORS[self]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per role, stored in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleTable<T>(pub [T; Role::COUNT]);

impl<T> RoleTable<T> {
    pub const fn new(values: [T; Role::COUNT]) -> Self {
        Self(values)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &T)> {
        Role::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Role> for RoleTable<T> {
    type Output = T;

    fn index(&self, role: Role) -> &T {
        &self.0[role.index()]
    }
}

impl<T> IndexMut<Role> for RoleTable<T> {
    fn index_mut(&mut self, role: Role) -> &mut T {
        &mut self.0[role.index()]
    }
}

const ROLE_MASSES: RoleTable<f64> = RoleTable::new([1.5, 1.2, 0.8, 1.3, 1.0]);
const ROLE_SIZES: RoleTable<f64> = RoleTable::new([1.0, 1.5, 2.0, 2.5, 3.0]);
const ROLE_TRAIL_LENGTHS: RoleTable<f64> = RoleTable::new([5.0, 8.0, 12.0, 3.0, 10.0]);
const ROLE_COLORS: RoleTable<Color> = RoleTable::new([
    Color::new(1.0, 0.8, 0.2),
    Color::new(0.2, 0.6, 1.0),
    Color::new(0.2, 0.8, 0.5),
    Color::new(0.4, 0.3, 0.8),
    Color::new(1.0, 0.2, 0.2),
]);

/// Linear colour with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

/// Renderer-only fields. Carried through untouched by the physics passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualPayload {
    pub color: Color,
    pub glow_intensity: f64,
    pub trail_length: f64,
    pub pulse_rate: f64,
    pub scale: f64,
}

impl Default for VisualPayload {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            glow_intensity: 0.0,
            trail_length: 0.0,
            pulse_rate: 0.0,
            scale: 1.0,
        }
    }
}

/// Baseline attributes shared by every entity of one role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: String,
    pub role: Role,
    pub color: Color,
    pub entity_count: usize,
}

/// A simulated point mass.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    group_id: String,
    role: Role,

    pub position: DVec3,
    /// Previous position, read only by Verlet integration.
    pub old_position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    mass: f64,
    /// Diameter; the collision radius is half of this.
    pub size: f64,

    pub visual: VisualPayload,

    energy: f64,
    lifetime: f64,
    /// Carried for consumers; no physics pass reads it.
    pub interaction_radius: f64,
    /// Carried for consumers; no physics pass reads it.
    pub force_field_influence: f64,
    active: bool,
}

impl Entity {
    pub const INITIAL_ENERGY: f64 = 100.0;
    pub const INTERACTION_RADIUS: f64 = 10.0;

    /// New entity at rest with the role's default mass and size.
    pub fn new(id: EntityId, group_id: impl Into<String>, role: Role, position: DVec3) -> Self {
        Self {
            id,
            group_id: group_id.into(),
            role,
            position,
            old_position: position,
            velocity: DVec3::ZERO,
            acceleration: DVec3::ZERO,
            mass: role.default_mass(),
            size: role.default_size(),
            visual: VisualPayload {
                color: role.default_color(),
                trail_length: role.default_trail_length(),
                ..VisualPayload::default()
            },
            energy: Self::INITIAL_ENERGY,
            lifetime: 0.0,
            interaction_radius: Self::INTERACTION_RADIUS,
            force_field_influence: 1.0,
            active: true,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f64) -> Result<(), SimulationError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimulationError::InvalidMass { id: self.id, mass });
        }
        self.mass = mass;
        Ok(())
    }

    /// `1 / mass`, with the mass floored at [`MIN_MASS`].
    pub fn inverse_mass(&self) -> f64 {
        1.0 / self.mass.max(MIN_MASS)
    }

    pub fn radius(&self) -> f64 {
        self.size * 0.5
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// External energy reset; negative values clamp to zero. Does not
    /// reactivate a dead entity.
    pub fn set_energy(&mut self, energy: f64) {
        self.energy = energy.max(0.0);
    }

    pub fn lifetime(&self) -> f64 {
        self.lifetime
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Permanent: no pass ever sets `active` back to true.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Age by `dt` and drain `decay_rate * dt` energy. Returns true when this
    /// call drained the last of it.
    pub(crate) fn drain_energy(&mut self, dt: f64, decay_rate: f64) -> bool {
        self.lifetime += dt;
        self.energy -= decay_rate * dt;
        if self.energy <= 0.0 {
            self.energy = 0.0;
            if self.active {
                self.active = false;
                return true;
            }
        }
        false
    }
}
