//! Simulation state and the per-tick physics pipeline.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::SimulationConfig;
use crate::entity::{Entity, EntityId, Group, Role};
use crate::error::SimulationError;
use crate::generation::{generate, Population};
use crate::physics::boundary::{apply_boundary, containment_force, BoundaryOutcome, WorldBounds};
use crate::physics::collision::{
    resolve_all_pairs, resolve_with_grid, CollisionMode, CollisionReport, CollisionResolver,
    ImpulseResolver,
};
use crate::physics::forces::{
    apply_force, clamp_velocity, gravity_acceleration, update_lifecycle, viscosity_factor,
};
use crate::physics::integration::{initialize_verlet, IntegrationMethod, Integrator};
use crate::rng::{StreamManager, StreamOptions};
use crate::snapshot::WorldSnapshot;
use crate::spatial::SpatialGrid;

fn default_gravity() -> f64 {
    -9.8
}

fn default_viscosity() -> f64 {
    0.05
}

fn default_max_velocity() -> f64 {
    100.0
}

fn default_restitution() -> f64 {
    ImpulseResolver::DEFAULT_RESTITUTION
}

fn default_energy_decay_rate() -> f64 {
    0.01
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSettings {
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    #[serde(default = "default_viscosity")]
    pub viscosity: f64,
    #[serde(default = "default_max_velocity")]
    pub max_velocity: f64,
    /// Entity-entity collision restitution.
    #[serde(default = "default_restitution")]
    pub restitution: f64,
    /// Energy lost per second by every active entity.
    #[serde(default = "default_energy_decay_rate")]
    pub energy_decay_rate: f64,
    #[serde(default)]
    pub method: IntegrationMethod,
    #[serde(default)]
    pub collisions: CollisionMode,
    /// Scale of the soft push away from the bounds. Zero disables it.
    #[serde(default)]
    pub containment_strength: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            viscosity: default_viscosity(),
            max_velocity: default_max_velocity(),
            restitution: default_restitution(),
            energy_decay_rate: default_energy_decay_rate(),
            method: IntegrationMethod::default(),
            collisions: CollisionMode::default(),
            containment_strength: 0.0,
        }
    }
}

/// What one tick did.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub elapsed: f64,
    pub paused: bool,
    pub integrated: usize,
    pub clamped: usize,
    pub boundary_hits: usize,
    pub destroyed: usize,
    pub depleted: usize,
    pub pairs_tested: usize,
    pub collisions: usize,
    pub active: usize,
}

/// Forces, integration, clamping, bounds and lifecycle per entity, followed
/// by one collision pass.
pub struct PhysicsPipeline {
    settings: PhysicsSettings,
    bounds: WorldBounds,
    integrator: Box<dyn Integrator>,
    resolver: Box<dyn CollisionResolver>,
    grid: SpatialGrid,
}

impl PhysicsPipeline {
    pub fn new(settings: PhysicsSettings, bounds: WorldBounds, cell_size: f64) -> Self {
        Self {
            integrator: settings.method.integrator(),
            resolver: Box::new(ImpulseResolver::new(settings.restitution)),
            grid: SpatialGrid::new(cell_size),
            settings,
            bounds,
        }
    }

    pub fn with_resolver(mut self, resolver: impl CollisionResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    pub fn method(&self) -> IntegrationMethod {
        self.integrator.method()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Advance `entities` by `dt`. Counters in the returned summary cover this
    /// step only; `tick`, `elapsed` and `paused` are left for the caller.
    pub fn step(&mut self, entities: &mut [Entity], dt: f64) -> TickSummary {
        let mut summary = TickSummary::default();
        let gravity = gravity_acceleration(self.settings.gravity);
        let damping = viscosity_factor(self.settings.viscosity, dt);
        let integrator = self.integrator.as_ref();

        for entity in entities.iter_mut() {
            if !entity.is_active() {
                continue;
            }
            summary.integrated += 1;

            entity.acceleration = gravity;
            if self.settings.containment_strength != 0.0 {
                let push =
                    containment_force(entity, &self.bounds, self.settings.containment_strength);
                apply_force(entity, push);
            }
            if self.settings.viscosity != 0.0 {
                integrator.scale_velocity(entity, damping);
            }

            integrator.integrate(entity, dt);

            if clamp_velocity(&mut entity.velocity, self.settings.max_velocity) {
                integrator.velocity_changed(entity, dt);
                summary.clamped += 1;
            }

            match apply_boundary(entity, &self.bounds) {
                BoundaryOutcome::Inside => {}
                BoundaryOutcome::Destroyed => summary.destroyed += 1,
                outcome => {
                    debug_assert!(outcome.moved());
                    integrator.velocity_changed(entity, dt);
                    summary.boundary_hits += 1;
                }
            }

            if update_lifecycle(entity, dt, self.settings.energy_decay_rate) {
                summary.depleted += 1;
            }
        }

        let report = self.collide(entities);
        for &(a, b) in &report.contacts {
            self.integrator.velocity_changed(&mut entities[a], dt);
            self.integrator.velocity_changed(&mut entities[b], dt);
        }
        summary.pairs_tested = report.pairs_tested;
        summary.collisions = report.contact_count();
        summary.active = entities.iter().filter(|entity| entity.is_active()).count();
        summary
    }

    fn collide(&mut self, entities: &mut [Entity]) -> CollisionReport {
        match self.settings.collisions {
            CollisionMode::Off => CollisionReport::default(),
            CollisionMode::AllPairs => resolve_all_pairs(entities, self.resolver.as_ref()),
            CollisionMode::Grid => {
                self.grid.rebuild(entities);
                resolve_with_grid(entities, &self.grid, self.resolver.as_ref())
            }
        }
    }
}

/// Everything one run owns: the population, the pipeline that moves it and
/// the seeded streams for any later randomness.
pub struct SimulationState {
    seed: u32,
    groups: Vec<Group>,
    entities: Vec<Entity>,
    pipeline: PhysicsPipeline,
    streams: StreamManager,
    tick: u64,
    elapsed: f64,
    paused: bool,
    verlet_ready: bool,
}

impl SimulationState {
    pub fn new(seed: u32, population: Population, pipeline: PhysicsPipeline) -> Self {
        Self {
            seed,
            groups: population.groups,
            entities: population.entities,
            pipeline,
            streams: StreamManager::with_seed(seed),
            tick: 0,
            elapsed: 0.0,
            paused: false,
            verlet_ready: false,
        }
    }

    /// Validate `config`, generate its population and wire up the pipeline.
    /// Verlet runs still need [`SimulationState::initialize_verlet`].
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let seed = config.seed_u32();
        let population = generate(seed, &config.generation);
        let pipeline = PhysicsPipeline::new(
            config.physics.clone(),
            config.bounds,
            config.spatial.cell_size,
        );

        let mut state = Self::new(seed, population, pipeline);
        state.streams = StreamManager::new(StreamOptions {
            initial_seed: seed,
            ..config.streams.clone()
        });
        debug!(
            scenario = %config.name,
            seed,
            entities = state.entities.len(),
            method = %state.pipeline.method(),
            "simulation state ready"
        );
        Ok(state)
    }

    /// Align previous positions with current ones. Required once before the
    /// first Verlet tick; harmless under Euler.
    pub fn initialize_verlet(&mut self) {
        initialize_verlet(&mut self.entities);
        self.verlet_ready = true;
    }

    pub fn tick(&mut self, dt: f64) -> Result<TickSummary, SimulationError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimulationError::InvalidTimeStep(dt));
        }
        if self.paused {
            return Ok(TickSummary {
                tick: self.tick,
                elapsed: self.elapsed,
                paused: true,
                active: self.active_count(),
                ..TickSummary::default()
            });
        }
        if self.pipeline.method() == IntegrationMethod::Verlet && !self.verlet_ready {
            return Err(SimulationError::VerletNotInitialized);
        }

        let mut summary = self.pipeline.step(&mut self.entities, dt);
        self.tick += 1;
        self.elapsed += dt;
        summary.tick = self.tick;
        summary.elapsed = self.elapsed;

        trace!(
            tick = summary.tick,
            active = summary.active,
            collisions = summary.collisions,
            destroyed = summary.destroyed,
            depleted = summary.depleted,
            "tick complete"
        );
        Ok(summary)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop every entity in place. Verlet history is re-aligned so the next
    /// step starts from rest.
    pub fn reset_motion(&mut self) {
        for entity in &mut self.entities {
            entity.velocity = DVec3::ZERO;
            entity.acceleration = DVec3::ZERO;
            entity.old_position = entity.position;
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn pipeline(&self) -> &PhysicsPipeline {
        &self.pipeline
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Ids are arena indices for generated populations; hand-built ones fall
    /// back to a scan.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        let index = self.index_of(id)?;
        self.entities.get(index)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let index = self.index_of(id)?;
        self.entities.get_mut(index)
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        match self.entities.get(id.index()) {
            Some(entity) if entity.id() == id => Some(id.index()),
            _ => self.entities.iter().position(|entity| entity.id() == id),
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Entities still taking part in the simulation.
    pub fn active_entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter().filter(|entity| entity.is_active())
    }

    /// Active entities of `role`.
    pub fn entities_by_role(&self, role: Role) -> impl Iterator<Item = &Entity> + '_ {
        self.active_entities()
            .filter(move |entity| entity.role() == role)
    }

    /// Active entities of one group.
    pub fn entities_by_group<'a>(
        &'a self,
        group_id: &'a str,
    ) -> impl Iterator<Item = &'a Entity> + 'a {
        self.active_entities()
            .filter(move |entity| entity.group_id() == group_id)
    }

    pub fn active_count(&self) -> usize {
        self.active_entities().count()
    }

    /// Summed over active entities only.
    pub fn total_energy(&self) -> f64 {
        self.active_entities().map(Entity::energy).sum()
    }

    pub fn streams(&mut self) -> &mut StreamManager {
        &mut self.streams
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self)
    }
}
