//! Per-entity kinematics and the force, boundary and collision passes that
//! run around it each tick.

pub mod boundary;
pub mod collision;
pub mod forces;
pub mod integration;

pub use boundary::{BoundaryOutcome, BoundaryPolicy, WorldBounds};
pub use collision::{CollisionMode, CollisionReport, CollisionResolver, ImpulseResolver};
pub use integration::{
    initialize_verlet, EulerIntegrator, IntegrationMethod, Integrator, VerletIntegrator,
};
