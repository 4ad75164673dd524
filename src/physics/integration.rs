use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Advances one entity's kinematic state by `dt`.
///
/// Passes that rewrite velocity after integration report it through
/// [`Integrator::velocity_changed`] so position-based schemes can keep their
/// history consistent.
pub trait Integrator {
    fn method(&self) -> IntegrationMethod;

    fn integrate(&self, entity: &mut Entity, dt: f64);

    /// Multiply the entity's velocity by `factor`.
    fn scale_velocity(&self, entity: &mut Entity, factor: f64) {
        entity.velocity *= factor;
    }

    /// Called after something other than the integrator overwrote velocity
    /// or position.
    fn velocity_changed(&self, _entity: &mut Entity, _dt: f64) {}
}

/// Semi-implicit Euler: velocity first, then position with the new velocity.
#[derive(Debug, Default, Clone, Copy)]
pub struct EulerIntegrator;

impl Integrator for EulerIntegrator {
    fn method(&self) -> IntegrationMethod {
        IntegrationMethod::Euler
    }

    fn integrate(&self, entity: &mut Entity, dt: f64) {
        entity.velocity += entity.acceleration * dt;
        entity.position += entity.velocity * dt;
    }
}

/// Position Verlet. Velocity is a central-difference estimate over the two
/// steps, `(p_new - p_old) / 2dt`, and is not fed back into the update.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerletIntegrator;

impl Integrator for VerletIntegrator {
    fn method(&self) -> IntegrationMethod {
        IntegrationMethod::Verlet
    }

    fn integrate(&self, entity: &mut Entity, dt: f64) {
        let current = entity.position;
        let next = 2.0 * current - entity.old_position + entity.acceleration * (dt * dt);
        entity.velocity = (next - entity.old_position) / (2.0 * dt);
        entity.old_position = current;
        entity.position = next;
    }

    /// Shrinks the implied step `p - p_old` along with the velocity.
    fn scale_velocity(&self, entity: &mut Entity, factor: f64) {
        entity.velocity *= factor;
        let step = entity.position - entity.old_position;
        entity.old_position = entity.position - step * factor;
    }

    fn velocity_changed(&self, entity: &mut Entity, dt: f64) {
        entity.old_position = entity.position - entity.velocity * dt;
    }
}

/// One method per run; entities never switch between them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    Euler,
    #[default]
    Verlet,
}

impl IntegrationMethod {
    pub fn integrator(self) -> Box<dyn Integrator> {
        match self {
            IntegrationMethod::Euler => Box::new(EulerIntegrator),
            IntegrationMethod::Verlet => Box::new(VerletIntegrator),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntegrationMethod::Euler => "euler",
            IntegrationMethod::Verlet => "verlet",
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "euler" => Ok(IntegrationMethod::Euler),
            "verlet" => Ok(IntegrationMethod::Verlet),
            other => Err(format!("unknown integration method '{other}'")),
        }
    }
}

/// Align every entity's previous position with its current one. Must run
/// once before the first Verlet step.
pub fn initialize_verlet(entities: &mut [Entity]) {
    for entity in entities {
        entity.old_position = entity.position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, Role};
    use glam::DVec3;

    fn approx_eq(a: DVec3, b: DVec3, eps: f64) -> bool {
        (a - b).abs().max_element() <= eps
    }

    fn entity_at(position: DVec3) -> Entity {
        Entity::new(EntityId::new(0), "g", Role::Core, position)
    }

    #[test]
    fn test_euler_worked_example() {
        let mut entity = entity_at(DVec3::new(1.0, 2.0, 3.0));
        entity.velocity = DVec3::new(1.0, 0.0, -1.0);
        entity.acceleration = DVec3::new(0.0, -9.8, 0.0);

        EulerIntegrator.integrate(&mut entity, 1.0);

        assert!(approx_eq(entity.velocity, DVec3::new(1.0, -9.8, -1.0), 1e-9));
        assert!(approx_eq(entity.position, DVec3::new(2.0, -7.8, 2.0), 1e-9));
    }

    #[test]
    fn test_verlet_worked_example() {
        let mut entity = entity_at(DVec3::new(1.0, 2.0, 3.0));
        entity.old_position = DVec3::new(0.0, 1.0, 2.0);
        entity.acceleration = DVec3::new(0.0, -9.8, 0.0);

        VerletIntegrator.integrate(&mut entity, 1.0);

        assert!(approx_eq(entity.position, DVec3::new(2.0, -6.8, 4.0), 1e-9));
        assert_eq!(entity.old_position, DVec3::new(1.0, 2.0, 3.0));
        assert!(approx_eq(entity.velocity, DVec3::new(1.0, -3.9, 1.0), 1e-9));
    }

    #[test]
    fn test_verlet_scale_velocity_scales_step() {
        let mut entity = entity_at(DVec3::new(2.0, 0.0, 0.0));
        entity.old_position = DVec3::new(1.0, 0.0, 0.0);
        entity.velocity = DVec3::new(10.0, 0.0, 0.0);

        VerletIntegrator.scale_velocity(&mut entity, 0.5);

        assert_eq!(entity.velocity, DVec3::new(5.0, 0.0, 0.0));
        assert!(approx_eq(entity.old_position, DVec3::new(1.5, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn test_velocity_changed_rewrites_history() {
        let mut entity = entity_at(DVec3::new(0.0, 5.0, 0.0));
        entity.velocity = DVec3::new(0.0, 2.0, 0.0);
        VerletIntegrator.velocity_changed(&mut entity, 0.5);
        assert_eq!(entity.old_position, DVec3::new(0.0, 4.0, 0.0));

        let before = entity.old_position;
        EulerIntegrator.velocity_changed(&mut entity, 0.5);
        assert_eq!(entity.old_position, before);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("Euler".parse::<IntegrationMethod>(), Ok(IntegrationMethod::Euler));
        assert_eq!("verlet".parse::<IntegrationMethod>(), Ok(IntegrationMethod::Verlet));
        assert!("rk4".parse::<IntegrationMethod>().is_err());
        assert_eq!(IntegrationMethod::default().integrator().method(), IntegrationMethod::Verlet);
    }

    #[test]
    fn test_initialize_verlet() {
        let mut entities = vec![entity_at(DVec3::ONE), entity_at(DVec3::NEG_ONE)];
        entities[0].old_position = DVec3::ZERO;
        initialize_verlet(&mut entities);
        assert!(entities.iter().all(|e| e.old_position == e.position));
    }
}
