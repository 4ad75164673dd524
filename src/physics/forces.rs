use glam::DVec3;

use crate::entity::Entity;

/// Uniform gravity along y. Mass cancels, so this is an acceleration.
pub fn gravity_acceleration(gravity: f64) -> DVec3 {
    DVec3::new(0.0, gravity, 0.0)
}

/// `a += F / m`, with the mass floored.
pub fn apply_force(entity: &mut Entity, force: DVec3) {
    entity.acceleration += force * entity.inverse_mass();
}

/// Per-tick drag multiplier `1 - viscosity * dt`. Not clamped; viscosity
/// large enough to make this negative is a configuration error.
pub fn viscosity_factor(viscosity: f64, dt: f64) -> f64 {
    1.0 - viscosity * dt
}

/// Rescale `velocity` to `max_speed` if it is faster. Returns whether it did.
pub fn clamp_velocity(velocity: &mut DVec3, max_speed: f64) -> bool {
    let speed_sq = velocity.length_squared();
    if speed_sq <= max_speed * max_speed {
        return false;
    }
    *velocity *= max_speed / speed_sq.sqrt();
    true
}

/// Advance lifetime and linear energy decay. Returns true if the entity ran
/// out of energy during this update.
pub fn update_lifecycle(entity: &mut Entity, dt: f64, decay_rate: f64) -> bool {
    if !entity.is_active() {
        return false;
    }
    entity.drain_energy(dt, decay_rate)
}
