pub mod config;
pub mod entity;
pub mod error;
pub mod generation;
pub mod physics;
pub mod rng;
pub mod simulation;
pub mod snapshot;
pub mod spatial;

pub use config::SimulationConfig;
pub use entity::{Entity, EntityId, Group, Role};
pub use error::{ConfigError, RngError, SimulationError};
pub use generation::{generate, GenerationConfig, Population};
pub use rng::{Generator, Mulberry32};
pub use simulation::{PhysicsPipeline, PhysicsSettings, SimulationState, TickSummary};
pub use snapshot::WorldSnapshot;
