//! Run configuration loaded from YAML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generation::GenerationConfig;
use crate::physics::boundary::WorldBounds;
use crate::rng::StreamOptions;
use crate::simulation::PhysicsSettings;
use crate::spatial::SpatialConfig;

fn default_name() -> String {
    "protozoa".to_string()
}

fn default_dt() -> f64 {
    1.0 / 60.0
}

fn default_ticks() -> u64 {
    600
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Block nonce. Negative values are reduced modulo 2^32.
    #[serde(default)]
    pub seed: i64,
    /// Time step hint for drivers; the core takes `dt` per tick.
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub physics: PhysicsSettings,
    #[serde(default)]
    pub bounds: WorldBounds,
    #[serde(default)]
    pub spatial: SpatialConfig,
    /// `initial_seed` is ignored here; streams always derive from `seed`.
    #[serde(default)]
    pub streams: StreamOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            seed: 0,
            dt: default_dt(),
            ticks: default_ticks(),
            generation: GenerationConfig::default(),
            physics: PhysicsSettings::default(),
            bounds: WorldBounds::default(),
            spatial: SpatialConfig::default(),
            streams: StreamOptions::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn seed_u32(&self) -> u32 {
        self.seed as u32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(value: f64) -> bool {
            value.is_finite() && value > 0.0
        }

        if !positive(self.dt) {
            return Err(ConfigError::Validation(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if !positive(self.spatial.cell_size) {
            return Err(ConfigError::Validation(format!(
                "spatial.cell_size must be positive, got {}",
                self.spatial.cell_size
            )));
        }
        if !positive(self.generation.spawn_radius) {
            return Err(ConfigError::Validation(format!(
                "generation.spawn_radius must be positive, got {}",
                self.generation.spawn_radius
            )));
        }
        if self.generation.velocity_jitter < 0.0 {
            return Err(ConfigError::Validation(
                "generation.velocity_jitter cannot be negative".into(),
            ));
        }

        let physics = &self.physics;
        if !positive(physics.max_velocity) {
            return Err(ConfigError::Validation(format!(
                "physics.max_velocity must be positive, got {}",
                physics.max_velocity
            )));
        }
        if !(0.0..=1.0).contains(&physics.restitution) {
            return Err(ConfigError::Validation(format!(
                "physics.restitution must lie in [0, 1], got {}",
                physics.restitution
            )));
        }
        if physics.viscosity < 0.0 {
            return Err(ConfigError::Validation(
                "physics.viscosity cannot be negative".into(),
            ));
        }
        if physics.energy_decay_rate < 0.0 {
            return Err(ConfigError::Validation(
                "physics.energy_decay_rate cannot be negative".into(),
            ));
        }

        if !self.bounds.min.cmplt(self.bounds.max).all() {
            return Err(ConfigError::Validation(format!(
                "bounds.min {} must be below bounds.max {} on every axis",
                self.bounds.min, self.bounds.max
            )));
        }
        if !(0.0..=1.0).contains(&self.bounds.restitution) {
            return Err(ConfigError::Validation(format!(
                "bounds.restitution must lie in [0, 1], got {}",
                self.bounds.restitution
            )));
        }
        if self.streams.max_cached == 0 {
            return Err(ConfigError::Validation(
                "streams.max_cached must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
