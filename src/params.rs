/*
 * Simulation Parameters Module
 *
 * This module defines the configuration for a fish school: the swim volume
 * (`Bounds`), the per-fish tuning shared across a flock (`BoidConfig`) and
 * the top-level `SimulationParams` that the viewer and tests build a
 * `Simulation` from. Everything is validated once, at construction.
 */

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Swim volume, centered on the origin on every axis
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32, depth: f32) -> Self {
        Self { width, height, depth }
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    #[inline]
    pub fn half_height(&self) -> f32 {
        self.height / 2.0
    }

    #[inline]
    pub fn half_depth(&self) -> f32 {
        self.depth / 2.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("bounds.width", self.width),
            ("bounds.height", self.height),
            ("bounds.depth", self.depth),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(field, format!("must be a positive number, got {}", value)));
            }
        }
        Ok(())
    }
}

impl Default for Bounds {
    fn default() -> Self {
        // Underwater environment swim volume
        Self::new(400.0, 100.0, 180.0)
    }
}

/// Per-fish tuning. Shared by every member of a flock and never mutated
/// after the flock is spawned.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoidConfig {
    /// Floor of the swim volume; fish bounce off it.
    pub min_height: f32,
    /// Visual body length, used by the renderer only.
    pub body_size: f32,
    pub max_speed: f32,
    pub max_force: f32,
    /// Neighbor radius. Also the cell size of the flock index.
    pub perception_radius: f32,
    /// Separation kicks in below twice this distance.
    pub collision_radius: f32,
    /// Strength of the inverse-square push between crowded fish.
    pub avoidance_weight: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
}

impl Default for BoidConfig {
    fn default() -> Self {
        Self {
            min_height: 2.0,
            body_size: 1.5,
            max_speed: 0.3,
            max_force: 0.01,
            perception_radius: 15.0,
            collision_radius: 5.0,
            avoidance_weight: 2.5,
            separation_weight: 4.0,
            alignment_weight: 0.3,
            cohesion_weight: 0.1,
        }
    }
}

impl BoidConfig {
    pub fn validate(&self, bounds: &Bounds) -> Result<(), ConfigError> {
        let fields = [
            ("boid.min_height", self.min_height),
            ("boid.body_size", self.body_size),
            ("boid.max_speed", self.max_speed),
            ("boid.max_force", self.max_force),
            ("boid.perception_radius", self.perception_radius),
            ("boid.collision_radius", self.collision_radius),
            ("boid.avoidance_weight", self.avoidance_weight),
            ("boid.separation_weight", self.separation_weight),
            ("boid.alignment_weight", self.alignment_weight),
            ("boid.cohesion_weight", self.cohesion_weight),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, format!("must be finite, got {}", value)));
            }
        }

        for (field, value) in [
            ("boid.max_speed", self.max_speed),
            ("boid.perception_radius", self.perception_radius),
            ("boid.body_size", self.body_size),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::invalid(field, format!("must be positive, got {}", value)));
            }
        }

        // min_height is a coordinate and may be negative; everything else is a magnitude
        for &(field, value) in &fields[3..] {
            if value < 0.0 {
                return Err(ConfigError::invalid(field, format!("must not be negative, got {}", value)));
            }
        }

        // The flock index only covers [-h/2, h/2] vertically
        if self.min_height < -bounds.half_height() {
            return Err(ConfigError::invalid(
                "boid.min_height",
                format!(
                    "must not be below the bottom of the swim volume ({}), got {}",
                    -bounds.half_height(),
                    self.min_height
                ),
            ));
        }

        if self.min_height >= bounds.half_height() {
            return Err(ConfigError::invalid(
                "boid.min_height",
                format!(
                    "must be below the top of the swim volume ({}), got {}",
                    bounds.half_height(),
                    self.min_height
                ),
            ));
        }

        Ok(())
    }
}

// Parameters for the simulation that can be adjusted via config file or UI
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub fish_count: usize,
    pub bounds: Bounds,
    pub boid: BoidConfig,
    /// Seed for spawning and obstacle probing. `None` picks one at random.
    pub seed: Option<u64>,
    pub enable_parallel: bool,
    /// Simulation ticks per second in the viewer, independent of render rate.
    pub fixed_physics_fps: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            fish_count: 500,
            bounds: Bounds::default(),
            boid: BoidConfig::default(),
            seed: None,
            enable_parallel: true,
            fixed_physics_fps: 60.0,
        }
    }
}

impl SimulationParams {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: SimulationParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fish_count == 0 {
            return Err(ConfigError::invalid("fish_count", "a flock needs at least one fish"));
        }
        if !self.fixed_physics_fps.is_finite() || self.fixed_physics_fps <= 0.0 {
            return Err(ConfigError::invalid(
                "fixed_physics_fps",
                format!("must be positive, got {}", self.fixed_physics_fps),
            ));
        }
        self.bounds.validate()?;
        self.boid.validate(&self.bounds)
    }

    // Get parameter ranges for UI sliders
    pub fn fish_count_range() -> RangeInclusive<usize> {
        1..=5000
    }

    pub fn max_speed_range() -> RangeInclusive<f32> {
        0.05..=2.0
    }

    pub fn max_force_range() -> RangeInclusive<f32> {
        0.001..=0.1
    }

    pub fn weight_range() -> RangeInclusive<f32> {
        0.0..=5.0
    }

    pub fn radius_range() -> RangeInclusive<f32> {
        1.0..=50.0
    }

    pub fn physics_fps_range() -> RangeInclusive<f32> {
        10.0..=240.0
    }
}
