/*
 * Fish School Simulation - Module Definitions
 *
 * This file defines the module structure of the flocking core: the boid
 * rules, the uniform-grid flock index, the per-frame driver and the
 * obstacle interface the host supplies. Nothing in here depends on the
 * renderer; the viewer binary lives in main.rs and its sibling modules.
 */

// Re-export key components for easier access
pub use boid::{Avoidance, Boid, Neighbor};
pub use debug::StepStats;
pub use error::ConfigError;
pub use flock_index::FlockIndex;
pub use obstacle::{BoundingSphere, RayHit, Raycast, SphereRaycaster};
pub use params::{BoidConfig, Bounds, SimulationParams};
pub use physics::{FishAttributes, InstanceTransform, Simulation};

// Vector type used across the public API
pub use glam::Vec3;

// Define modules
pub mod boid;
pub mod debug;
pub mod error;
pub mod flock_index;
pub mod obstacle;
pub mod params;
pub mod physics;
