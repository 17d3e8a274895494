/*
 * Boid Module
 *
 * This module defines the Boid struct and its behavior.
 * Each fish follows three flocking rules plus obstacle avoidance:
 * 1. Separation: Push away from neighbors that come too close
 * 2. Alignment: Steer towards the average heading of neighbors
 * 3. Cohesion: Steer towards the average position of neighbors
 * 4. Avoidance: Probe ahead with rays and look for a clear heading
 *
 * A boid never sees the flock index; the driver hands it a neighbor list.
 */

use glam::Vec3;
use rand::Rng;

use crate::obstacle::{BoundingSphere, Raycast};
use crate::params::{BoidConfig, Bounds};

// Obstacle probing runs once every this many frames, staggered by index
pub const PROBE_INTERVAL: u64 = 5;

const SEPARATION_EPSILON: f32 = 1e-4;
const ESCAPE_PROBES: usize = 15;
const AVOIDANCE_FORCE_SCALE: f32 = 5.0;
const AVOIDANCE_BLEND: f32 = 0.25;
const SKIPPED_FRAME_DECAY: f32 = 0.98;
const CLEAR_AHEAD_DECAY: f32 = 0.9;
const AVOIDANCE_ACTIVE_SQ: f32 = 1e-4;
const FLOCKING_DAMPING: f32 = 0.1;
const WALL_BOUNCE: f32 = -0.5;

const CLUSTER_SIZE: usize = 10;

/// What another fish looks like to a boid computing its flocking forces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Result of one `avoid_obstacles` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Avoidance {
    /// Not this boid's probing frame; the previous force decayed.
    Skipped,
    /// Probed and nothing is ahead; the force decayed.
    Clear,
    /// Something is ahead and a free heading was found.
    Escaped,
    /// Something is ahead and every probe was blocked; pushing along the hit normal.
    BoxedIn,
}

#[derive(Clone, Debug)]
pub struct Boid {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub avoidance_force: Vec3,
    pub cruise_speed: f32,
    pub frame_count: u64,
    pub index: usize,
    pub config: BoidConfig,
    pub bounds: Bounds,
}

// Length-setting that stays at zero for zero-length input instead of producing NaN
#[inline]
fn with_length(v: Vec3, length: f32) -> Vec3 {
    v.normalize_or_zero() * length
}

impl Boid {
    pub fn new<R: Rng + ?Sized>(bounds: Bounds, index: usize, config: BoidConfig, rng: &mut R) -> Self {
        // Fish spawn in schools of ten around a hashed cluster center
        let cluster = (index / CLUSTER_SIZE) as f32;
        let cluster_x = (cluster * 12.9898).sin() * 0.5 * (bounds.width - 10.0);
        let cluster_z = (cluster * 78.233).cos() * 0.5 * (bounds.depth - 10.0);
        let cluster_y = config.min_height + cluster.sin().abs() * bounds.half_height();

        let position = Vec3::new(
            cluster_x + (rng.gen::<f32>() - 0.5) * 10.0,
            cluster_y + (rng.gen::<f32>() - 0.5) * 5.0,
            cluster_z + (rng.gen::<f32>() - 0.5) * 10.0,
        );

        // Individual preferred speed keeps the school from moving in lockstep
        let cruise_speed = config.max_speed * (0.2 + rng.gen::<f32>() * 0.8);

        // Mostly horizontal heading
        let heading = Vec3::new(
            rng.gen::<f32>() - 0.5,
            (rng.gen::<f32>() - 0.5) * 0.1,
            rng.gen::<f32>() - 0.5,
        );
        let velocity = with_length(heading, cruise_speed);

        let mut boid = Self::from_state(bounds, index, config, position, velocity, cruise_speed);
        boid.wrap_edges();
        boid
    }

    /// Build a boid with an explicit kinematic state. No wrapping is applied.
    pub fn from_state(
        bounds: Bounds,
        index: usize,
        config: BoidConfig,
        position: Vec3,
        velocity: Vec3,
        cruise_speed: f32,
    ) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vec3::ZERO,
            avoidance_force: Vec3::ZERO,
            cruise_speed,
            frame_count: 0,
            index,
            config,
            bounds,
        }
    }

    #[inline]
    pub fn as_neighbor(&self) -> Neighbor {
        Neighbor {
            position: self.position,
            velocity: self.velocity,
        }
    }

    // Apply a force to the boid
    #[inline]
    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force;
    }

    // Euler step: one call per simulated frame
    pub fn update(&mut self) {
        self.velocity += self.acceleration;
        self.velocity = self.velocity.clamp_length_max(self.config.max_speed);
        self.position += self.velocity;
        self.acceleration = Vec3::ZERO;
        self.wrap_edges();
        self.frame_count += 1;
    }

    // Wrap around on X and Z, bounce off the floor and ceiling on Y
    pub fn wrap_edges(&mut self) {
        let half_width = self.bounds.half_width();
        let half_depth = self.bounds.half_depth();
        let ceiling = self.bounds.half_height();

        if self.position.x > half_width {
            self.position.x = -half_width;
        } else if self.position.x < -half_width {
            self.position.x = half_width;
        }

        if self.position.z > half_depth {
            self.position.z = -half_depth;
        } else if self.position.z < -half_depth {
            self.position.z = half_depth;
        }

        if self.position.y > ceiling {
            self.position.y = ceiling;
            self.velocity.y *= WALL_BOUNCE;
        } else if self.position.y < self.config.min_height {
            self.position.y = self.config.min_height;
            self.velocity.y *= WALL_BOUNCE;
        }
    }

    /// Accumulate separation, alignment and cohesion from `neighbors`.
    ///
    /// Candidates outside `perception_radius` and exact duplicates of this
    /// boid's position are ignored, so the list may be a superset.
    pub fn flock(&mut self, neighbors: &[Neighbor]) {
        let config = &self.config;
        let perception_sq = config.perception_radius * config.perception_radius;
        let collision_distance = config.collision_radius * 2.0;
        let collision_sq = collision_distance * collision_distance;

        let mut separation = Vec3::ZERO;
        let mut alignment = Vec3::ZERO;
        let mut cohesion = Vec3::ZERO;
        let mut total = 0usize;

        for other in neighbors {
            let d_sq = self.position.distance_squared(other.position);
            if d_sq <= 0.0 || d_sq >= perception_sq {
                continue;
            }

            // Inverse-square push, stronger the closer they get
            if d_sq < collision_sq {
                separation += (self.position - other.position) / (d_sq + SEPARATION_EPSILON) * config.avoidance_weight;
            }

            alignment += other.velocity;
            cohesion += other.position;
            total += 1;
        }

        if total > 0 {
            let inv_total = 1.0 / total as f32;

            // Reynolds steering: desired - velocity
            if separation.length_squared() > 0.0 {
                separation = with_length(separation * inv_total, config.max_speed) - self.velocity;
            }
            alignment = with_length(alignment * inv_total, self.cruise_speed) - self.velocity;
            cohesion = with_length(cohesion * inv_total - self.position, self.cruise_speed) - self.velocity;
        }

        let separation = (separation * config.separation_weight).clamp_length_max(config.max_force);
        let alignment = (alignment * config.alignment_weight).clamp_length_max(config.max_force);
        let cohesion = (cohesion * config.cohesion_weight).clamp_length_max(config.max_force);

        self.acceleration += separation + alignment + cohesion;
    }

    #[inline]
    pub fn probes_this_frame(&self) -> bool {
        (self.frame_count + self.index as u64) % PROBE_INTERVAL == 0
    }

    /// Steer around obstacles ahead.
    ///
    /// Rays are only cast on this boid's probing frames; in between the
    /// previous avoidance force decays. While the force is significant it
    /// overrides flocking, which is damped to a tenth. A probe that finds
    /// the way clear only fades the force and leaves flocking alone.
    /// Call after `flock`.
    pub fn avoid_obstacles<C, R>(&mut self, candidates: &[BoundingSphere], raycaster: &C, rng: &mut R) -> Avoidance
    where
        C: Raycast + ?Sized,
        R: Rng + ?Sized,
    {
        let outcome = if self.probes_this_frame() {
            self.probe_obstacles(candidates, raycaster, rng)
        } else {
            self.avoidance_force *= SKIPPED_FRAME_DECAY;
            Avoidance::Skipped
        };

        if outcome == Avoidance::Clear {
            return outcome;
        }

        if self.avoidance_force.length_squared() > AVOIDANCE_ACTIVE_SQ {
            self.acceleration = self.acceleration * FLOCKING_DAMPING + self.avoidance_force;
        }

        outcome
    }

    fn probe_obstacles<C, R>(&mut self, candidates: &[BoundingSphere], raycaster: &C, rng: &mut R) -> Avoidance
    where
        C: Raycast + ?Sized,
        R: Rng + ?Sized,
    {
        let reach = self.config.perception_radius;
        let forward = self.velocity.normalize_or_zero();

        let hit = if candidates.is_empty() || forward == Vec3::ZERO {
            None
        } else {
            raycaster.raycast(self.position, forward, reach, candidates)
        };

        let hit = match hit {
            Some(hit) => hit,
            None => {
                self.avoidance_force *= CLEAR_AHEAD_DECAY;
                return Avoidance::Clear;
            }
        };

        // Random headings in the forward hemisphere; backward draws still use up a try
        let position = self.position;
        let escape = (0..ESCAPE_PROBES).find_map(|_| {
            let dir = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .normalize_or_zero();

            if dir == Vec3::ZERO || dir.dot(forward) < 0.0 {
                return None;
            }

            match raycaster.raycast(position, dir, reach, candidates) {
                Some(blocked) if blocked.distance <= reach => None,
                _ => Some(dir),
            }
        });

        let max_push = self.config.max_force * AVOIDANCE_FORCE_SCALE;
        let (target, outcome) = match escape {
            Some(dir) => (
                with_length(dir * self.config.max_speed - self.velocity, max_push),
                Avoidance::Escaped,
            ),
            None => (with_length(hit.normal, max_push), Avoidance::BoxedIn),
        };

        self.avoidance_force = self.avoidance_force.lerp(target, AVOIDANCE_BLEND);
        outcome
    }
}
