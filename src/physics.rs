/*
 * Physics Module
 *
 * This module drives the fish school one frame at a time:
 * 1. Rebuild the flock index from the current positions
 * 2. For every fish: query neighbors, pick nearby obstacles, flock, avoid
 * 3. Integrate every fish and publish its instance transform
 *
 * Steering reads a frozen snapshot of the flock and only writes the fish's
 * own forces, so it can run on rayon; integration happens in a second pass
 * once every fish has finished reading. Probe directions come from a ChaCha
 * generator keyed by (seed, frame) with one stream per fish, which keeps the
 * parallel and sequential passes bit-identical.
 */

use std::time::Instant;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::boid::{Boid, Neighbor};
use crate::debug::StepStats;
use crate::error::ConfigError;
use crate::flock_index::FlockIndex;
use crate::obstacle::{candidates_near_into, BoundingSphere, Raycast};
use crate::params::{BoidConfig, SimulationParams};

// Minimum squared speed for the renderer to take a new heading
const MIN_HEADING_SPEED_SQ: f32 = 1e-4;
// How often step statistics are logged at debug level
const STATS_LOG_INTERVAL: u64 = 600;
// Key words that keep spawn and probe randomness apart
const PROBE_KEY: u64 = 1;
const SPAWN_KEY: u64 = 2;
// Frames between repeated out-of-bounds warnings
const OUT_OF_BOUNDS_WARN_INTERVAL: u64 = 60;

/// Cosmetic per-fish values the renderer uses to size and animate bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FishAttributes {
    pub scale: f32,
    pub swim_speed: f32,
    pub phase_offset: f32,
}

impl FishAttributes {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            scale: 1.0 + rng.gen::<f32>() * 1.2,
            swim_speed: 0.5 + rng.gen::<f32>() * 0.5,
            phase_offset: rng.gen::<f32>() * std::f32::consts::TAU,
        }
    }
}

/// Everything the renderer needs to place one fish instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceTransform {
    pub position: Vec3,
    /// Unit heading. Kept from the previous frame while the fish is nearly still.
    pub forward: Vec3,
    pub attributes: FishAttributes,
}

// Unit heading of a velocity, if the fish is moving fast enough to have one
fn heading(velocity: Vec3) -> Option<Vec3> {
    if velocity.length_squared() > MIN_HEADING_SPEED_SQ {
        Some(velocity.normalize())
    } else {
        None
    }
}

// ChaCha keyed by (seed, purpose, epoch), on its own stream per fish
fn keyed_rng(seed: u64, purpose: u64, epoch: u64, stream: u64) -> ChaCha8Rng {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&seed.to_le_bytes());
    key[8..16].copy_from_slice(&purpose.to_le_bytes());
    key[16..24].copy_from_slice(&epoch.to_le_bytes());

    let mut rng = ChaCha8Rng::from_seed(key);
    rng.set_stream(stream);
    rng
}

// Per-worker buffers reused across fish
#[derive(Default)]
struct Scratch {
    ids: Vec<usize>,
    neighbors: Vec<Neighbor>,
    obstacles: Vec<BoundingSphere>,
}

// Read-only view of the frame shared by every steering worker
struct StepContext<'a, R: ?Sized> {
    index: &'a FlockIndex,
    snapshot: &'a [Neighbor],
    obstacles: &'a [BoundingSphere],
    raycaster: &'a R,
    seed: u64,
    frame: u64,
}

impl<R: Raycast + ?Sized> StepContext<'_, R> {
    fn steer(&self, boid: &mut Boid, scratch: &mut Scratch) -> StepStats {
        self.index.query_neighbors(boid.index, &mut scratch.ids);
        scratch.neighbors.clear();
        scratch
            .neighbors
            .extend(scratch.ids.iter().map(|&other| self.snapshot[other]));

        boid.flock(&scratch.neighbors);

        // Bounding-sphere pre-filter, only on frames this fish actually probes
        if boid.probes_this_frame() {
            candidates_near_into(self.obstacles, boid.position, boid.config.perception_radius, &mut scratch.obstacles);
        } else {
            scratch.obstacles.clear();
        }

        let mut rng = keyed_rng(self.seed, PROBE_KEY, self.frame, boid.index as u64);
        let avoidance = boid.avoid_obstacles(&scratch.obstacles, self.raycaster, &mut rng);

        StepStats::for_agent(scratch.ids.len(), avoidance)
    }
}

pub struct Simulation {
    params: SimulationParams,
    seed: u64,
    generation: u64,
    frame: u64,
    boids: Vec<Boid>,
    instances: Vec<InstanceTransform>,
    index: FlockIndex,
    snapshot: Vec<Neighbor>,
    scratch: Scratch,
    last_stats: StepStats,
    // Frame of the last out-of-bounds warning
    last_bounds_warning: Option<u64>,
}

impl Simulation {
    pub fn new(params: SimulationParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let seed = params.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let index = FlockIndex::new(params.bounds, params.boid.perception_radius);

        let mut simulation = Self {
            params,
            seed,
            generation: 0,
            frame: 0,
            boids: Vec::new(),
            instances: Vec::new(),
            index,
            snapshot: Vec::new(),
            scratch: Scratch::default(),
            last_stats: StepStats::default(),
            last_bounds_warning: None,
        };
        simulation.spawn_members(0, simulation.params.fish_count);

        log::info!(
            "spawned {} fish in a {}x{}x{} volume (seed {}, grid {:?})",
            simulation.boids.len(),
            simulation.params.bounds.width,
            simulation.params.bounds.height,
            simulation.params.bounds.depth,
            seed,
            simulation.index.dims(),
        );

        Ok(simulation)
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn instances(&self) -> &[InstanceTransform] {
        &self.instances
    }

    pub fn flock_index(&self) -> &FlockIndex {
        &self.index
    }

    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.params.enable_parallel = enabled;
    }

    // Spawn fish [from, to) from their own random stream and append them
    fn spawn_members(&mut self, from: usize, to: usize) {
        let mut rng = keyed_rng(self.seed, SPAWN_KEY, self.generation, from as u64);
        let bounds = self.params.bounds;
        let config = self.params.boid;

        for index in from..to {
            let mut boid = Boid::new(bounds, index, config, &mut rng);
            // Late joiners share the flock's clock so probing stays staggered by index
            boid.frame_count = self.frame;
            let attributes = FishAttributes::random(&mut rng);
            let forward = heading(boid.velocity).unwrap_or(Vec3::new(0.0, 0.0, 1.0));
            self.instances.push(InstanceTransform {
                position: boid.position,
                forward,
                attributes,
            });
            self.boids.push(boid);
        }
    }

    /// Throw the flock away and spawn a fresh one of the same size.
    pub fn respawn(&mut self) {
        self.generation += 1;
        self.boids.clear();
        self.instances.clear();
        self.spawn_members(0, self.params.fish_count);
        log::info!("respawned {} fish (generation {})", self.boids.len(), self.generation);
    }

    /// Grow or shrink the flock. New fish join at the tail; surplus fish are dropped from it.
    pub fn set_fish_count(&mut self, count: usize) -> Result<(), ConfigError> {
        if count == 0 {
            return Err(ConfigError::invalid("fish_count", "a flock needs at least one fish"));
        }

        let current = self.boids.len();
        if count < current {
            self.boids.truncate(count);
            self.instances.truncate(count);
        } else if count > current {
            self.spawn_members(current, count);
        }
        self.params.fish_count = count;
        log::debug!("fish count {} -> {}", current, count);
        Ok(())
    }

    /// Swap the tuning of every fish. Cruise speeds keep their ratio to `max_speed`.
    pub fn set_boid_config(&mut self, config: BoidConfig) -> Result<(), ConfigError> {
        config.validate(&self.params.bounds)?;

        let speed_ratio = config.max_speed / self.params.boid.max_speed;
        if config.perception_radius != self.params.boid.perception_radius {
            self.index = FlockIndex::new(self.params.bounds, config.perception_radius);
        }

        for boid in &mut self.boids {
            boid.config = config;
            boid.cruise_speed *= speed_ratio;
            boid.wrap_edges();
        }
        self.params.boid = config;
        Ok(())
    }

    fn bounds_warning_due(&self, frame: u64) -> bool {
        match self.last_bounds_warning {
            Some(last) => frame.saturating_sub(last) >= OUT_OF_BOUNDS_WARN_INTERVAL,
            None => true,
        }
    }

    /// Advance the flock by one frame.
    pub fn step<R>(&mut self, obstacles: &[BoundingSphere], raycaster: &R) -> StepStats
    where
        R: Raycast + Sync + ?Sized,
    {
        let started = Instant::now();

        let out_of_bounds = self.index.rebuild(self.boids.iter().map(|boid| boid.position));
        self.snapshot.clear();
        self.snapshot.extend(self.boids.iter().map(Boid::as_neighbor));

        let ctx = StepContext {
            index: &self.index,
            snapshot: &self.snapshot,
            obstacles,
            raycaster,
            seed: self.seed,
            frame: self.frame,
        };

        let tally = if self.params.enable_parallel {
            let tally = self
                .boids
                .par_iter_mut()
                .map_init(Scratch::default, |scratch, boid| ctx.steer(boid, scratch))
                .reduce(StepStats::default, StepStats::merge);
            self.boids.par_iter_mut().for_each(Boid::update);
            tally
        } else {
            let scratch = &mut self.scratch;
            let tally = self
                .boids
                .iter_mut()
                .map(|boid| ctx.steer(boid, scratch))
                .fold(StepStats::default(), StepStats::merge);
            self.boids.iter_mut().for_each(Boid::update);
            tally
        };

        for (instance, boid) in self.instances.iter_mut().zip(&self.boids) {
            instance.position = boid.position;
            if let Some(forward) = heading(boid.velocity) {
                instance.forward = forward;
            }
        }

        let stats = StepStats {
            frame: self.frame,
            out_of_bounds,
            elapsed: started.elapsed(),
            ..tally
        };
        self.frame += 1;
        self.last_stats = stats;

        if out_of_bounds > 0 && self.bounds_warning_due(stats.frame) {
            log::warn!("frame {}: {} fish outside the flock index", stats.frame, out_of_bounds);
            self.last_bounds_warning = Some(stats.frame);
        }
        log::trace!(
            "step: frame={} candidates={} probing={} elapsed={:?}",
            stats.frame,
            stats.candidate_pairs,
            stats.probing_agents,
            stats.elapsed
        );
        if stats.frame % STATS_LOG_INTERVAL == 0 {
            log::debug!(
                "frame {}: {} fish, {:.1} candidates/fish, {} avoiding ({} boxed in), {:?}",
                stats.frame,
                stats.agents,
                stats.mean_candidates(),
                stats.avoiding_agents(),
                stats.boxed_in_agents,
                stats.elapsed
            );
        }

        stats
    }
}
