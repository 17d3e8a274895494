/*
 * Application Module
 *
 * This module defines the viewer's Model and its update loop. The flock
 * advances on a fixed timestep: frame time is banked in an accumulator and
 * spent in whole physics steps, so the school swims at the same pace
 * whatever the render rate.
 */

use std::time::{Duration, Instant};

use anyhow::Context;
use nannou::prelude::*;
use nannou_egui::Egui;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shoal::{BoundingSphere, Simulation, SimulationParams, SphereRaycaster, Vec3};

use crate::camera::Camera;
use crate::input::{mouse_moved, mouse_pressed, mouse_released, mouse_wheel, raw_window_event};
use crate::renderer::view;
use crate::ui::{self, UiChanges};

const REEF_OBSTACLES: usize = 8;
// Cap on physics steps per rendered frame so a stall can't snowball
const MAX_STEPS_PER_FRAME: usize = 8;

// Main model for the application
pub struct Model {
    pub simulation: Simulation,
    // Working copy edited by the controls panel
    pub params: SimulationParams,
    pub obstacles: Vec<BoundingSphere>,
    pub egui: Egui,
    pub camera: Camera,
    pub mouse_position: Vec2,
    pub paused: bool,
    pub show_obstacles: bool,
    pub show_bounds: bool,
    pub fps: f32,
    pub frame_time: Duration,
    pub steps_last_frame: usize,
    // Fixed timestep physics variables
    pub physics_accumulator: Duration,
    pub physics_step_size: Duration,
    pub last_update_time: Instant,
}

// Parameters from the JSON file named on the command line, or the defaults
fn load_params() -> anyhow::Result<SimulationParams> {
    match std::env::args().nth(1) {
        Some(path) => SimulationParams::from_json_file(&path)
            .with_context(|| format!("failed to load simulation config {}", path)),
        None => Ok(SimulationParams::default()),
    }
}

// Rocky columns scattered over the floor of the volume
fn reef(params: &SimulationParams, seed: u64) -> Vec<BoundingSphere> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let bounds = params.bounds;
    let floor = -bounds.half_height();

    (0..REEF_OBSTACLES)
        .map(|_| {
            let radius = rng.gen_range(6.0..18.0);
            let center = Vec3::new(
                rng.gen_range(-bounds.half_width() * 0.8..bounds.half_width() * 0.8),
                floor + radius,
                rng.gen_range(-bounds.half_depth() * 0.8..bounds.half_depth() * 0.8),
            );
            BoundingSphere::new(center, radius)
        })
        .collect()
}

fn step_size(fps: f32) -> Duration {
    Duration::from_secs_f32(1.0 / fps)
}

// Initialize the model
pub fn model(app: &App) -> Model {
    let params = load_params().unwrap_or_else(|err| {
        log::error!("{:#}", err);
        log::warn!("falling back to default parameters");
        SimulationParams::default()
    });

    let window_id = app
        .new_window()
        .title("Shoal")
        .size(1280, 800)
        .view(view)
        .mouse_moved(mouse_moved)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_wheel(mouse_wheel)
        .raw_event(raw_window_event)
        .build()
        .unwrap();

    let window = app.window(window_id).unwrap();
    let egui = Egui::from_window(&window);

    let simulation = Simulation::new(params.clone()).expect("validated parameters");
    let obstacles = reef(&params, simulation.seed());

    let bounds = params.bounds;
    let camera = Camera::new(Vec3::ZERO, bounds.width.max(bounds.depth) * 0.9);

    Model {
        physics_step_size: step_size(params.fixed_physics_fps),
        simulation,
        params,
        obstacles,
        egui,
        camera,
        mouse_position: Vec2::ZERO,
        paused: false,
        show_obstacles: true,
        show_bounds: true,
        fps: 0.0,
        frame_time: Duration::ZERO,
        steps_last_frame: 0,
        physics_accumulator: Duration::ZERO,
        last_update_time: Instant::now(),
    }
}

// Push panel edits into the running simulation
fn apply_changes(model: &mut Model, changes: UiChanges) {
    if changes.fish_count {
        if let Err(err) = model.simulation.set_fish_count(model.params.fish_count) {
            log::warn!("fish count rejected: {}", err);
            model.params.fish_count = model.simulation.params().fish_count;
        }
    }

    if changes.boid_config {
        if let Err(err) = model.simulation.set_boid_config(model.params.boid) {
            log::warn!("boid settings rejected: {}", err);
            model.params.boid = model.simulation.params().boid;
        }
    }

    if changes.physics_fps {
        model.physics_step_size = step_size(model.params.fixed_physics_fps);
    }

    model.simulation.set_parallel(model.params.enable_parallel);

    if changes.respawn {
        model.simulation.respawn();
        model.physics_accumulator = Duration::ZERO;
    }
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    model.fps = app.fps();
    model.frame_time = update.since_last;

    model.egui.set_elapsed_time(update.since_start);
    let changes = ui::update_ui(model);
    apply_changes(model, changes);

    let now = Instant::now();
    let elapsed = now.duration_since(model.last_update_time);
    model.last_update_time = now;

    if model.paused {
        model.steps_last_frame = 0;
        return;
    }

    model.physics_accumulator += elapsed;

    let mut steps = 0;
    while model.physics_accumulator >= model.physics_step_size && steps < MAX_STEPS_PER_FRAME {
        model.simulation.step(&model.obstacles, &SphereRaycaster);
        model.physics_accumulator -= model.physics_step_size;
        steps += 1;
    }

    if steps == MAX_STEPS_PER_FRAME && model.physics_accumulator >= model.physics_step_size {
        log::debug!("physics falling behind, dropping {:?}", model.physics_accumulator);
        model.physics_accumulator = Duration::ZERO;
    }
    model.steps_last_frame = steps;
}
