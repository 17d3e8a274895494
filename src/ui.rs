/*
 * UI Module
 *
 * This module builds the egui controls panel. Sliders edit the model's
 * working copy of the parameters; the returned UiChanges tells the app
 * which edits have to be pushed into the running simulation.
 */

use nannou_egui::egui;
use shoal::SimulationParams;

use crate::app::Model;

#[derive(Clone, Copy, Debug, Default)]
pub struct UiChanges {
    pub respawn: bool,
    pub fish_count: bool,
    pub boid_config: bool,
    pub physics_fps: bool,
}

// Draw the controls panel and report what changed
pub fn update_ui(model: &mut Model) -> UiChanges {
    let Model {
        simulation,
        params,
        egui,
        camera,
        paused,
        show_obstacles,
        show_bounds,
        fps,
        frame_time,
        steps_last_frame,
        ..
    } = model;

    let before = params.clone();
    let mut respawn = false;
    let stats = simulation.last_stats();

    let ctx = egui.begin_frame();

    egui::Window::new("Shoal Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.collapsing("School", |ui| {
                ui.add(egui::Slider::new(&mut params.fish_count, SimulationParams::fish_count_range()).text("Fish"));
                ui.add(
                    egui::Slider::new(&mut params.boid.max_speed, SimulationParams::max_speed_range())
                        .text("Max Speed"),
                );
                ui.add(
                    egui::Slider::new(&mut params.boid.max_force, SimulationParams::max_force_range())
                        .text("Max Force"),
                );

                if ui.button("Respawn").clicked() {
                    respawn = true;
                }
            });

            ui.collapsing("Flocking Behavior", |ui| {
                ui.add(
                    egui::Slider::new(&mut params.boid.separation_weight, SimulationParams::weight_range())
                        .text("Separation Weight"),
                );
                ui.add(
                    egui::Slider::new(&mut params.boid.alignment_weight, SimulationParams::weight_range())
                        .text("Alignment Weight"),
                );
                ui.add(
                    egui::Slider::new(&mut params.boid.cohesion_weight, SimulationParams::weight_range())
                        .text("Cohesion Weight"),
                );
                ui.add(
                    egui::Slider::new(&mut params.boid.avoidance_weight, SimulationParams::weight_range())
                        .text("Crowding Push"),
                );
                ui.add(
                    egui::Slider::new(&mut params.boid.perception_radius, SimulationParams::radius_range())
                        .text("Perception Radius"),
                );
                ui.add(
                    egui::Slider::new(&mut params.boid.collision_radius, SimulationParams::radius_range())
                        .text("Collision Radius"),
                );
            });

            ui.collapsing("Performance Tuning", |ui| {
                ui.checkbox(&mut params.enable_parallel, "Enable Parallel Processing");
                ui.add(
                    egui::Slider::new(&mut params.fixed_physics_fps, SimulationParams::physics_fps_range())
                        .text("Physics FPS"),
                );

                ui.separator();

                ui.label(format!("FPS: {:.1}", fps));
                ui.label(format!("Frame time: {:.2} ms", frame_time.as_secs_f64() * 1000.0));
                ui.label(format!("Physics steps this frame: {}", steps_last_frame));
                ui.label(format!("Step time: {:.2} ms", stats.elapsed.as_secs_f64() * 1000.0));
                ui.label(format!("Candidates per fish: {:.1}", stats.mean_candidates()));
                ui.label(format!(
                    "Avoiding: {} ({} boxed in)",
                    stats.avoiding_agents(),
                    stats.boxed_in_agents
                ));
                ui.label(format!("Outside grid: {}", stats.out_of_bounds));
            });

            ui.collapsing("Camera Controls", |ui| {
                ui.label("Orbit: click and drag");
                ui.label("Pan: right click and drag");
                ui.label("Zoom: mouse wheel");
                ui.label(format!("Distance: {:.0}", camera.distance));
            });

            ui.checkbox(show_obstacles, "Show Obstacles");
            ui.checkbox(show_bounds, "Show Bounds");
            ui.checkbox(paused, "Pause Simulation");
        });

    UiChanges {
        respawn,
        fish_count: params.fish_count != before.fish_count,
        boid_config: params.boid != before.boid,
        physics_fps: params.fixed_physics_fps != before.fixed_physics_fps,
    }
}
