/*
 * Renderer Module
 *
 * This module draws the swim volume through the orbit camera:
 * - the wireframe of the volume bounds
 * - obstacles as translucent discs
 * - every fish as a triangle pointing along its heading, tail swaying
 *   with its own swim speed and phase
 *
 * Fish are sorted back to front so nearer ones overdraw farther ones.
 */

use nannou::prelude::*;
use shoal::{Bounds, InstanceTransform, Vec3};

use crate::app::Model;
use crate::camera::Camera;

const BODY_LENGTH_SCALE: f32 = 2.0;
const TAIL_SWAY: f32 = 0.5;
const SWAY_FREQUENCY: f32 = 8.0;
// Below this screen length a fish is seen nose-on and drawn as a dot
const MIN_SCREEN_LENGTH: f32 = 0.75;
// Depth at which fish have faded to the background
const FOG_DEPTH: f32 = 900.0;

struct FishSprite {
    depth: f32,
    points: [Point2; 3],
    alpha: f32,
}

fn fish_sprite(
    camera: &Camera,
    window_rect: Rect,
    instance: &InstanceTransform,
    body_size: f32,
    time: f32,
) -> Option<FishSprite> {
    let attributes = instance.attributes;
    let half_length = body_size * attributes.scale * BODY_LENGTH_SCALE * 0.5;

    let nose = camera.project(instance.position + instance.forward * half_length, window_rect)?;
    let tail = camera.project(instance.position - instance.forward * half_length, window_rect)?;

    let axis = nose.screen - tail.screen;
    let length = axis.length();
    let pixels_per_unit = (nose.pixels_per_unit + tail.pixels_per_unit) * 0.5;
    let half_width = half_length * 0.4 * pixels_per_unit;

    let side = if length > MIN_SCREEN_LENGTH {
        vec2(-axis.y, axis.x) / length
    } else {
        vec2(1.0, 0.0)
    };

    let sway = (time * attributes.swim_speed * SWAY_FREQUENCY + attributes.phase_offset).sin();
    let tail_center = tail.screen + side * sway * half_width * TAIL_SWAY;

    let depth = (nose.depth + tail.depth) * 0.5;
    Some(FishSprite {
        depth,
        points: [nose.screen, tail_center + side * half_width, tail_center - side * half_width],
        alpha: (1.0 - depth / FOG_DEPTH).clamp(0.15, 1.0),
    })
}

// Twelve edges of the volume box
fn draw_bounds(draw: &Draw, camera: &Camera, window_rect: Rect, bounds: Bounds) {
    let (hw, hh, hd) = (bounds.half_width(), bounds.half_height(), bounds.half_depth());
    let corner = |i: usize| {
        Vec3::new(
            if i & 1 == 0 { -hw } else { hw },
            if i & 2 == 0 { -hh } else { hh },
            if i & 4 == 0 { -hd } else { hd },
        )
    };

    for a in 0..8 {
        for bit in [1, 2, 4] {
            let b = a | bit;
            if b == a {
                continue;
            }
            let start = camera.project(corner(a), window_rect);
            let end = camera.project(corner(b), window_rect);
            if let (Some(start), Some(end)) = (start, end) {
                draw.line()
                    .start(start.screen)
                    .end(end.screen)
                    .weight(1.0)
                    .color(rgba(0.3, 0.45, 0.55, 1.0));
            }
        }
    }
}

// Render the model
pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(rgb(0.02, 0.08, 0.14));

    let window_rect = app.window_rect();
    let params = model.simulation.params();

    if model.show_bounds {
        draw_bounds(&draw, &model.camera, window_rect, params.bounds);
    }

    if model.show_obstacles {
        for obstacle in &model.obstacles {
            if let Some(center) = model.camera.project(obstacle.center, window_rect) {
                draw.ellipse()
                    .xy(center.screen)
                    .radius(obstacle.radius * center.pixels_per_unit)
                    .color(rgba(0.45, 0.35, 0.3, 0.6))
                    .stroke(rgba(0.7, 0.55, 0.45, 0.8))
                    .stroke_weight(1.0);
            }
        }
    }

    let mut sprites: Vec<FishSprite> = model
        .simulation
        .instances()
        .iter()
        .filter_map(|instance| fish_sprite(&model.camera, window_rect, instance, params.boid.body_size, app.time))
        .collect();
    sprites.sort_by(|a, b| b.depth.total_cmp(&a.depth));

    for sprite in &sprites {
        draw.polygon()
            .color(rgba(0.55, 0.8, 0.95, sprite.alpha))
            .points(sprite.points);
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        log::error!("failed to draw frame: {:?}", err);
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        log::error!("failed to draw controls: {:?}", err);
    }
}
