/*
 * Input Module
 *
 * This module handles window events for the viewer. A left drag orbits the
 * camera, a right drag pans it and the wheel zooms. Raw events go to egui
 * first; clicks that land on the controls panel never reach the camera.
 */

use nannou::prelude::*;
use nannou::winit::event::{MouseButton, MouseScrollDelta, TouchPhase};

use crate::app::Model;

// Mouse moved event handler
pub fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    let new_pos = Vec2::new(pos.x, pos.y);
    model.camera.drag(new_pos);
    model.mouse_position = new_pos;
}

// Mouse pressed event handler
pub fn mouse_pressed(_app: &App, model: &mut Model, button: MouseButton) {
    if model.egui.ctx().is_pointer_over_area() {
        return;
    }

    match button {
        MouseButton::Left => model.camera.start_drag(model.mouse_position),
        MouseButton::Right => model.camera.start_pan(model.mouse_position),
        _ => {}
    }
}

// Mouse released event handler
pub fn mouse_released(_app: &App, model: &mut Model, button: MouseButton) {
    if matches!(button, MouseButton::Left | MouseButton::Right) {
        model.camera.end_drag();
    }
}

// Mouse wheel event handler for zooming
pub fn mouse_wheel(_app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    if model.egui.ctx().is_pointer_over_area() {
        return;
    }

    match delta {
        MouseScrollDelta::LineDelta(x, y) => model.camera.zoom(vec2(x, y)),
        MouseScrollDelta::PixelDelta(pos) => model.camera.zoom(vec2(pos.x as f32, pos.y as f32) * 0.01),
    }
}

// Pass raw window events to egui
pub fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
