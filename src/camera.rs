/*
 * Camera Module
 *
 * This module defines the orbit Camera used by the viewer. It circles a
 * target point at a given distance, controlled by yaw and pitch, and
 * projects world-space points of the swim volume onto the window.
 */

use nannou::prelude::*;
use shoal::Vec3;

const NEAR_PLANE: f32 = 1.0;
const FIELD_OF_VIEW: f32 = 75.0 * std::f32::consts::PI / 180.0;

// Screen position of a projected point and how many pixels one world unit covers there
#[derive(Clone, Copy, Debug)]
pub struct Projected {
    pub screen: Point2,
    pub pixels_per_unit: f32,
    pub depth: f32,
}

pub struct Camera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub is_dragging: bool,
    pub is_panning: bool,
    pub last_cursor_pos: Vec2,
}

impl Camera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            yaw: 0.9,
            pitch: -0.3,
            distance,
            min_distance: 20.0,
            max_distance: 1500.0,
            is_dragging: false,
            is_panning: false,
            last_cursor_pos: Vec2::ZERO,
        }
    }

    // World space to camera space: x right, y up, z away from the eye
    fn to_view(&self, point: Vec3) -> Vec3 {
        let p = point - self.target;

        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let x = p.x * cos_yaw - p.z * sin_yaw;
        let z = p.x * sin_yaw + p.z * cos_yaw;

        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let y = p.y * cos_pitch - z * sin_pitch;
        let z = p.y * sin_pitch + z * cos_pitch;

        Vec3::new(x, y, z + self.distance)
    }

    // Perspective projection; None for points behind the near plane
    pub fn project(&self, point: Vec3, window_rect: Rect) -> Option<Projected> {
        let view = self.to_view(point);
        if view.z < NEAR_PLANE {
            return None;
        }

        let focal = window_rect.h() * 0.5 / (FIELD_OF_VIEW * 0.5).tan();
        let pixels_per_unit = focal / view.z;
        Some(Projected {
            screen: pt2(view.x * pixels_per_unit, view.y * pixels_per_unit) + window_rect.xy(),
            pixels_per_unit,
            depth: view.z,
        })
    }

    // Handle mouse wheel events for zooming
    pub fn zoom(&mut self, scroll_delta: Vec2) {
        let zoom_factor = 1.0 - scroll_delta.y * 0.1;
        self.distance = (self.distance * zoom_factor).clamp(self.min_distance, self.max_distance);
    }

    // Start orbiting the camera
    pub fn start_drag(&mut self, position: Vec2) {
        self.last_cursor_pos = position;
        self.is_dragging = true;
    }

    // Start sliding the target across the view plane
    pub fn start_pan(&mut self, position: Vec2) {
        self.last_cursor_pos = position;
        self.is_panning = true;
    }

    // Orbit or pan while a button is held
    pub fn drag(&mut self, position: Vec2) {
        let delta = position - self.last_cursor_pos;
        if delta.length_squared() == 0.0 {
            return;
        }

        if self.is_dragging {
            self.yaw -= delta.x * 0.005;
            self.pitch = (self.pitch - delta.y * 0.005).clamp(-1.5, 1.5);
        } else if self.is_panning {
            // Camera right and up in world space
            let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
            let right = Vec3::new(cos_yaw, 0.0, -sin_yaw);
            let scale = self.distance * 0.002;
            self.target -= right * (delta.x * scale) + Vec3::Y * (delta.y * scale);
        }
        self.last_cursor_pos = position;
    }

    // End dragging and panning
    pub fn end_drag(&mut self) {
        self.is_dragging = false;
        self.is_panning = false;
    }
}
