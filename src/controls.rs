//! Orbit camera controls.
//!
//! The camera circles a target on a sphere. Dragging with the left button
//! rotates, the wheel zooms. Rotation is accumulated as a spherical delta and
//! bled into the camera over several frames when damping is enabled, so
//! [`OrbitControls::update`] has to run every frame for the motion to settle.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Point3, Rad, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::{camera::Camera, config::ControlsConfig};

const EPS: f32 = 1e-6;

/// Radius, polar angle from +Y (`phi`) and azimuth around +Y (`theta`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keeps `phi` away from the poles, where the view direction degenerates.
    pub fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Drag {
    #[default]
    None,
    Rotate,
    Pan,
}

#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    config: ControlsConfig,
    spherical_delta: Spherical,
    pan_offset: Vector3<f32>,
    scale: f32,
    drag: Drag,
    cursor: Option<PhysicalPosition<f64>>,
}

impl OrbitControls {
    pub fn new(config: ControlsConfig, target: Point3<f32>) -> Self {
        Self {
            target,
            config,
            spherical_delta: Spherical::default(),
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
            drag: Drag::None,
            cursor: None,
        }
    }

    pub fn config(&self) -> &ControlsConfig {
        &self.config
    }

    pub fn rotate_left(&mut self, angle: Rad<f32>) {
        self.spherical_delta.theta -= angle.0;
    }

    pub fn rotate_up(&mut self, angle: Rad<f32>) {
        self.spherical_delta.phi -= angle.0;
    }

    /// Rotation for a pointer drag of `(dx, dy)` pixels. A drag across the
    /// full viewport height turns the camera once around.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let speed = self.config.rotate_speed;
        self.rotate_left(Rad(2.0 * PI * dx * speed / height));
        self.rotate_up(Rad(2.0 * PI * dy * speed / height));
    }

    pub fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.config.zoom_speed)
    }

    /// One wheel step. Positive `steps` (wheel away from the user) zooms in.
    pub fn zoom(&mut self, steps: f32) {
        if steps > 0.0 {
            self.scale *= self.zoom_scale();
        } else if steps < 0.0 {
            self.scale /= self.zoom_scale();
        }
    }

    /// Moves the target parallel to the view plane. Ignored unless panning is
    /// enabled.
    pub fn pan_by_pixels(
        &mut self,
        dx: f32,
        dy: f32,
        camera: &Camera,
        fovy: Rad<f32>,
        viewport_height: f32,
    ) -> bool {
        if !self.config.enable_pan {
            return false;
        }
        let offset = camera.eye - camera.target;
        // world units covered by one pixel at the target's depth
        let units_per_pixel =
            2.0 * offset.magnitude() * (fovy.0 / 2.0).tan() / viewport_height.max(1.0);
        let forward = -offset.normalize();
        let right = forward.cross(Vector3::unit_y()).normalize();
        let up = right.cross(forward);
        self.pan_offset += -right * dx * units_per_pixel + up * dy * units_per_pixel;
        true
    }

    /// Feeds winit pointer input into the controls. Returns whether the
    /// event was used.
    pub fn handle_window_event(
        &mut self,
        event: &WindowEvent,
        camera: &Camera,
        fovy: Rad<f32>,
        viewport_height: f32,
    ) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (state, button) {
                    (ElementState::Pressed, MouseButton::Left) => Drag::Rotate,
                    (ElementState::Pressed, MouseButton::Right) if self.config.enable_pan => {
                        Drag::Pan
                    }
                    (ElementState::Released, _) => Drag::None,
                    _ => self.drag,
                };
                self.drag != Drag::None
            }
            WindowEvent::CursorMoved { position, .. } => {
                let last = self.cursor.replace(*position);
                let Some(last) = last else {
                    return false;
                };
                let (dx, dy) = ((position.x - last.x) as f32, (position.y - last.y) as f32);
                match self.drag {
                    Drag::Rotate => {
                        self.rotate_by_pixels(dx, dy, viewport_height);
                        true
                    }
                    Drag::Pan => self.pan_by_pixels(dx, dy, camera, fovy, viewport_height),
                    Drag::None => false,
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = Drag::None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                self.zoom(steps);
                steps != 0.0
            }
            _ => false,
        }
    }

    /// Applies pending rotation, zoom and pan to `camera`, enforcing the
    /// polar and distance limits. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let config = &self.config;
        let mut spherical = Spherical::from_offset(camera.eye - self.target);

        if config.enable_damping {
            spherical.theta += self.spherical_delta.theta * config.damping_factor;
            spherical.phi += self.spherical_delta.phi * config.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }

        spherical.phi = spherical
            .phi
            .clamp(config.min_polar_angle.0, config.max_polar_angle.0);
        spherical.make_safe();
        spherical.radius =
            (spherical.radius * self.scale).clamp(config.min_distance, config.max_distance);

        if config.enable_damping {
            self.target += self.pan_offset * config.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        let eye = self.target + spherical.to_offset();

        if config.enable_damping {
            let decay = 1.0 - config.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
        }
        self.scale = 1.0;

        let moved = (eye - camera.eye).magnitude2() > EPS
            || (self.target - camera.target).magnitude2() > EPS;
        camera.eye = eye;
        camera.target = self.target;
        moved
    }
}
