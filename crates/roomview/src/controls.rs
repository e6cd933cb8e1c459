//! Orbit controls: rotate around and dolly towards a target point.
//!
//! Input accumulates into a spherical delta which `update` applies once per
//! frame. With damping on, only a fraction of the delta is applied each
//! frame and the remainder decays, giving the camera inertia.

use std::f32::consts::PI;

use glam::Vec3;

use crate::camera::CameraState;

const EPS: f32 = 1e-6;

/// Orbit camera controller.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Apply input gradually.
    pub enable_damping: bool,
    /// Fraction of the pending delta applied per update.
    pub damping_factor: f32,
    /// Closest allowed distance to the target.
    pub min_distance: f32,
    /// Farthest allowed distance to the target.
    pub max_distance: f32,
    /// Scale applied per dolly step.
    pub zoom_step: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            zoom_step: 0.95,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    /// Create controls orbiting `target`.
    #[must_use]
    pub fn new(target: Vec3, damping_factor: f32) -> Self {
        Self {
            target,
            damping_factor,
            ..Self::default()
        }
    }

    /// Turn damping on or off.
    #[must_use]
    pub fn with_damping(mut self, enable: bool) -> Self {
        self.enable_damping = enable;
        self
    }

    /// Rotate around the vertical axis by `angle` radians.
    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    /// Rotate towards the pole by `angle` radians.
    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Move towards (`steps > 0`) or away from the target.
    pub fn dolly(&mut self, steps: f32) {
        self.scale *= self.zoom_step.powf(steps);
    }

    /// Pending rotation, `(theta, phi)`.
    #[must_use]
    pub fn pending(&self) -> (f32, f32) {
        (self.delta_theta, self.delta_phi)
    }

    /// Apply pending input to `camera` and point it at the target.
    ///
    /// Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut CameraState) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > EPS {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI / 2.0)
        };

        let applied = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * applied;
        phi = (phi + self.delta_phi * applied).clamp(EPS, PI - EPS);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let sin_phi = phi.sin();
        let position = self.target
            + Vec3::new(
                radius * sin_phi * theta.sin(),
                radius * phi.cos(),
                radius * sin_phi * theta.cos(),
            );
        let moved = position.distance_squared(camera.position) > EPS;
        camera.position = position;
        camera.look_at(self.target);

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;
        moved
    }
}
