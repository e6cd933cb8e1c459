//! Camera state shared by the projector, picking and the renderer.
//!
//! Conventions follow a right-handed, Y-up world with the camera looking
//! down its local -Z axis and an OpenGL clip space (NDC z in `[-1, 1]`).

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

/// Size of the drawing surface in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Viewport {
    /// Create a viewport.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether either side is zero, negative or not finite.
    ///
    /// Projection and picking produce nothing for degenerate viewports.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }

    /// Width over height, or 1 for degenerate viewports.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.is_degenerate() {
            1.0
        } else {
            self.width / self.height
        }
    }
}

/// A perspective camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// World-space position.
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Vec3::new(4.0, 5.0, 4.0),
            rotation: Vec3::ZERO,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// A discrete edit from the debug panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraEdit {
    Position(Vec3),
    Rotation(Vec3),
    Fov(f32),
    Near(f32),
    Far(f32),
}

impl CameraState {
    /// Orientation as a quaternion.
    #[must_use]
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Camera-to-world transform.
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation(), self.position)
    }

    /// World-to-camera transform.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    /// Perspective projection for `viewport`.
    #[must_use]
    pub fn projection_matrix(&self, viewport: Viewport) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), viewport.aspect(), self.near, self.far)
    }

    /// Projection times view.
    #[must_use]
    pub fn view_projection(&self, viewport: Viewport) -> Mat4 {
        self.projection_matrix(viewport) * self.view_matrix()
    }

    /// Direction the camera looks along.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    /// Rotate the camera so it faces `target`, keeping +Y up.
    ///
    /// Does nothing when `target` is the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(mut back) = (self.position - target).try_normalize() else {
            return;
        };
        let mut right = Vec3::Y.cross(back);
        if right.length_squared() < 1e-12 {
            // Looking straight up or down: nudge off the pole.
            back.z += 1e-4;
            back = back.normalize();
            right = Vec3::Y.cross(back);
        }
        let right = right.normalize();
        let up = back.cross(right);
        let (x, y, z) = Quat::from_mat3(&Mat3::from_cols(right, up, back)).to_euler(EulerRot::XYZ);
        self.rotation = Vec3::new(x, y, z);
    }

    /// Apply a debug-panel edit.
    pub fn apply(&mut self, edit: CameraEdit) {
        match edit {
            CameraEdit::Position(p) => self.position = p,
            CameraEdit::Rotation(r) => self.rotation = r,
            CameraEdit::Fov(fov) => self.fov = fov,
            CameraEdit::Near(near) => self.near = near,
            CameraEdit::Far(far) => self.far = far,
        }
    }
}
