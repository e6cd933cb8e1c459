//! World anchors to screen-space pixel offsets.
//!
//! Offsets are measured from the viewport center with +Y pointing down, so
//! an overlay element can be placed with a single translate.

use glam::{Vec3, Vec4};

use crate::camera::{CameraState, Viewport};

/// A fixed world position with an attached overlay handle.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAnchor<H> {
    /// World-space position. Never changes after startup.
    pub position: Vec3,
    /// Whatever the UI uses to find the overlay element.
    pub overlay: H,
}

impl<H> SceneAnchor<H> {
    /// Create an anchor.
    pub fn new(position: Vec3, overlay: H) -> Self {
        Self { position, overlay }
    }
}

/// Pixel offset from the viewport center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenOffset {
    /// Pixels to the right of center.
    pub x: f32,
    /// Pixels below center.
    pub y: f32,
}

impl ScreenOffset {
    /// Map normalized device coordinates to a center-relative offset.
    #[must_use]
    pub fn from_ndc(ndc: Vec3, viewport: Viewport) -> Self {
        Self {
            x: ndc.x * viewport.width * 0.5,
            y: -ndc.y * viewport.height * 0.5,
        }
    }

    /// Offset from the top-left corner instead of the center.
    #[must_use]
    pub fn to_top_left(self, viewport: Viewport) -> (f32, f32) {
        (self.x + viewport.width * 0.5, self.y + viewport.height * 0.5)
    }
}

/// One projected anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedAnchor<H> {
    /// The anchor's overlay handle.
    pub overlay: H,
    /// Offset from the viewport center.
    pub offset: ScreenOffset,
    /// Normalized device coordinates. `z > 1` or a negative clip `w` means
    /// the anchor is outside the view volume; callers decide what to do.
    pub ndc: Vec3,
}

/// Normalized device coordinates of `point`.
///
/// `None` when the viewport is degenerate or the point lies exactly in the
/// camera plane (clip `w == 0`). Points behind the camera still project.
#[must_use]
pub fn ndc(camera: &CameraState, viewport: Viewport, point: Vec3) -> Option<Vec3> {
    if viewport.is_degenerate() {
        return None;
    }
    project_with(&camera.view_projection(viewport), point)
}

fn project_with(view_projection: &glam::Mat4, point: Vec3) -> Option<Vec3> {
    let clip: Vec4 = *view_projection * point.extend(1.0);
    if clip.w == 0.0 || !clip.w.is_finite() {
        return None;
    }
    Some(clip.truncate() / clip.w)
}

/// Projects anchors every frame, reusing its output buffer.
#[derive(Debug, Clone)]
pub struct ScreenProjector<H> {
    projected: Vec<ProjectedAnchor<H>>,
}

impl<H> Default for ScreenProjector<H> {
    fn default() -> Self {
        Self {
            projected: Vec::new(),
        }
    }
}

impl<H: Clone> ScreenProjector<H> {
    /// Create a projector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Project every anchor for the current camera and viewport.
    ///
    /// Anchors without defined coordinates are skipped; a degenerate
    /// viewport yields an empty slice.
    pub fn project(
        &mut self,
        anchors: &[SceneAnchor<H>],
        camera: &CameraState,
        viewport: Viewport,
    ) -> &[ProjectedAnchor<H>] {
        self.projected.clear();
        if viewport.is_degenerate() {
            return &self.projected;
        }

        let view_projection = camera.view_projection(viewport);
        self.projected.extend(anchors.iter().filter_map(|anchor| {
            let ndc = project_with(&view_projection, anchor.position)?;
            Some(ProjectedAnchor {
                overlay: anchor.overlay.clone(),
                offset: ScreenOffset::from_ndc(ndc, viewport),
                ndc,
            })
        }));
        &self.projected
    }

    /// The result of the last [`ScreenProjector::project`] call.
    #[must_use]
    pub fn last(&self) -> &[ProjectedAnchor<H>] {
        &self.projected
    }
}
