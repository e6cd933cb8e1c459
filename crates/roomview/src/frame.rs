//! The per-frame tick.
//!
//! Each tick runs, in order: control update, anchor projection, draw, and
//! scheduling of the next tick. Stopping is simply not scheduling again.

use std::time::Duration;

use glam::Vec2;

use crate::camera::{CameraState, Viewport};
use crate::controls::OrbitControls;
use crate::picking::{Hit, pick};
use crate::projector::{ProjectedAnchor, SceneAnchor, ScreenProjector};
use crate::scene::LiveScene;

/// Requests the next tick from the display.
pub trait FrameScheduler {
    /// Ask for one more tick.
    fn schedule_next(&mut self);
}

/// Everything a renderer needs for one frame.
#[derive(Debug)]
pub struct Frame<'a, H> {
    /// The scene to draw.
    pub scene: &'a LiveScene,
    /// Camera after this frame's control update.
    pub camera: &'a CameraState,
    /// Current drawing surface size.
    pub viewport: Viewport,
    /// Anchors projected for this frame.
    pub anchors: &'a [ProjectedAnchor<H>],
    /// Time since the previous tick.
    pub dt: Duration,
}

/// Draws a frame.
pub trait Renderer<H> {
    /// Draw one frame.
    fn draw(&mut self, frame: &Frame<'_, H>);
}

/// Owns the per-frame state: camera, controls, anchors and the live scene.
///
/// All mutation goes through `&mut self`, so at most one tick runs at a
/// time.
#[derive(Debug)]
pub struct RenderLoop<H> {
    camera: CameraState,
    controls: OrbitControls,
    viewport: Viewport,
    anchors: Vec<SceneAnchor<H>>,
    projector: ScreenProjector<H>,
    scene: LiveScene,
    running: bool,
    frames: u64,
}

impl<H: Clone> RenderLoop<H> {
    /// Create a loop; it runs until [`RenderLoop::stop`] is called.
    pub fn new(
        camera: CameraState,
        controls: OrbitControls,
        viewport: Viewport,
        anchors: Vec<SceneAnchor<H>>,
        scene: LiveScene,
    ) -> Self {
        Self {
            camera,
            controls,
            viewport,
            anchors,
            projector: ScreenProjector::new(),
            scene,
            running: true,
            frames: 0,
        }
    }

    /// Run one frame. Returns `false` once the loop has been stopped.
    pub fn tick(
        &mut self,
        dt: Duration,
        renderer: &mut impl Renderer<H>,
        scheduler: &mut impl FrameScheduler,
    ) -> bool {
        if !self.running {
            return false;
        }

        self.controls.update(&mut self.camera);
        let anchors = self
            .projector
            .project(&self.anchors, &self.camera, self.viewport);
        renderer.draw(&Frame {
            scene: &self.scene,
            camera: &self.camera,
            viewport: self.viewport,
            anchors,
            dt,
        });
        self.frames += 1;

        if self.running {
            scheduler.schedule_next();
        }
        true
    }

    /// Use a new viewport size from now on.
    pub fn resize(&mut self, viewport: Viewport) {
        tracing::debug!(width = viewport.width, height = viewport.height, "viewport resized");
        self.viewport = viewport;
    }

    /// Stop scheduling ticks.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether ticks are still being scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Pick the pointer against the scene's pick target.
    #[must_use]
    pub fn pick(&self, pointer: Vec2) -> Option<Hit> {
        pick(pointer, self.viewport, &self.camera, self.scene.pick_target())
    }

    /// The camera.
    #[must_use]
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    /// The camera, for debug-panel edits.
    pub fn camera_mut(&mut self) -> &mut CameraState {
        &mut self.camera
    }

    /// The orbit controls, for input handling.
    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    /// The current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The anchors, in their fixed order.
    #[must_use]
    pub fn anchors(&self) -> &[SceneAnchor<H>] {
        &self.anchors
    }

    /// Anchors projected by the last tick.
    #[must_use]
    pub fn projected(&self) -> &[ProjectedAnchor<H>] {
        self.projector.last()
    }

    /// The live scene.
    #[must_use]
    pub fn scene(&self) -> &LiveScene {
        &self.scene
    }

    /// The live scene, for attaching loaded graphs.
    pub fn scene_mut(&mut self) -> &mut LiveScene {
        &mut self.scene
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[derive(Default)]
    struct Log {
        entries: Vec<String>,
    }

    struct LogRenderer<'a>(&'a std::cell::RefCell<Log>);

    impl Renderer<u32> for LogRenderer<'_> {
        fn draw(&mut self, frame: &Frame<'_, u32>) {
            self.0.borrow_mut().entries.push(format!(
                "draw anchors={} x={:.3}",
                frame.anchors.len(),
                frame.camera.position.x
            ));
        }
    }

    struct LogScheduler<'a>(&'a std::cell::RefCell<Log>);

    impl FrameScheduler for LogScheduler<'_> {
        fn schedule_next(&mut self) {
            self.0.borrow_mut().entries.push("schedule".to_string());
        }
    }

    fn render_loop() -> RenderLoop<u32> {
        RenderLoop::new(
            CameraState {
                position: Vec3::new(0.0, 0.0, 5.0),
                ..CameraState::default()
            },
            OrbitControls::default().with_damping(false),
            Viewport::new(800.0, 600.0),
            vec![SceneAnchor::new(Vec3::ZERO, 1), SceneAnchor::new(Vec3::Y, 2)],
            LiveScene::new("boombox"),
        )
    }

    #[test]
    fn test_tick_order() {
        let log = std::cell::RefCell::new(Log::default());
        let mut frame_loop = render_loop();
        frame_loop.controls_mut().rotate_left(-std::f32::consts::FRAC_PI_2);

        assert!(frame_loop.tick(
            Duration::from_millis(16),
            &mut LogRenderer(&log),
            &mut LogScheduler(&log),
        ));

        // Controls ran before the draw saw the camera, projection before draw.
        assert_eq!(
            log.borrow().entries,
            vec!["draw anchors=2 x=5.000".to_string(), "schedule".to_string()]
        );
        assert_eq!(frame_loop.frame_count(), 1);
        assert_eq!(frame_loop.projected().len(), 2);
    }

    #[test]
    fn test_stop_prevents_rescheduling() {
        let log = std::cell::RefCell::new(Log::default());
        let mut frame_loop = render_loop();
        frame_loop.stop();
        assert!(!frame_loop.is_running());
        assert!(!frame_loop.tick(
            Duration::from_millis(16),
            &mut LogRenderer(&log),
            &mut LogScheduler(&log),
        ));
        assert!(log.borrow().entries.is_empty());
    }

    #[test]
    fn test_resize_applies_to_next_projection() {
        let log = std::cell::RefCell::new(Log::default());
        let mut frame_loop = render_loop();
        frame_loop.resize(Viewport::new(0.0, 0.0));
        frame_loop.tick(Duration::ZERO, &mut LogRenderer(&log), &mut LogScheduler(&log));
        assert!(frame_loop.projected().is_empty());

        frame_loop.resize(Viewport::new(800.0, 600.0));
        frame_loop.tick(Duration::ZERO, &mut LogRenderer(&log), &mut LogScheduler(&log));
        let before = frame_loop.projected().to_vec();
        assert_eq!(before.len(), 2);

        frame_loop.resize(Viewport::new(1600.0, 1200.0));
        frame_loop.tick(Duration::ZERO, &mut LogRenderer(&log), &mut LogScheduler(&log));
        assert_eq!(frame_loop.viewport(), Viewport::new(1600.0, 1200.0));
        let after = frame_loop.projected();
        assert_eq!(after.len(), 2);
        for (b, a) in before.iter().zip(after) {
            assert!((a.ndc - b.ndc).length() < 1e-6);
            assert!((a.offset.x - 2.0 * b.offset.x).abs() < 1e-3);
            assert!((a.offset.y - 2.0 * b.offset.y).abs() < 1e-3);
        }
        // The anchor at world up sits above center.
        assert!(after[1].offset.y < -1.0);
    }

    #[test]
    fn test_pick_before_load_is_none() {
        let frame_loop = render_loop();
        assert!(frame_loop.pick(Vec2::new(400.0, 300.0)).is_none());
    }
}
