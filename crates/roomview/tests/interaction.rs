//! A loaded scene driven through the frame loop: projection and picking.

mod common;

use std::sync::Arc;
use std::time::Duration;

use glam::{Vec2, Vec3};
use roomview::{
    CameraState, DecoderConfig, DecoderRegistry, Frame, FrameScheduler, LiveScene, NoProgress,
    OrbitControls, RenderLoop, Renderer, SceneAnchor, SceneLoader, SourceDescriptor, Viewport,
};

use common::{SCENE, room_fetcher};

#[derive(Default)]
struct CountingRenderer {
    frames: usize,
    last_offsets: Vec<(&'static str, f32, f32)>,
}

impl Renderer<&'static str> for CountingRenderer {
    fn draw(&mut self, frame: &Frame<'_, &'static str>) {
        self.frames += 1;
        self.last_offsets = frame
            .anchors
            .iter()
            .map(|a| (a.overlay, a.offset.x, a.offset.y))
            .collect();
    }
}

#[derive(Default)]
struct CountingScheduler(usize);

impl FrameScheduler for CountingScheduler {
    fn schedule_next(&mut self) {
        self.0 += 1;
    }
}

async fn loaded_loop() -> RenderLoop<&'static str> {
    let loader = SceneLoader::new(
        Arc::new(room_fetcher()),
        DecoderRegistry::new(DecoderConfig::default()),
    );
    let graph = loader
        .load(&SourceDescriptor::new(SCENE), &NoProgress)
        .await
        .unwrap();

    let mut scene = LiveScene::new("boombox");
    assert!(scene.attach(graph).is_some());

    RenderLoop::new(
        CameraState {
            position: Vec3::new(0.0, 0.0, 2.0),
            rotation: Vec3::ZERO,
            ..CameraState::default()
        },
        OrbitControls::new(Vec3::new(0.0, 0.0, -1.0), 0.05).with_damping(false),
        Viewport::new(800.0, 600.0),
        vec![
            SceneAnchor::new(Vec3::new(0.0, 0.0, -1.0), "boombox"),
            SceneAnchor::new(Vec3::new(0.5, 0.5, -1.0), "corner"),
        ],
        scene,
    )
}

#[tokio::test]
async fn test_tick_projects_anchors() {
    let mut frame_loop = loaded_loop().await;
    let mut renderer = CountingRenderer::default();
    let mut scheduler = CountingScheduler::default();

    for _ in 0..3 {
        assert!(frame_loop.tick(Duration::from_millis(16), &mut renderer, &mut scheduler));
    }
    assert_eq!(renderer.frames, 3);
    assert_eq!(scheduler.0, 3);

    let (name, x, y) = renderer.last_offsets[0];
    assert_eq!(name, "boombox");
    assert!(x.abs() < 1e-2 && y.abs() < 1e-2);

    // Up-right in the world is up-right on screen.
    let (name, x, y) = renderer.last_offsets[1];
    assert_eq!(name, "corner");
    assert!(x > 0.0 && y < 0.0);
}

#[tokio::test]
async fn test_pick_hits_loaded_boombox() {
    let frame_loop = loaded_loop().await;
    let boombox = frame_loop.scene().graph().find_by_name("boombox");

    let hit = frame_loop.pick(Vec2::new(420.0, 300.0)).unwrap();
    assert_eq!(Some(hit.node), boombox);
    assert!((hit.point.z + 1.0).abs() < 1e-4);
    assert!((hit.distance - 3.0).abs() < 1e-2);

    // The top-left corner of the window looks past the quad.
    assert!(frame_loop.pick(Vec2::new(5.0, 5.0)).is_none());
}

#[tokio::test]
async fn test_resize_changes_pick_mapping() {
    let mut frame_loop = loaded_loop().await;
    assert!(frame_loop.pick(Vec2::new(400.0, 290.0)).is_some());

    // In a much larger window the same pixel is far off-center.
    frame_loop.resize(Viewport::new(4000.0, 3000.0));
    assert!(frame_loop.pick(Vec2::new(400.0, 290.0)).is_none());
    assert!(frame_loop.pick(Vec2::new(2010.0, 1490.0)).is_some());

    frame_loop.resize(Viewport::new(0.0, 0.0));
    assert!(frame_loop.pick(Vec2::new(0.0, 0.0)).is_none());
}
