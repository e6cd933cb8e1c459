//! Drives the frame loop from Bevy's schedule.
//!
//! The [`Viewer`] resource owns the camera, orbit controls, anchors and live
//! scene. Each `Update` runs one tick; its renderer copies the camera into
//! the Bevy camera entity and moves the point-of-interest markers.

use std::f32::consts::TAU;

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, RequestRedraw};
use bevy_egui::EguiContexts;
use roomview::{Frame, FrameScheduler, LiveScene, RenderLoop, Renderer, Viewport};

use crate::launch_params::LaunchParams;

/// Marker size in logical pixels; markers are centered on their anchor.
pub const MARKER_SIZE: f32 = 40.0;

/// The frame loop, with anchors tagged by point-of-interest index.
#[derive(Resource)]
pub struct Viewer(pub RenderLoop<usize>);

impl Viewer {
    /// Build the loop from the launch configuration.
    pub fn from_params(params: &LaunchParams) -> Self {
        let config = &params.config;
        Self(RenderLoop::new(
            config.camera_state(),
            config.orbit_controls(),
            Viewport::new(0.0, 0.0),
            config.anchors(),
            LiveScene::new(config.pickable.clone()),
        ))
    }
}

/// Marker component for the viewer camera.
#[derive(Component)]
pub struct ViewerCamera;

/// A point-of-interest marker, by anchor index.
#[derive(Component)]
pub struct PoiMarker(pub usize);

/// Plugin running the frame loop.
pub struct ViewPlugin;

impl Plugin for ViewPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera).add_systems(
            Update,
            (sync_viewport, orbit_input, tick_viewer).chain(),
        );
    }
}

fn spawn_camera(mut commands: Commands, viewer: Res<Viewer>) {
    let camera = viewer.0.camera();
    commands.spawn((
        ViewerCamera,
        Camera3d::default(),
        Transform::from_matrix(camera.world_matrix()),
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov.to_radians(),
            near: camera.near,
            far: camera.far,
            ..default()
        }),
    ));
}

/// Follow the window size; every later projection and pick uses it.
fn sync_viewport(window: Single<&Window, With<PrimaryWindow>>, mut viewer: ResMut<Viewer>) {
    let viewport = Viewport::new(window.width(), window.height());
    if viewport != viewer.0.viewport() {
        viewer.0.resize(viewport);
    }
}

/// Feed mouse drag and wheel input into the orbit controls.
fn orbit_input(
    mouse: Res<ButtonInput<MouseButton>>,
    mut motion: MessageReader<MouseMotion>,
    mut wheel: MessageReader<MouseWheel>,
    mut contexts: EguiContexts,
    mut viewer: ResMut<Viewer>,
) {
    let delta: Vec2 = motion.read().map(|e| e.delta).sum();
    // Normalize scroll value: web reports pixels, native reports lines.
    let scroll: f32 = wheel
        .read()
        .map(|e| match e.unit {
            MouseScrollUnit::Line => e.y,
            MouseScrollUnit::Pixel => e.y / 120.0,
        })
        .sum();

    let over_ui = contexts
        .ctx_mut()
        .ok()
        .is_some_and(|ctx| ctx.is_pointer_over_area());
    let height = viewer.0.viewport().height;
    if over_ui || height <= 0.0 {
        return;
    }

    let controls = viewer.0.controls_mut();
    if mouse.pressed(MouseButton::Left) && delta != Vec2::ZERO {
        controls.rotate_left(TAU * delta.x / height);
        controls.rotate_up(TAU * delta.y / height);
    }
    if scroll != 0.0 {
        controls.dolly(scroll);
    }
}

/// Copies each frame into the Bevy world.
struct BevyRenderer<'a, 'w, 's> {
    transform: &'a mut Transform,
    projection: &'a mut Projection,
    markers: &'a mut Query<'w, 's, (&'static PoiMarker, &'static mut Node)>,
}

impl Renderer<usize> for BevyRenderer<'_, '_, '_> {
    fn draw(&mut self, frame: &Frame<'_, usize>) {
        *self.transform = Transform::from_matrix(frame.camera.world_matrix());
        if let Projection::Perspective(perspective) = &mut *self.projection {
            perspective.fov = frame.camera.fov.to_radians();
            perspective.near = frame.camera.near;
            perspective.far = frame.camera.far;
            perspective.aspect_ratio = frame.viewport.aspect();
        }

        for (marker, mut node) in self.markers.iter_mut() {
            let Some(projected) = frame.anchors.iter().find(|a| a.overlay == marker.0) else {
                node.display = Display::None;
                continue;
            };
            let (left, top) = projected.offset.to_top_left(frame.viewport);
            node.display = Display::Flex;
            node.left = Val::Px(left - MARKER_SIZE * 0.5);
            node.top = Val::Px(top - MARKER_SIZE * 0.5);
        }
    }
}

/// Asks winit for another frame.
struct RedrawScheduler<'a, 'w> {
    redraw: &'a mut MessageWriter<'w, RequestRedraw>,
}

impl FrameScheduler for RedrawScheduler<'_, '_> {
    fn schedule_next(&mut self) {
        self.redraw.write(RequestRedraw);
    }
}

fn tick_viewer(
    time: Res<Time>,
    mut viewer: ResMut<Viewer>,
    camera: Single<(&mut Transform, &mut Projection), With<ViewerCamera>>,
    mut markers: Query<(&'static PoiMarker, &'static mut Node)>,
    mut redraw: MessageWriter<RequestRedraw>,
) {
    let (mut transform, mut projection) = camera.into_inner();
    let mut renderer = BevyRenderer {
        transform: &mut transform,
        projection: &mut projection,
        markers: &mut markers,
    };
    let mut scheduler = RedrawScheduler {
        redraw: &mut redraw,
    };
    viewer.0.tick(time.delta(), &mut renderer, &mut scheduler);
}
