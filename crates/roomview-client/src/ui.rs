//! Debug panel for tuning the scene while it runs.
//!
//! Tabs cover the sunlight, the camera, the point-of-interest toggle, the
//! music, and a status readout. The panel only shows when the viewer was
//! launched in debug mode; the egui context is always present because
//! input systems ask it whether the pointer is over the UI.

use std::f32::consts::PI;

use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, EguiPrimaryContextPass, egui};
use roomview::{CameraEdit, Phase};

use crate::audio::MusicState;
use crate::launch_params::LaunchParams;
use crate::light::Sun;
use crate::loader::LoadProgress;
use crate::overlay::PoiVisible;
use crate::view::Viewer;

/// Plugin for the debug panel.
pub struct DebugUiPlugin;

impl Plugin for DebugUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin::default())
            .add_plugins(FrameTimeDiagnosticsPlugin::default())
            .init_resource::<DebugUiState>()
            .add_systems(
                EguiPrimaryContextPass,
                debug_ui_system.run_if(|params: Res<LaunchParams>| params.debug),
            );
    }
}

/// Which tab is currently selected in the debug panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DebugTab {
    #[default]
    Sunlight,
    Camera,
    Points,
    Audio,
    Status,
}

#[derive(Resource, Default)]
struct DebugUiState {
    selected_tab: DebugTab,
}

#[derive(SystemParam)]
struct SceneParams<'w, 's> {
    viewer: ResMut<'w, Viewer>,
    progress: Res<'w, LoadProgress>,
    poi_visible: ResMut<'w, PoiVisible>,
    sun: Query<'w, 's, (&'static mut Sun, &'static mut Transform)>,
}

fn debug_ui_system(
    mut contexts: EguiContexts,
    mut ui_state: ResMut<DebugUiState>,
    mut scene: SceneParams,
    mut music: ResMut<MusicState>,
    diagnostics: Res<DiagnosticsStore>,
) -> Result {
    let ctx = contexts.ctx_mut()?;

    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                for (tab, label) in [
                    (DebugTab::Sunlight, "Sunlight"),
                    (DebugTab::Camera, "Camera"),
                    (DebugTab::Points, "Points"),
                    (DebugTab::Audio, "Audio"),
                    (DebugTab::Status, "Status"),
                ] {
                    if ui
                        .selectable_label(ui_state.selected_tab == tab, label)
                        .clicked()
                    {
                        ui_state.selected_tab = tab;
                    }
                }
            });
            ui.separator();

            match ui_state.selected_tab {
                DebugTab::Sunlight => render_sunlight_tab(ui, &mut scene),
                DebugTab::Camera => render_camera_tab(ui, &mut scene),
                DebugTab::Points => {
                    ui.checkbox(&mut scene.poi_visible.0, "Show points of interest");
                }
                DebugTab::Audio => render_audio_tab(ui, &mut music),
                DebugTab::Status => render_status_tab(ui, &scene, &diagnostics),
            }
        });

    Ok(())
}

fn render_sunlight_tab(ui: &mut egui::Ui, scene: &mut SceneParams) {
    let Ok((mut sun, mut transform)) = scene.sun.single_mut() else {
        ui.label("No sunlight");
        return;
    };

    let mut position = transform.translation;
    if vec3_sliders(ui, "Position", &mut position, -10.0..=10.0) {
        *transform = Transform::from_translation(position).looking_at(Vec3::ZERO, Vec3::Y);
    }

    let mut intensity = sun.intensity;
    let changed = ui
        .horizontal(|ui| {
            ui.label("Intensity:");
            ui.add(egui::Slider::new(&mut intensity, 0.0..=2.0)).changed()
        })
        .inner;
    if changed {
        sun.intensity = intensity;
    }
}

fn render_camera_tab(ui: &mut egui::Ui, scene: &mut SceneParams) {
    let camera = *scene.viewer.0.camera();
    let mut edits = Vec::new();

    let mut position = camera.position;
    if vec3_sliders(ui, "Position", &mut position, -10.0..=10.0) {
        edits.push(CameraEdit::Position(position));
    }
    let mut rotation = camera.rotation;
    if vec3_sliders(ui, "Rotation", &mut rotation, -PI..=PI) {
        edits.push(CameraEdit::Rotation(rotation));
    }
    ui.label("Orbit controls re-aim the camera at their target every frame.");

    ui.separator();

    let mut fov = camera.fov;
    let mut near = camera.near;
    let mut far = camera.far;
    egui::Grid::new("camera_projection").show(ui, |ui| {
        ui.label("FOV:");
        if ui.add(egui::Slider::new(&mut fov, 10.0..=100.0)).changed() {
            edits.push(CameraEdit::Fov(fov));
        }
        ui.end_row();
        ui.label("Near:");
        if ui
            .add(egui::Slider::new(&mut near, 0.01..=10.0).logarithmic(true))
            .changed()
        {
            edits.push(CameraEdit::Near(near));
        }
        ui.end_row();
        ui.label("Far:");
        if ui.add(egui::Slider::new(&mut far, 10.0..=200.0)).changed() {
            edits.push(CameraEdit::Far(far));
        }
        ui.end_row();
    });

    let camera = scene.viewer.0.camera_mut();
    for edit in edits {
        camera.apply(edit);
    }
}

fn render_audio_tab(ui: &mut egui::Ui, music: &mut ResMut<MusicState>) {
    let mut volume = music.volume;
    let changed = ui
        .horizontal(|ui| {
            ui.label("Volume:");
            ui.add(egui::Slider::new(&mut volume, 0.0..=1.0)).changed()
        })
        .inner;
    if changed {
        music.volume = volume;
    }

    let mut track = music.track.clone();
    ui.horizontal(|ui| {
        ui.label("Track:");
        egui::ComboBox::from_id_salt("music_track")
            .selected_text(track.clone())
            .show_ui(ui, |ui| {
                for option in &music.settings.tracks {
                    ui.selectable_value(&mut track, option.name.clone(), option.name.as_str());
                }
            });
    });
    if track != music.track {
        music.track = track;
    }
}

fn render_status_tab(ui: &mut egui::Ui, scene: &SceneParams, diagnostics: &DiagnosticsStore) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(bevy::diagnostic::Diagnostic::smoothed)
        .unwrap_or(0.0);
    let progress = scene.progress.0.state();
    let phase = match scene.progress.0.phase() {
        Phase::Loading => "Loading",
        Phase::Settling => "Settling",
        Phase::Ready => "Ready",
        Phase::Failed => "Failed",
    };
    let live = scene.viewer.0.scene();

    ui.label(format!("FPS: {fps:.0}"));
    ui.label(format!("Frames: {}", scene.viewer.0.frame_count()));
    ui.label(format!("Progress: {:.0} % ({phase})", progress.ratio * 100.0));
    if let Some(failure) = scene.progress.0.failure() {
        ui.colored_label(egui::Color32::LIGHT_RED, failure);
    }
    ui.label(format!("Nodes: {}", live.graph().len()));
    match live.pick_target() {
        Some(target) => ui.label(format!(
            "Pick target: {} (node {}, {} triangles)",
            live.pick_name(),
            target.node.0,
            target.triangles.len()
        )),
        None => ui.label(format!("Pick target: {} (unresolved)", live.pick_name())),
    };
}

/// Render drag values for a Vec3 within `range`.
///
/// Returns true if any component was changed.
fn vec3_sliders(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut Vec3,
    range: std::ops::RangeInclusive<f32>,
) -> bool {
    let mut changed = false;
    ui.label(label);
    ui.horizontal(|ui| {
        for (axis, component) in [("X:", &mut value.x), ("Y:", &mut value.y), ("Z:", &mut value.z)] {
            ui.label(axis);
            changed |= ui
                .add(
                    egui::DragValue::new(component)
                        .range(range.clone())
                        .speed(0.1),
                )
                .changed();
        }
    });
    changed
}
