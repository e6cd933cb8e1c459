//! Loading overlay and point-of-interest markers.
//!
//! The overlay is a full-window backdrop with a progress bar and a
//! percentage label. Once the tracker starts fading, the bar collapses, the
//! backdrop fades out, and the whole overlay is removed after the configured
//! delay. Markers are shown once the scene is ready and the toggle is on.

use std::time::Duration;

use bevy::prelude::*;
use roomview::Phase;

use crate::launch_params::LaunchParams;
use crate::loader::LoadProgress;
use crate::view::{MARKER_SIZE, PoiMarker, Viewer};

/// How long the backdrop takes to fade out.
const FADE_DURATION: Duration = Duration::from_millis(1500);

/// Bar height in logical pixels.
const BAR_HEIGHT: f32 = 2.0;

/// Plugin for the loading overlay and markers.
pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_overlay, spawn_markers))
            .add_systems(Update, (update_overlay, update_marker_visibility));
    }
}

/// Whether point-of-interest markers may be shown.
#[derive(Resource, Debug, Clone, Copy)]
pub struct PoiVisible(pub bool);

/// Root of the loading overlay.
#[derive(Component)]
struct LoadingOverlay {
    /// Time since the fade started.
    fading_for: Option<Duration>,
    /// Remove the overlay after this long.
    removal_delay: Duration,
}

#[derive(Component)]
struct LoadingBar;

#[derive(Component)]
struct LoadingPercentage;

fn spawn_overlay(mut commands: Commands, params: Res<LaunchParams>) {
    commands
        .spawn((
            LoadingOverlay {
                fading_for: None,
                removal_delay: params.config.overlay_removal_delay(),
            },
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::BLACK),
            GlobalZIndex(10),
        ))
        .with_children(|overlay| {
            overlay.spawn((
                LoadingBar,
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(0.0),
                    top: Val::Percent(50.0),
                    width: Val::Percent(0.0),
                    height: Val::Px(BAR_HEIGHT),
                    ..default()
                },
                BackgroundColor(Color::WHITE),
            ));
            overlay.spawn((
                LoadingPercentage,
                Text::new("0 %"),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    margin: UiRect::top(Val::Px(48.0)),
                    ..default()
                },
            ));
        });
}

#[allow(clippy::needless_pass_by_value)]
fn spawn_markers(mut commands: Commands, params: Res<LaunchParams>) {
    for (index, point) in params.config.points.iter().enumerate() {
        commands
            .spawn((
                PoiMarker(index),
                Node {
                    position_type: PositionType::Absolute,
                    width: Val::Px(MARKER_SIZE),
                    height: Val::Px(MARKER_SIZE),
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    display: Display::None,
                    ..default()
                },
                BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.77)),
                Visibility::Hidden,
            ))
            .with_child((
                Text::new(point.label.clone()),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
    }
}

#[allow(clippy::needless_pass_by_value)]
fn update_overlay(
    mut commands: Commands,
    time: Res<Time>,
    progress: Res<LoadProgress>,
    mut overlay: Query<(Entity, &mut LoadingOverlay, &mut BackgroundColor)>,
    mut bar: Query<&mut Node, With<LoadingBar>>,
    mut percentage: Query<(&mut Text, &mut TextColor), With<LoadingPercentage>>,
) {
    let Ok((entity, mut state, mut backdrop)) = overlay.single_mut() else {
        return;
    };
    if progress.0.phase() == Phase::Failed {
        for (mut text, _) in &mut percentage {
            "load failed".clone_into(&mut text.0);
        }
        return;
    }
    let progress = progress.0.state();

    if progress.fading {
        let removal_delay = state.removal_delay;
        let fading_for = state.fading_for.get_or_insert(Duration::ZERO);
        *fading_for += time.delta();
        let alpha = 1.0 - (fading_for.as_secs_f32() / FADE_DURATION.as_secs_f32()).min(1.0);
        backdrop.0 = Color::srgba(0.0, 0.0, 0.0, alpha);
        for mut node in &mut bar {
            node.width = Val::Percent(0.0);
        }
        for (_, mut color) in &mut percentage {
            color.0 = Color::srgba(1.0, 1.0, 1.0, alpha);
        }
        if *fading_for >= removal_delay {
            commands.entity(entity).despawn();
        }
        return;
    }

    for mut node in &mut bar {
        node.width = Val::Percent(progress.ratio * 100.0);
    }
    for (mut text, _) in &mut percentage {
        text.0 = format!("{:.0} %", progress.ratio * 100.0);
    }
}

#[allow(clippy::needless_pass_by_value)]
fn update_marker_visibility(
    progress: Res<LoadProgress>,
    viewer: Res<Viewer>,
    visible: Res<PoiVisible>,
    mut markers: Query<&mut Visibility, With<PoiMarker>>,
) {
    let shown = progress.0.phase() == Phase::Ready
        && viewer.0.is_running()
        && visible.0;
    let target = if shown {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut visibility in &mut markers {
        visibility.set_if_neq(target);
    }
}
