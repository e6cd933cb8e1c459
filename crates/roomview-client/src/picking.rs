//! Click picking against the pickable object.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::launch_params::LaunchParams;
use crate::mesh::SceneEntities;
use crate::view::Viewer;

/// Plugin for click picking.
pub struct PickingPlugin;

impl Plugin for PickingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, pick_on_click);
    }
}

/// Recolour the hit node and log the click.
#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments)]
fn pick_on_click(
    mouse: Res<ButtonInput<MouseButton>>,
    window: Single<&Window, With<PrimaryWindow>>,
    mut contexts: EguiContexts,
    params: Res<LaunchParams>,
    viewer: Res<Viewer>,
    entities: Res<SceneEntities>,
    nodes: Query<&MeshMaterial3d<StandardMaterial>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !mouse.just_released(MouseButton::Left) {
        return;
    }
    let over_ui = contexts
        .ctx_mut()
        .ok()
        .is_some_and(|ctx| ctx.is_pointer_over_area());
    if over_ui {
        return;
    }
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Some(hit) = viewer.0.pick(cursor) else {
        return;
    };

    let [r, g, b] = params.config.highlight_color;
    if let Some(&entity) = entities.0.get(&hit.node)
        && let Ok(material) = nodes.get(entity)
        && let Some(mut material) = materials.get_mut(&material.0)
    {
        material.base_color = Color::linear_rgb(r, g, b);
    }

    tracing::info!(
        name = viewer.0.scene().pick_name(),
        node = hit.node.0,
        distance = hit.distance,
        "pickable object clicked"
    );
}
