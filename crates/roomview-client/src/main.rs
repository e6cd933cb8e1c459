//! Interactive 3D room viewer using Bevy.
//!
//! Loads a glTF room behind a progress overlay, orbits around it with the
//! mouse, labels points of interest, and highlights the pickable object when
//! it is clicked. Launch with `--debug` (or `#debug` on the web) for the
//! tuning panel.

mod async_runtime;
mod audio;
mod launch_params;
mod light;
mod loader;
mod mesh;
mod overlay;
mod picking;
mod ui;
mod view;

use async_runtime::AsyncRuntimePlugin;
use audio::{MusicPlugin, MusicState};
use bevy::prelude::*;
use launch_params::LaunchParams;
use light::SunlightPlugin;
use loader::{LoadProgress, SceneLoadPlugin};
use overlay::{OverlayPlugin, PoiVisible};
use picking::PickingPlugin;
use ui::DebugUiPlugin;
use view::{ViewPlugin, Viewer};

/// Plugin for the main application.
pub struct AppPlugin;

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            ViewPlugin,
            SceneLoadPlugin,
            SunlightPlugin,
            OverlayPlugin,
            PickingPlugin,
            MusicPlugin,
            DebugUiPlugin,
        ));
    }
}

/// Directory Bevy's own asset server reads from (music, fonts).
fn asset_file_path(params: &LaunchParams) -> String {
    let root = &params.config.asset_root;
    if cfg!(target_family = "wasm") || root.is_empty() || root.contains("://") {
        "assets".to_string()
    } else {
        root.clone()
    }
}

fn main() -> AppExit {
    // Initialize tracing for native platforms.
    #[cfg(not(target_family = "wasm"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Initialize tracing for WASM (logs to browser console).
    #[cfg(target_family = "wasm")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    let params = match launch_params::parse() {
        Ok(params) => params,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return AppExit::error();
        }
    };

    let mut app = App::new();

    #[allow(unused_mut)]
    let mut window = Window {
        title: "roomview".to_string(),
        resolution: (1280, 720).into(),
        position: WindowPosition::Centered(MonitorSelection::Primary),
        ..Default::default()
    };

    // WASM: Fit canvas to parent element and prevent browser event handling.
    #[cfg(target_family = "wasm")]
    {
        window.fit_canvas_to_parent = true;
        window.prevent_default_event_handling = true;
    }

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(window),
                ..Default::default()
            })
            .set(AssetPlugin {
                file_path: asset_file_path(&params),
                ..Default::default()
            }),
    );

    // Add async runtime (Tokio on native, the task pool on WASM).
    app.add_plugins(AsyncRuntimePlugin);

    app.insert_resource(Viewer::from_params(&params))
        .insert_resource(LoadProgress::from_params(&params))
        .insert_resource(MusicState::from_params(&params))
        .insert_resource(PoiVisible(params.config.show_points))
        .insert_resource(params);

    app.add_plugins(AppPlugin).run()
}
