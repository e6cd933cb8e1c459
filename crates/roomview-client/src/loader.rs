//! Async loading of the room scene.
//!
//! The load runs as a background task and reports back over two
//! `async_channel`s: progress events and the single-shot result. Systems on
//! the main thread drain both into the [`LoadProgress`] tracker and attach
//! the finished graph to the viewer.

use std::sync::Arc;

use bevy::prelude::*;
use roomview::{
    DecoderRegistry, Fetch, HttpFetcher, LoadEvent, LoadFailure, ProgressTracker, SceneGraph,
    SceneLoader, SourceDescriptor,
};

use crate::async_runtime::TaskSpawner;
use crate::launch_params::LaunchParams;
use crate::mesh::{SceneEntities, spawn_graph};
use crate::view::Viewer;

/// Default asset directory on native when no root is configured.
#[cfg(not(target_family = "wasm"))]
const DEFAULT_ASSET_DIR: &str = "assets";

/// Plugin for loading the scene.
pub struct SceneLoadPlugin;

impl Plugin for SceneLoadPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LoaderChannels>()
            .init_resource::<SceneEntities>()
            .add_systems(Startup, start_scene_load)
            .add_systems(
                Update,
                (receive_progress, receive_scene, advance_progress).chain(),
            );
    }
}

/// Loading progress, shared by the overlay and the debug panel.
#[derive(Resource, Debug)]
pub struct LoadProgress(pub ProgressTracker);

impl LoadProgress {
    /// A tracker using the configured settling delays.
    pub fn from_params(params: &LaunchParams) -> Self {
        Self(ProgressTracker::new(params.config.settle_config()))
    }
}

/// Channels for receiving load output from the background task.
#[derive(Resource)]
pub struct LoaderChannels {
    progress_tx: async_channel::Sender<LoadEvent>,
    progress_rx: async_channel::Receiver<LoadEvent>,
    result_tx: async_channel::Sender<Result<SceneGraph, LoadFailure>>,
    result_rx: async_channel::Receiver<Result<SceneGraph, LoadFailure>>,
}

impl Default for LoaderChannels {
    fn default() -> Self {
        let (progress_tx, progress_rx) = async_channel::unbounded();
        let (result_tx, result_rx) = async_channel::bounded(1);
        Self {
            progress_tx,
            progress_rx,
            result_tx,
            result_rx,
        }
    }
}

/// Pick a byte source for the asset root.
///
/// URLs are fetched over HTTP; on native anything else is a directory.
fn fetcher_for(asset_root: &str) -> Arc<dyn Fetch> {
    #[cfg(not(target_family = "wasm"))]
    if !asset_root.contains("://") {
        let root = if asset_root.is_empty() {
            DEFAULT_ASSET_DIR
        } else {
            asset_root
        };
        return Arc::new(roomview::FsFetcher::new(root));
    }
    Arc::new(HttpFetcher::new(asset_root))
}

#[allow(clippy::needless_pass_by_value)]
fn start_scene_load(
    params: Res<LaunchParams>,
    channels: Res<LoaderChannels>,
    spawner: TaskSpawner,
) {
    let config = &params.config;
    let loader = SceneLoader::new(
        fetcher_for(&config.asset_root),
        DecoderRegistry::with_builtin(config.decoder_config()),
    );
    let source = SourceDescriptor::new(config.scene.clone());
    let progress = channels.progress_tx.clone();
    let result = channels.result_tx.clone();

    tracing::info!(scene = %source.url, root = %config.asset_root, "loading scene");
    spawner.spawn(async move {
        let outcome = loader.load(&source, &progress).await;
        if result.send(outcome).await.is_err() {
            tracing::warn!("scene result receiver dropped");
        }
    });
}

fn drain_progress(channels: &LoaderChannels, progress: &mut LoadProgress) {
    while let Ok(event) = channels.progress_rx.try_recv() {
        progress.0.on_event(event);
    }
}

fn receive_progress(channels: Res<LoaderChannels>, mut progress: ResMut<LoadProgress>) {
    drain_progress(&channels, &mut progress);
}

#[allow(clippy::too_many_arguments)]
fn receive_scene(
    mut commands: Commands,
    params: Res<LaunchParams>,
    channels: Res<LoaderChannels>,
    mut progress: ResMut<LoadProgress>,
    mut viewer: ResMut<Viewer>,
    mut spawned: ResMut<SceneEntities>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Ok(outcome) = channels.result_rx.try_recv() else {
        return;
    };
    // Events sent before the result may have arrived after the last drain.
    drain_progress(&channels, &mut progress);

    match outcome {
        Ok(graph) => {
            viewer.0.scene_mut().attach(graph);
            spawn_graph(
                &mut commands,
                viewer.0.scene().graph(),
                &mut spawned,
                &mut meshes,
                &mut materials,
            );
            progress.0.on_all_sources_settled();
        }
        Err(e) => {
            progress.0.on_failure(&params.config.scene, e.to_string());
        }
    }
}

fn advance_progress(time: Res<Time>, mut progress: ResMut<LoadProgress>) {
    progress.0.advance(time.delta());
}

#[cfg(all(test, not(target_family = "wasm")))]
mod tests {
    use roomview::ViewerConfig;
    use roomview_decode::compression::KHR_DRACO_MESH_COMPRESSION;

    use super::*;

    #[test]
    fn test_native_build_registers_draco() {
        let registry = DecoderRegistry::with_builtin(ViewerConfig::default().decoder_config());
        assert!(registry.supports(KHR_DRACO_MESH_COMPRESSION));
    }
}
