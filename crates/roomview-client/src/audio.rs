//! Looping background music with a selectable track.

use bevy::audio::{AudioSinkPlayback, Volume};
use bevy::prelude::*;
use roomview::config::AudioSettings;

use crate::launch_params::LaunchParams;

/// Plugin for background music.
pub struct MusicPlugin;

impl Plugin for MusicPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (switch_track, apply_volume).chain());
    }
}

/// Music settings edited from the debug panel.
#[derive(Resource, Debug, Clone)]
pub struct MusicState {
    /// Linear volume in `[0, 1]`.
    pub volume: f32,
    /// Selected track name.
    pub track: String,
    /// Track currently playing, if any.
    playing: Option<String>,
    /// Tracks to choose from.
    pub settings: AudioSettings,
}

impl MusicState {
    /// Start with the configured track and volume.
    pub fn from_params(params: &LaunchParams) -> Self {
        let settings = params.config.audio.clone();
        Self {
            volume: settings.volume,
            track: settings.track.clone(),
            playing: None,
            settings,
        }
    }
}

/// Marker component for the music entity.
#[derive(Component)]
struct Music;

/// Restart playback when the selected track changes.
fn switch_track(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut state: ResMut<MusicState>,
    playing: Query<Entity, With<Music>>,
) {
    if state.playing.as_deref() == Some(state.track.as_str()) {
        return;
    }
    let Some(track) = state.settings.find(&state.track).cloned() else {
        tracing::warn!(track = %state.track, "unknown track");
        match state.playing.clone() {
            Some(name) => state.track = name,
            None => state.playing = Some(state.track.clone()),
        }
        return;
    };

    for entity in &playing {
        commands.entity(entity).despawn();
    }
    commands.spawn((
        Music,
        AudioPlayer::new(asset_server.load(track.path.clone())),
        PlaybackSettings::LOOP.with_volume(Volume::Linear(state.volume)),
    ));
    tracing::info!(track = %track.name, path = %track.path, "playing");
    state.playing = Some(track.name);
}

/// Apply volume changes to the playing track.
#[allow(clippy::needless_pass_by_value)]
fn apply_volume(state: Res<MusicState>, mut sinks: Query<&mut AudioSink, With<Music>>) {
    if !state.is_changed() {
        return;
    }
    for mut sink in &mut sinks {
        sink.set_volume(Volume::Linear(state.volume));
    }
}
