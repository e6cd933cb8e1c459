//! Directional sunlight for the room.

use bevy::light::light_consts::lux;
use bevy::prelude::*;

use crate::launch_params::LaunchParams;

/// Illuminance at intensity 1.
pub const SUN_LUX: f32 = lux::AMBIENT_DAYLIGHT;

/// Marker component for the sun, with its intensity multiplier.
#[derive(Component, Debug, Clone, Copy)]
pub struct Sun {
    pub intensity: f32,
}

/// Plugin spawning the sunlight.
pub struct SunlightPlugin;

impl Plugin for SunlightPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_sun)
            .add_systems(Update, apply_intensity);
    }
}

#[allow(clippy::needless_pass_by_value)]
fn spawn_sun(mut commands: Commands, params: Res<LaunchParams>) {
    let sunlight = &params.config.sunlight;
    commands.spawn((
        Sun {
            intensity: sunlight.intensity,
        },
        DirectionalLight {
            color: Color::WHITE,
            illuminance: SUN_LUX * sunlight.intensity,
            shadows_enabled: sunlight.shadows,
            ..default()
        },
        Transform::from_translation(Vec3::from_array(sunlight.position))
            .looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn apply_intensity(mut suns: Query<(&Sun, &mut DirectionalLight), Changed<Sun>>) {
    for (sun, mut light) in &mut suns {
        light.illuminance = SUN_LUX * sun.intensity;
    }
}
