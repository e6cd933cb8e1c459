//! Viewer configuration.
//!
//! Every field has a default matching the stock room scene, so a config
//! file only needs the fields it changes:
//!
//! ```json
//! { "camera": { "fov": 60.0 }, "audio": { "volume": 0.2 } }
//! ```

use std::fmt;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use roomview_decode::DecoderConfig;

use crate::camera::CameraState;
use crate::controls::OrbitControls;
use crate::progress::SettleConfig;
use crate::projector::SceneAnchor;

/// Errors from loading a configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be read.
    Io {
        /// The path that failed.
        path: String,
        /// The error message.
        message: String,
    },
    /// The file is not valid JSON for this schema.
    Parse {
        /// The error message.
        message: String,
    },
    /// A value is out of range.
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        detail: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => write!(f, "reading {path} failed: {message}"),
            ConfigError::Parse { message } => write!(f, "invalid config: {message}"),
            ConfigError::Invalid { field, detail } => write!(f, "invalid {field}: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse {
            message: e.to_string(),
        }
    }
}

/// Top-level viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Scene description path, relative to the asset root.
    pub scene: String,
    /// Asset root: a URL prefix or a local directory.
    pub asset_root: String,
    /// Location of external geometry decoder assets, relative to the asset
    /// root. Unused by the built-in Draco decoder.
    pub decoder_path: String,
    /// Name of the one pickable node.
    pub pickable: String,
    /// Linear RGB colour applied to the pickable object when clicked.
    pub highlight_color: [f32; 3],
    /// Loading overlay timings.
    pub loading: LoadingSettings,
    /// Initial camera and orbit controls.
    pub camera: CameraSettings,
    /// Directional sunlight.
    pub sunlight: SunlightSettings,
    /// Points of interest.
    pub points: Vec<PointSettings>,
    /// Show point-of-interest markers.
    pub show_points: bool,
    /// Background music.
    pub audio: AudioSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scene: "models/roomScene.gltf".to_string(),
            asset_root: String::new(),
            decoder_path: "draco/".to_string(),
            pickable: "boombox".to_string(),
            highlight_color: [0.0, 1.0, 0.0],
            loading: LoadingSettings::default(),
            camera: CameraSettings::default(),
            sunlight: SunlightSettings::default(),
            points: vec![
                PointSettings::new("1", [8.0, 7.0, 7.0]),
                PointSettings::new("2", [-8.0, 6.0, -5.0]),
                PointSettings::new("3", [4.0, 6.0, -5.0]),
            ],
            show_points: true,
            audio: AudioSettings::default(),
        }
    }
}

/// Loading overlay timings, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingSettings {
    /// Delay after loading before the overlay fades.
    pub fade_delay_ms: u64,
    /// Delay after loading before the scene is ready.
    pub ready_delay_ms: u64,
    /// Delay after the fade starts before the overlay is removed.
    pub removal_delay_ms: u64,
}

impl Default for LoadingSettings {
    fn default() -> Self {
        Self {
            fade_delay_ms: 500,
            ready_delay_ms: 3500,
            removal_delay_ms: 5000,
        }
    }
}

/// Initial camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: [f32; 3],
    /// Euler angles in radians.
    pub rotation: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Orbit pivot.
    pub target: [f32; 3],
    /// Orbit damping factor.
    pub damping: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        let camera = CameraState::default();
        Self {
            position: camera.position.to_array(),
            rotation: camera.rotation.to_array(),
            fov: camera.fov,
            near: camera.near,
            far: camera.far,
            target: [0.0; 3],
            damping: 0.05,
        }
    }
}

/// Directional sunlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunlightSettings {
    /// Light position; the light points at the origin.
    pub position: [f32; 3],
    pub intensity: f32,
    pub shadows: bool,
}

impl Default for SunlightSettings {
    fn default() -> Self {
        Self {
            position: [5.0, 10.0, 7.0],
            intensity: 1.0,
            shadows: true,
        }
    }
}

/// One point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSettings {
    /// Marker text.
    pub label: String,
    /// World-space position.
    pub position: [f32; 3],
}

impl PointSettings {
    /// Create a point.
    #[must_use]
    pub fn new(label: impl Into<String>, position: [f32; 3]) -> Self {
        Self {
            label: label.into(),
            position,
        }
    }
}

/// Background music.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Linear volume in `[0, 1]`.
    pub volume: f32,
    /// Name of the track playing at startup.
    pub track: String,
    /// Selectable tracks.
    pub tracks: Vec<TrackSettings>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 0.5,
            track: "Lo-Fi".to_string(),
            tracks: vec![
                TrackSettings::new("Lo-Fi", "audio/lofi.mp3"),
                TrackSettings::new("Chill", "audio/chill.mp3"),
                TrackSettings::new("Classical", "audio/classical.mp3"),
            ],
        }
    }
}

impl AudioSettings {
    /// The track called `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&TrackSettings> {
        self.tracks.iter().find(|t| t.name == name)
    }
}

/// A selectable track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSettings {
    /// Name shown in the track selector.
    pub name: String,
    /// Audio file path, relative to the asset root.
    pub path: String,
}

impl TrackSettings {
    /// Create a track.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    #[cfg(not(target_family = "wasm"))]
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Check value ranges the rest of the viewer relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, detail: String| Err(ConfigError::Invalid { field, detail });
        let camera = &self.camera;
        let scalars = [
            ("camera.fov", camera.fov),
            ("camera.near", camera.near),
            ("camera.far", camera.far),
            ("camera.damping", camera.damping),
            ("sunlight.intensity", self.sunlight.intensity),
            ("audio.volume", self.audio.volume),
        ];
        if let Some((field, value)) = scalars.into_iter().find(|(_, v)| !v.is_finite()) {
            return invalid(field, format!("{value} is not finite"));
        }
        let vectors = [
            ("camera.position", camera.position),
            ("camera.rotation", camera.rotation),
            ("camera.target", camera.target),
            ("sunlight.position", self.sunlight.position),
        ];
        if let Some((field, value)) = vectors
            .into_iter()
            .find(|(_, v)| v.iter().any(|c| !c.is_finite()))
        {
            return invalid(field, format!("{value:?} is not finite"));
        }
        if let Some(point) = self
            .points
            .iter()
            .find(|p| p.position.iter().any(|c| !c.is_finite()))
        {
            return invalid("points", format!("point {} is not finite", point.label));
        }
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return invalid("camera.fov", format!("{} is not in (0, 180)", camera.fov));
        }
        if camera.near <= 0.0 {
            return invalid("camera.near", format!("{} must be positive", camera.near));
        }
        if camera.far <= camera.near {
            return invalid(
                "camera.far",
                format!("{} must exceed near {}", camera.far, camera.near),
            );
        }
        if !(0.0..=1.0).contains(&camera.damping) {
            return invalid("camera.damping", format!("{} is not in [0, 1]", camera.damping));
        }
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return invalid("audio.volume", format!("{} is not in [0, 1]", self.audio.volume));
        }
        if self.audio.find(&self.audio.track).is_none() {
            return invalid("audio.track", format!("no track named {}", self.audio.track));
        }
        if self.scene.is_empty() {
            return invalid("scene", "must not be empty".to_string());
        }
        Ok(())
    }

    /// Settling delays for the progress tracker.
    #[must_use]
    pub fn settle_config(&self) -> SettleConfig {
        SettleConfig {
            fade_delay: Duration::from_millis(self.loading.fade_delay_ms),
            ready_delay: Duration::from_millis(self.loading.ready_delay_ms),
        }
    }

    /// Delay between the start of the fade and removal of the overlay.
    #[must_use]
    pub fn overlay_removal_delay(&self) -> Duration {
        Duration::from_millis(self.loading.removal_delay_ms)
    }

    /// The initial camera.
    #[must_use]
    pub fn camera_state(&self) -> CameraState {
        CameraState {
            position: Vec3::from_array(self.camera.position),
            rotation: Vec3::from_array(self.camera.rotation),
            fov: self.camera.fov,
            near: self.camera.near,
            far: self.camera.far,
        }
    }

    /// Where geometry decoders find their assets.
    #[must_use]
    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            decoder_path: self.decoder_path.clone(),
        }
    }

    /// Orbit controls around the configured target.
    #[must_use]
    pub fn orbit_controls(&self) -> OrbitControls {
        OrbitControls::new(Vec3::from_array(self.camera.target), self.camera.damping)
    }

    /// Points of interest as anchors, tagged with their index.
    #[must_use]
    pub fn anchors(&self) -> Vec<SceneAnchor<usize>> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| SceneAnchor::new(Vec3::from_array(p.position), i))
            .collect()
    }
}
