//! Async scene loading and per-frame interaction for the room viewer.
//!
//! This crate loads a glTF room scene through a pluggable byte source,
//! aggregates loading progress into a single ratio, and provides the
//! per-frame pieces a renderer needs: camera state, orbit controls, screen
//! projection of anchors and picking against one designated object.
//!
//! # Design principles
//!
//! - **Web-compatible**: Works on desktop and WASM via reqwest
//! - **Runtime-agnostic**: Loading is a plain future, works with any executor
//! - **Renderer-agnostic**: The frame loop draws through a [`Renderer`] trait
//!   and reschedules through a [`FrameScheduler`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use roomview::{HttpFetcher, NoProgress, SceneLoader, SourceDescriptor, ViewerConfig};
//! use roomview_decode::DecoderRegistry;
//!
//! let config = ViewerConfig::default();
//! let loader = SceneLoader::new(
//!     Arc::new(HttpFetcher::new("http://localhost:8080")),
//!     DecoderRegistry::with_builtin(config.decoder_config()),
//! );
//! let graph = loader.load(&SourceDescriptor::new(&config.scene), &NoProgress).await?;
//! ```

pub mod camera;
pub mod config;
pub mod controls;
mod error;
pub mod fetch;
pub mod frame;
pub mod loader;
pub mod picking;
pub mod progress;
pub mod projector;
pub mod scene;

pub use camera::{CameraEdit, CameraState, Viewport};
pub use config::{ConfigError, ViewerConfig};
pub use controls::OrbitControls;
pub use error::{LoadFailure, Result};
#[cfg(not(target_family = "wasm"))]
pub use fetch::FsFetcher;
pub use fetch::{Fetch, FetchFuture, HttpFetcher, MemoryFetcher};
pub use frame::{Frame, FrameScheduler, RenderLoop, Renderer};
pub use loader::{SceneLoader, SourceDescriptor};
pub use picking::{Hit, PickTarget, Ray, pick};
pub use progress::{
    LoadEvent, NoProgress, Phase, ProgressSink, ProgressState, ProgressTracker, SettleConfig,
};
pub use projector::{ProjectedAnchor, SceneAnchor, ScreenOffset, ScreenProjector};
pub use scene::LiveScene;

// Re-export decode types for convenience.
pub use roomview_decode::{Aabb, DecoderConfig, DecoderRegistry, NodeId, SceneGraph};
