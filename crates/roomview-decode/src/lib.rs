//! Decoding of glTF scene descriptions into an indexed scene graph.
//!
//! This crate turns the bytes of a `.gltf` or `.glb` file (plus any external
//! buffers) into a [`SceneGraph`]: an arena of named nodes with composed
//! world transforms and triangle-list meshes.
//!
//! # Design principles
//!
//! - **Sync decoding**: Every function is synchronous; fetching is the
//!   caller's job
//! - **Two-step parse**: [`document::parse`] reports external buffers before
//!   [`document::GltfDocument::into_scene`] consumes them
//! - **Pluggable compression**: Compressed primitives go through a
//!   [`GeometryDecoder`] registered in a [`DecoderRegistry`]
//!
//! # Example
//!
//! ```ignore
//! use std::collections::HashMap;
//! use roomview_decode::{DecoderConfig, DecoderRegistry, document};
//!
//! let registry = DecoderRegistry::with_builtin(DecoderConfig::default());
//! let parsed = document::parse(&bytes, &registry)?;
//! let scene = parsed.into_scene(HashMap::new(), &registry)?;
//! let boombox = scene.find_by_name("boombox");
//! ```

pub mod aabb;
pub mod compression;
pub mod document;
#[cfg(feature = "draco")]
pub mod draco;
mod error;
pub mod graph;
pub mod topology;

pub use aabb::Aabb;
pub use compression::{
    ComponentType, CompressedAttribute, CompressedPrimitive, DecodedGeometry, DecoderConfig,
    DecoderRegistry, GeometryDecoder, KHR_DRACO_MESH_COMPRESSION,
};
pub use document::{BufferSource, GltfDocument};
pub use error::{DecodeError, DecodeResult};
pub use graph::{MeshId, NodeId, SceneGraph, SceneGraphBuilder, SceneNode, TriangleMesh};
