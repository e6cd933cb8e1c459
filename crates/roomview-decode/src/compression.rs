//! Side-channel geometry decoders for compressed primitives.
//!
//! A primitive that carries a compression extension stores its geometry in a
//! buffer view that only an extension-specific decoder understands. Decoders
//! are registered once per process in a [`DecoderRegistry`] keyed by the
//! extension name, and looked up while the scene graph is built.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;

use crate::error::DecodeResult;

/// Extension name for Draco mesh compression.
pub const KHR_DRACO_MESH_COMPRESSION: &str = "KHR_draco_mesh_compression";

/// Location of the external decoder assets, fixed at startup.
///
/// Decoders that fetch helper assets at runtime resolve them under
/// `decoder_path`. The built-in Draco decoder is compiled in and reads
/// nothing from it; the path is still carried so a registry can be inspected
/// and logged with the configuration it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Path (relative to the asset root) where decoder assets live.
    pub decoder_path: String,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            decoder_path: "draco/".to_string(),
        }
    }
}

/// Component type of a compressed attribute, from its accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Size of one component in bytes.
    #[must_use]
    pub fn size_in_bytes(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

/// One attribute stored in a compressed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedAttribute {
    /// glTF semantic such as `POSITION`.
    pub semantic: String,
    /// Attribute id inside the compressed payload.
    pub id: u32,
    /// Components per vertex.
    pub components: usize,
    /// Component type of the uncompressed accessor.
    pub component_type: ComponentType,
}

/// What the document says about a compressed primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedPrimitive {
    /// Vertex count of the uncompressed POSITION accessor.
    pub vertex_count: usize,
    /// Index count of the uncompressed index accessor (or `vertex_count`
    /// when the primitive is not indexed).
    pub index_count: usize,
    /// Compressed attributes, sorted by id.
    pub attributes: Vec<CompressedAttribute>,
}

impl CompressedPrimitive {
    /// The compressed attribute for a semantic such as `POSITION`.
    #[must_use]
    pub fn attribute(&self, semantic: &str) -> Option<&CompressedAttribute> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }
}

/// Geometry produced by a decoder, as an indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedGeometry {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangle list indices into `positions`.
    pub indices: Vec<u32>,
}

/// A decoder for one geometry compression extension.
pub trait GeometryDecoder: Send + Sync {
    /// The extension name this decoder handles.
    fn extension(&self) -> &str;

    /// Decode the compressed payload of one primitive.
    fn decode(&self, payload: &[u8], primitive: &CompressedPrimitive)
    -> DecodeResult<DecodedGeometry>;
}

/// The set of geometry decoders available to the loader.
#[derive(Default)]
pub struct DecoderRegistry {
    config: DecoderConfig,
    decoders: HashMap<String, Box<dyn GeometryDecoder>>,
}

impl DecoderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            decoders: HashMap::new(),
        }
    }

    /// Create a registry with every decoder compiled into this build.
    #[must_use]
    pub fn with_builtin(config: DecoderConfig) -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new(config);
        #[cfg(feature = "draco")]
        registry.register(crate::draco::DracoDecoder);
        registry
    }

    /// Register a decoder, replacing any decoder for the same extension.
    pub fn register(&mut self, decoder: impl GeometryDecoder + 'static) {
        let extension = decoder.extension().to_string();
        tracing::debug!(
            %extension,
            decoder_path = %self.config.decoder_path,
            "registered geometry decoder"
        );
        self.decoders.insert(extension, Box::new(decoder));
    }

    /// Builder form of [`DecoderRegistry::register`].
    #[must_use]
    pub fn with(mut self, decoder: impl GeometryDecoder + 'static) -> Self {
        self.register(decoder);
        self
    }

    /// The decoder registered for `extension`, if any.
    #[must_use]
    pub fn get(&self, extension: &str) -> Option<&dyn GeometryDecoder> {
        self.decoders.get(extension).map(Box::as_ref)
    }

    /// Whether a decoder exists for `extension`.
    #[must_use]
    pub fn supports(&self, extension: &str) -> bool {
        self.decoders.contains_key(extension)
    }

    /// The decoder asset configuration.
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        f.debug_struct("DecoderRegistry")
            .field("config", &self.config)
            .field("extensions", &extensions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    fn position(id: u32) -> CompressedAttribute {
        CompressedAttribute {
            semantic: "POSITION".to_string(),
            id,
            components: 3,
            component_type: ComponentType::F32,
        }
    }

    fn normal(id: u32) -> CompressedAttribute {
        CompressedAttribute {
            semantic: "NORMAL".to_string(),
            ..position(id)
        }
    }

    impl GeometryDecoder for Fixed {
        fn extension(&self) -> &str {
            KHR_DRACO_MESH_COMPRESSION
        }

        fn decode(
            &self,
            _payload: &[u8],
            primitive: &CompressedPrimitive,
        ) -> DecodeResult<DecodedGeometry> {
            Ok(DecodedGeometry {
                positions: vec![Vec3::ZERO; primitive.vertex_count],
                indices: (0..u32::try_from(primitive.index_count).unwrap_or(0)).collect(),
            })
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = DecoderRegistry::new(DecoderConfig::default()).with(Fixed);
        assert!(registry.supports(KHR_DRACO_MESH_COMPRESSION));
        assert!(registry.get("EXT_meshopt_compression").is_none());

        let decoded = registry
            .get(KHR_DRACO_MESH_COMPRESSION)
            .unwrap()
            .decode(
                &[],
                &CompressedPrimitive {
                    vertex_count: 3,
                    index_count: 3,
                    attributes: vec![position(0)],
                },
            )
            .unwrap();
        assert_eq!(decoded.positions.len(), 3);
        assert_eq!(decoded.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_attribute_lookup() {
        let primitive = CompressedPrimitive {
            vertex_count: 0,
            index_count: 0,
            attributes: vec![position(0), normal(1)],
        };
        assert_eq!(primitive.attribute("NORMAL").map(|a| a.id), Some(1));
        assert!(primitive.attribute("TEXCOORD_0").is_none());
        assert_eq!(ComponentType::U16.size_in_bytes(), 2);
    }

    #[cfg(feature = "draco")]
    #[test]
    fn test_builtin_registry_decodes_draco() {
        let registry = DecoderRegistry::with_builtin(DecoderConfig {
            decoder_path: "vendor/draco/".to_string(),
        });
        assert!(registry.supports(KHR_DRACO_MESH_COMPRESSION));
        assert_eq!(registry.config().decoder_path, "vendor/draco/");
    }

    #[cfg(not(feature = "draco"))]
    #[test]
    fn test_builtin_registry_without_draco_feature() {
        let registry = DecoderRegistry::with_builtin(DecoderConfig::default());
        assert!(!registry.supports(KHR_DRACO_MESH_COMPRESSION));
    }

    #[test]
    fn test_default_decoder_path() {
        let registry = DecoderRegistry::new(DecoderConfig::default());
        assert_eq!(registry.config().decoder_path, "draco/");
        assert!(format!("{registry:?}").contains("draco/"));
    }
}
