//! glTF 2.0 documents to [`SceneGraph`].
//!
//! Decoding happens in two steps so the caller can fetch external buffers
//! in between:
//!
//! 1. [`parse`] reads the JSON or GLB container and reports which buffers
//!    live outside the document ([`GltfDocument::buffer_sources`]).
//! 2. [`GltfDocument::into_scene`] takes the fetched bytes, resolves data
//!    URIs and the GLB blob, and builds the scene graph. Compressed
//!    primitives are routed through the [`DecoderRegistry`].

use std::collections::{HashMap, HashSet};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use glam::{Mat4, Vec3};
use gltf::accessor::{DataType, Dimensions};
use gltf::mesh::{Mode, Semantic};

use crate::compression::{
    ComponentType, CompressedAttribute, CompressedPrimitive, DecodedGeometry, DecoderRegistry,
    KHR_DRACO_MESH_COMPRESSION,
};
use crate::error::{DecodeError, DecodeResult};
use crate::graph::{MeshId, NodeId, SceneGraph, SceneGraphBuilder, TriangleMesh};
use crate::topology::{fan_to_triangles, strip_to_triangles};

/// Compression extensions that need a side-channel decoder.
const COMPRESSION_EXTENSIONS: &[&str] = &[KHR_DRACO_MESH_COMPRESSION, "EXT_meshopt_compression"];

/// Where a buffer's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferSource {
    /// The binary chunk of a GLB container.
    Embedded,
    /// A `data:` URI inside the document.
    DataUri,
    /// A URI relative to the document that must be fetched.
    External(String),
}

/// A parsed glTF document whose buffers may not be loaded yet.
#[derive(Debug)]
pub struct GltfDocument {
    document: gltf::Document,
    blob: Option<Vec<u8>>,
}

/// Parse a `.gltf` (JSON) or `.glb` (binary) container.
///
/// Documents that require an extension the glTF parser does not know are
/// accepted when the extension is a geometry compression scheme with a
/// decoder in `registry`. Accessors of compressed primitives carry no
/// `bufferView`; that is expected and not an error.
pub fn parse(bytes: &[u8], registry: &DecoderRegistry) -> DecodeResult<GltfDocument> {
    let gltf = match gltf::Gltf::from_slice(bytes) {
        Ok(gltf) => gltf,
        Err(gltf::Error::Validation(errors)) => {
            let gltf = gltf::Gltf::from_slice_without_validation(bytes)?;
            let compressed = compressed_accessors(&gltf.document);
            if !errors
                .iter()
                .all(|(path, error)| is_tolerated(path.as_str(), error, &compressed))
            {
                return Err(gltf::Error::Validation(errors).into());
            }
            for index in errors.iter().filter_map(|(path, _)| required_index(path.as_str())) {
                let Some(extension) = gltf.document.extensions_required().nth(index) else {
                    continue;
                };
                if !registry.supports(extension) {
                    return Err(unsupported(extension));
                }
            }
            gltf
        }
        Err(e) => return Err(e.into()),
    };

    // Compression extensions the parser accepted still need a decoder.
    if let Some(extension) = gltf
        .document
        .extensions_required()
        .find(|e| COMPRESSION_EXTENSIONS.contains(e) && !registry.supports(e))
    {
        return Err(unsupported(extension));
    }

    Ok(GltfDocument {
        document: gltf.document,
        blob: gltf.blob,
    })
}

fn unsupported(extension: &str) -> DecodeError {
    DecodeError::UnsupportedCompression {
        extension: extension.to_string(),
    }
}

/// Indices of accessors referenced by compressed primitives.
fn compressed_accessors(document: &gltf::Document) -> HashSet<usize> {
    document
        .meshes()
        .flat_map(|mesh| mesh.primitives())
        .filter(|primitive| {
            COMPRESSION_EXTENSIONS
                .iter()
                .any(|extension| primitive.extension_value(extension).is_some())
        })
        .flat_map(|primitive| {
            primitive
                .attributes()
                .map(|(_, accessor)| accessor.index())
                .chain(primitive.indices().map(|accessor| accessor.index()))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Validation errors a compressed document is allowed to have: unknown
/// required extensions, and compressed accessors without a `bufferView`.
fn is_tolerated(
    path: &str,
    error: &gltf::json::validation::Error,
    compressed: &HashSet<usize>,
) -> bool {
    match error {
        gltf::json::validation::Error::Unsupported => required_index(path).is_some(),
        gltf::json::validation::Error::Missing => {
            accessor_without_view(path).is_some_and(|index| compressed.contains(&index))
        }
        _ => false,
    }
}

/// Parse the index out of an `extensionsRequired[N]` validation path.
fn required_index(path: &str) -> Option<usize> {
    path.strip_prefix("extensionsRequired[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

/// Parse the index out of an `accessors[N].bufferView` validation path.
fn accessor_without_view(path: &str) -> Option<usize> {
    path.strip_prefix("accessors[")?
        .strip_suffix("].bufferView")?
        .parse()
        .ok()
}

/// Decode the payload of a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> DecodeResult<Vec<u8>> {
    let invalid = |detail: &str| DecodeError::InvalidFormat {
        context: "data URI",
        detail: detail.to_string(),
    };
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| invalid("missing data: scheme"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("missing payload separator"))?;
    if !header.ends_with(";base64") {
        return Err(invalid("only base64 payloads are supported"));
    }
    BASE64
        .decode(payload.as_bytes())
        .map_err(|e| invalid(&e.to_string()))
}

impl GltfDocument {
    /// The source of every buffer, indexed by buffer index.
    #[must_use]
    pub fn buffer_sources(&self) -> Vec<BufferSource> {
        self.document
            .buffers()
            .map(|buffer| match buffer.source() {
                gltf::buffer::Source::Bin => BufferSource::Embedded,
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                    BufferSource::DataUri
                }
                gltf::buffer::Source::Uri(uri) => BufferSource::External(uri.to_string()),
            })
            .collect()
    }

    /// URIs of the buffers that must be fetched, with their buffer index.
    #[must_use]
    pub fn external_buffers(&self) -> Vec<(usize, String)> {
        self.buffer_sources()
            .into_iter()
            .enumerate()
            .filter_map(|(index, source)| match source {
                BufferSource::External(uri) => Some((index, uri)),
                _ => None,
            })
            .collect()
    }

    /// The underlying document.
    #[must_use]
    pub fn document(&self) -> &gltf::Document {
        &self.document
    }

    /// Build the scene graph.
    ///
    /// `external` holds the bytes of every buffer listed by
    /// [`GltfDocument::external_buffers`], keyed by buffer index.
    pub fn into_scene(
        self,
        mut external: HashMap<usize, Vec<u8>>,
        registry: &DecoderRegistry,
    ) -> DecodeResult<SceneGraph> {
        let mut blob = self.blob;
        let mut buffers = Vec::with_capacity(self.document.buffers().count());
        for buffer in self.document.buffers() {
            let index = buffer.index();
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => blob.take(),
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                    Some(decode_data_uri(uri)?)
                }
                gltf::buffer::Source::Uri(_) => external.remove(&index),
            }
            .ok_or(DecodeError::MissingBuffer { index })?;

            if data.len() < buffer.length() {
                return Err(DecodeError::InvalidFormat {
                    context: "buffer",
                    detail: format!(
                        "buffer {index} has {} bytes, document declares {}",
                        data.len(),
                        buffer.length()
                    ),
                });
            }
            buffers.push(data);
        }

        build_scene(&self.document, &buffers, registry)
    }
}

/// Build a scene graph from a document and its resolved buffers.
pub fn build_scene(
    document: &gltf::Document,
    buffers: &[Vec<u8>],
    registry: &DecoderRegistry,
) -> DecodeResult<SceneGraph> {
    let mut builder = SceneGraphBuilder::new();

    let mut mesh_ids = Vec::with_capacity(document.meshes().count());
    for mesh in document.meshes() {
        let triangle_mesh = decode_mesh(document, &mesh, buffers, registry)?;
        mesh_ids.push(builder.add_mesh(triangle_mesh));
    }

    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        tracing::debug!("document has no scene");
        return Ok(builder.build());
    };

    let mut visited = HashSet::new();
    let mut stack: Vec<(Option<NodeId>, gltf::Node<'_>)> =
        scene.nodes().map(|node| (None, node)).collect();
    stack.reverse();
    while let Some((parent, node)) = stack.pop() {
        if !visited.insert(node.index()) {
            return Err(DecodeError::InvalidFormat {
                context: "node hierarchy",
                detail: format!("node {} is reachable twice", node.index()),
            });
        }

        let mesh: Option<MeshId> = match node.mesh() {
            Some(m) => Some(*mesh_ids.get(m.index()).ok_or(DecodeError::IndexOutOfBounds {
                index: m.index(),
                len: mesh_ids.len(),
            })?),
            None => None,
        };
        let local = Mat4::from_cols_array_2d(&node.transform().matrix());
        let id = builder.add_node(parent, node.name().map(str::to_string), local, mesh);

        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev().map(|child| (Some(id), child)));
    }

    let graph = builder.build();
    tracing::debug!(
        nodes = graph.len(),
        meshes = graph.meshes().len(),
        "built scene graph"
    );
    Ok(graph)
}

/// Merge every primitive of a mesh into one triangle list.
fn decode_mesh(
    document: &gltf::Document,
    mesh: &gltf::Mesh<'_>,
    buffers: &[Vec<u8>],
    registry: &DecoderRegistry,
) -> DecodeResult<TriangleMesh> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for primitive in mesh.primitives() {
        let geometry = if let Some(extension) = primitive.extension_value(KHR_DRACO_MESH_COMPRESSION)
        {
            decode_compressed(document, &primitive, extension, buffers, registry)?
        } else {
            let Some(geometry) = read_primitive(&primitive, buffers)? else {
                continue;
            };
            geometry
        };

        let base = u32::try_from(positions.len()).map_err(|_| DecodeError::InvalidFormat {
            context: "mesh",
            detail: "more than u32::MAX vertices".to_string(),
        })?;
        let count = geometry.positions.len();
        for &i in &geometry.indices {
            if i as usize >= count {
                return Err(DecodeError::IndexOutOfBounds {
                    index: i as usize,
                    len: count,
                });
            }
        }
        positions.extend(geometry.positions);
        indices.extend(geometry.indices.into_iter().map(|i| i + base));
    }

    Ok(TriangleMesh::new(
        mesh.name().map(str::to_string),
        positions,
        indices,
    ))
}

/// Read an uncompressed primitive as a triangle list.
///
/// Returns `None` for primitives that are not triangles or have no
/// positions.
fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[Vec<u8>],
) -> DecodeResult<Option<DecodedGeometry>> {
    let mode = primitive.mode();
    if !matches!(mode, Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan) {
        tracing::debug!(?mode, "skipping non-triangle primitive");
        return Ok(None);
    }

    let Some(position_accessor) = primitive.get(&Semantic::Positions) else {
        tracing::debug!("skipping primitive without positions");
        return Ok(None);
    };
    check_accessor_bounds(&position_accessor, buffers)?;
    if let Some(index_accessor) = primitive.indices() {
        check_accessor_bounds(&index_accessor, buffers)?;
    }

    let reader = primitive.reader(|b| buffers.get(b.index()).map(Vec::as_slice));
    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| unreadable(&position_accessor))?
        .map(Vec3::from_array)
        .collect();

    let raw: Vec<u32> = match (reader.read_indices(), primitive.indices()) {
        (Some(read), _) => read.into_u32().collect(),
        (None, Some(accessor)) => return Err(unreadable(&accessor)),
        (None, None) => {
            let count = u32::try_from(positions.len()).map_err(|_| DecodeError::InvalidFormat {
                context: "primitive",
                detail: "more than u32::MAX vertices".to_string(),
            })?;
            (0..count).collect()
        }
    };

    let indices = match mode {
        Mode::TriangleStrip => strip_to_triangles(&raw),
        Mode::TriangleFan => fan_to_triangles(&raw),
        _ => {
            let whole = raw.len() - raw.len() % 3;
            let mut raw = raw;
            raw.truncate(whole);
            raw
        }
    };

    Ok(Some(DecodedGeometry { positions, indices }))
}

fn unreadable(accessor: &gltf::Accessor<'_>) -> DecodeError {
    DecodeError::InvalidFormat {
        context: "accessor",
        detail: format!("accessor {} cannot be read from its buffer", accessor.index()),
    }
}

/// Check that every element of `accessor` lies inside its view and buffer.
fn check_accessor_bounds(accessor: &gltf::Accessor<'_>, buffers: &[Vec<u8>]) -> DecodeResult<()> {
    let Some(view) = accessor.view() else {
        // Sparse-only accessors have no backing view.
        return Ok(());
    };
    let count = accessor.count();
    if count == 0 {
        return Ok(());
    }

    let element = accessor.size();
    let stride = view.stride().unwrap_or(element);
    let end_in_view = stride
        .checked_mul(count - 1)
        .and_then(|n| n.checked_add(accessor.offset()))
        .and_then(|n| n.checked_add(element));
    let buffer_len = buffers.get(view.buffer().index()).map_or(0, Vec::len);
    let view_end = view.offset().checked_add(view.length());

    match (end_in_view, view_end) {
        (Some(end), Some(view_end)) if end <= view.length() && view_end <= buffer_len => Ok(()),
        (end, _) => Err(DecodeError::IndexOutOfBounds {
            index: end.map_or(usize::MAX, |end| view.offset().saturating_add(end)),
            len: buffer_len.min(view_end.unwrap_or(usize::MAX)),
        }),
    }
}

/// Hand a compressed primitive to its registered decoder.
fn decode_compressed(
    document: &gltf::Document,
    primitive: &gltf::Primitive<'_>,
    extension: &serde_json::Value,
    buffers: &[Vec<u8>],
    registry: &DecoderRegistry,
) -> DecodeResult<DecodedGeometry> {
    let decoder = registry
        .get(KHR_DRACO_MESH_COMPRESSION)
        .ok_or_else(|| unsupported(KHR_DRACO_MESH_COMPRESSION))?;

    let invalid = |detail: &str| DecodeError::InvalidFormat {
        context: KHR_DRACO_MESH_COMPRESSION,
        detail: detail.to_string(),
    };

    let view_index = extension
        .get("bufferView")
        .and_then(serde_json::Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| invalid("bufferView missing"))?;
    let mut attributes = Vec::new();
    for (semantic, id) in extension
        .get("attributes")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| invalid("attributes missing"))?
    {
        let id = id
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| invalid("attribute id is not an integer"))?;
        let Some(accessor) = parse_semantic(semantic).and_then(|s| primitive.get(&s)) else {
            tracing::debug!(%semantic, "skipping compressed attribute without accessor");
            continue;
        };
        attributes.push(CompressedAttribute {
            semantic: semantic.clone(),
            id,
            components: components(accessor.dimensions()),
            component_type: component_type(accessor.data_type()),
        });
    }
    attributes.sort_by_key(|a| a.id);

    let view_count = document.views().count();
    let view = document
        .views()
        .nth(view_index)
        .ok_or(DecodeError::IndexOutOfBounds {
            index: view_index,
            len: view_count,
        })?;
    let buffer_index = view.buffer().index();
    let data = buffers
        .get(buffer_index)
        .ok_or(DecodeError::MissingBuffer {
            index: buffer_index,
        })?;
    let end = view.offset() + view.length();
    let payload = data
        .get(view.offset()..end)
        .ok_or(DecodeError::IndexOutOfBounds {
            index: end,
            len: data.len(),
        })?;

    let vertex_count = primitive
        .get(&Semantic::Positions)
        .map(|a| a.count())
        .ok_or_else(|| invalid("POSITION accessor missing"))?;
    let index_count = primitive.indices().map_or(vertex_count, |a| a.count());

    decoder.decode(
        payload,
        &CompressedPrimitive {
            vertex_count,
            index_count,
            attributes,
        },
    )
}

fn parse_semantic(name: &str) -> Option<Semantic> {
    let indexed = |prefix: &str| name.strip_prefix(prefix)?.parse::<u32>().ok();
    match name {
        "POSITION" => Some(Semantic::Positions),
        "NORMAL" => Some(Semantic::Normals),
        "TANGENT" => Some(Semantic::Tangents),
        _ => indexed("TEXCOORD_")
            .map(Semantic::TexCoords)
            .or_else(|| indexed("COLOR_").map(Semantic::Colors))
            .or_else(|| indexed("JOINTS_").map(Semantic::Joints))
            .or_else(|| indexed("WEIGHTS_").map(Semantic::Weights)),
    }
}

fn components(dimensions: Dimensions) -> usize {
    match dimensions {
        Dimensions::Scalar => 1,
        Dimensions::Vec2 => 2,
        Dimensions::Vec3 => 3,
        Dimensions::Vec4 | Dimensions::Mat2 => 4,
        Dimensions::Mat3 => 9,
        Dimensions::Mat4 => 16,
    }
}

fn component_type(data_type: DataType) -> ComponentType {
    match data_type {
        DataType::I8 => ComponentType::I8,
        DataType::U8 => ComponentType::U8,
        DataType::I16 => ComponentType::I16,
        DataType::U16 => ComponentType::U16,
        DataType::U32 => ComponentType::U32,
        DataType::F32 => ComponentType::F32,
    }
}
