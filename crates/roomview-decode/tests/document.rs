//! End-to-end decoding of small glTF fixtures.

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use glam::Vec3;
use roomview_decode::{
    BufferSource, CompressedPrimitive, DecodeError, DecodeResult, DecodedGeometry, DecoderConfig,
    DecoderRegistry, GeometryDecoder, KHR_DRACO_MESH_COMPRESSION, document,
};
use serde_json::{Value, json};

/// One triangle (three VEC3 floats) followed by three u16 indices.
fn triangle_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    for i in [0u16, 1, 2] {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    bytes
}

fn room_document(buffer: Value) -> Value {
    json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "room", "children": [1], "translation": [1.0, 0.0, 0.0] },
            { "name": "boombox", "mesh": 0, "translation": [0.0, 0.0, -2.0] }
        ],
        "meshes": [{
            "name": "boombox",
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }]
        }],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "buffers": [buffer]
    })
}

fn data_uri(bytes: &[u8]) -> String {
    format!(
        "data:application/octet-stream;base64,{}",
        BASE64.encode(bytes)
    )
}

fn registry() -> DecoderRegistry {
    DecoderRegistry::new(DecoderConfig::default())
}

#[test]
fn test_data_uri_document() {
    let gltf = room_document(json!({ "byteLength": 42, "uri": data_uri(&triangle_bytes()) }));
    let bytes = serde_json::to_vec(&gltf).unwrap();

    let parsed = document::parse(&bytes, &registry()).unwrap();
    assert_eq!(parsed.buffer_sources(), vec![BufferSource::DataUri]);
    assert!(parsed.external_buffers().is_empty());

    let scene = parsed.into_scene(HashMap::new(), &registry()).unwrap();
    assert_eq!(scene.len(), 2);

    let boombox = scene.find_by_name("boombox").unwrap();
    let node = scene.node(boombox).unwrap();
    assert_eq!(node.parent, scene.find_by_name("room"));

    // Parent translation applied after the child's own.
    let origin = node.world.transform_point3(Vec3::ZERO);
    assert_eq!(origin, Vec3::new(1.0, 0.0, -2.0));

    let bounds = scene.world_bounds(boombox);
    assert_eq!(bounds.min, Vec3::new(1.0, 0.0, -2.0));
    assert_eq!(bounds.max, Vec3::new(2.0, 1.0, -2.0));
}

#[test]
fn test_external_buffer_document() {
    let gltf = room_document(json!({ "byteLength": 42, "uri": "roomScene.bin" }));
    let bytes = serde_json::to_vec(&gltf).unwrap();

    let parsed = document::parse(&bytes, &registry()).unwrap();
    assert_eq!(
        parsed.external_buffers(),
        vec![(0, "roomScene.bin".to_string())]
    );

    let scene = parsed
        .into_scene(HashMap::from([(0, triangle_bytes())]), &registry())
        .unwrap();
    let mesh = scene
        .node(scene.find_by_name("boombox").unwrap())
        .and_then(|n| n.mesh)
        .and_then(|m| scene.mesh(m))
        .unwrap();
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert_eq!(mesh.positions[1], Vec3::X);
}

#[test]
fn test_missing_external_buffer() {
    let gltf = room_document(json!({ "byteLength": 42, "uri": "roomScene.bin" }));
    let bytes = serde_json::to_vec(&gltf).unwrap();

    let parsed = document::parse(&bytes, &registry()).unwrap();
    let err = parsed.into_scene(HashMap::new(), &registry()).unwrap_err();
    assert_eq!(err, DecodeError::MissingBuffer { index: 0 });
}

#[test]
fn test_short_external_buffer() {
    let gltf = room_document(json!({ "byteLength": 42, "uri": "roomScene.bin" }));
    let bytes = serde_json::to_vec(&gltf).unwrap();

    let parsed = document::parse(&bytes, &registry()).unwrap();
    let err = parsed
        .into_scene(HashMap::from([(0, vec![0u8; 8])]), &registry())
        .unwrap_err();
    assert!(matches!(err, DecodeError::InvalidFormat { context: "buffer", .. }));
}

#[test]
fn test_malformed_document() {
    let err = document::parse(b"{ not json", &registry()).unwrap_err();
    assert!(matches!(err, DecodeError::Gltf { .. }));
}

#[test]
fn test_glb_container() {
    let mut json_chunk =
        serde_json::to_vec(&room_document(json!({ "byteLength": 42 }))).unwrap();
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }
    let mut bin_chunk = triangle_bytes();
    while bin_chunk.len() % 4 != 0 {
        bin_chunk.push(0);
    }

    let total = 12 + 8 + json_chunk.len() + 8 + bin_chunk.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&u32::try_from(total).unwrap().to_le_bytes());
    glb.extend_from_slice(&u32::try_from(json_chunk.len()).unwrap().to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json_chunk);
    glb.extend_from_slice(&u32::try_from(bin_chunk.len()).unwrap().to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(&bin_chunk);

    let parsed = document::parse(&glb, &registry()).unwrap();
    assert_eq!(parsed.buffer_sources(), vec![BufferSource::Embedded]);

    let scene = parsed.into_scene(HashMap::new(), &registry()).unwrap();
    assert!(scene.find_by_name("boombox").is_some());
}

/// Pretends to decompress by returning a fixed quad.
struct FakeDraco;

impl GeometryDecoder for FakeDraco {
    fn extension(&self) -> &str {
        KHR_DRACO_MESH_COMPRESSION
    }

    fn decode(
        &self,
        payload: &[u8],
        primitive: &CompressedPrimitive,
    ) -> DecodeResult<DecodedGeometry> {
        assert_eq!(payload, b"DRCO");
        assert_eq!(primitive.vertex_count, 4);
        assert_eq!(primitive.index_count, 6);
        assert_eq!(primitive.attribute("POSITION").map(|a| a.id), Some(0));
        Ok(DecodedGeometry {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            indices: vec![0, 1, 2, 0, 2, 3],
        })
    }
}

fn draco_document() -> Vec<u8> {
    let gltf = json!({
        "asset": { "version": "2.0" },
        "extensionsUsed": [KHR_DRACO_MESH_COMPRESSION],
        "extensionsRequired": [KHR_DRACO_MESH_COMPRESSION],
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "boombox", "mesh": 0 }],
        "meshes": [{
            "primitives": [{
                "attributes": { "POSITION": 0 },
                "indices": 1,
                "extensions": {
                    KHR_DRACO_MESH_COMPRESSION: { "bufferView": 0, "attributes": { "POSITION": 0 } }
                }
            }]
        }],
        "accessors": [
            {
                "componentType": 5126, "count": 4, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "componentType": 5123, "count": 6, "type": "SCALAR" }
        ],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 4 }],
        "buffers": [{ "byteLength": 4, "uri": data_uri(b"DRCO") }]
    });
    serde_json::to_vec(&gltf).unwrap()
}

#[test]
fn test_compressed_primitive_uses_registered_decoder() {
    let registry = registry().with(FakeDraco);
    let parsed = document::parse(&draco_document(), &registry).unwrap();
    let scene = parsed.into_scene(HashMap::new(), &registry).unwrap();

    let mesh = scene.mesh(scene.nodes()[0].mesh.unwrap()).unwrap();
    assert_eq!(mesh.triangle_count(), 2);
    assert_eq!(mesh.bounds.max, Vec3::new(1.0, 1.0, 0.0));
}

#[test]
fn test_compressed_primitive_without_decoder() {
    let err = document::parse(&draco_document(), &registry()).unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnsupportedCompression {
            extension: KHR_DRACO_MESH_COMPRESSION.to_string()
        }
    );
}

#[test]
fn test_missing_view_outside_compressed_primitive_is_rejected() {
    let mut gltf: Value = serde_json::from_slice(&draco_document()).unwrap();
    gltf["meshes"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "primitives": [{ "attributes": { "POSITION": 2 } }] }));
    gltf["accessors"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "componentType": 5126, "count": 3, "type": "VEC3" }));
    let bytes = serde_json::to_vec(&gltf).unwrap();

    let registry = registry().with(FakeDraco);
    let err = document::parse(&bytes, &registry).unwrap_err();
    assert!(matches!(err, DecodeError::Gltf { .. }));
}

fn decode_room(gltf: &Value) -> DecodeResult<roomview_decode::SceneGraph> {
    let bytes = serde_json::to_vec(gltf).unwrap();
    document::parse(&bytes, &registry())?
        .into_scene(HashMap::from([(0, triangle_bytes())]), &registry())
}

#[test]
fn test_index_view_past_buffer_end() {
    let mut gltf = room_document(json!({ "byteLength": 42, "uri": "roomScene.bin" }));
    gltf["bufferViews"][1]["byteLength"] = json!(12);
    gltf["accessors"][1]["count"] = json!(6);

    let err = decode_room(&gltf).unwrap_err();
    assert!(matches!(err, DecodeError::IndexOutOfBounds { .. }));
}

#[test]
fn test_position_count_past_view_end() {
    let mut gltf = room_document(json!({ "byteLength": 42, "uri": "roomScene.bin" }));
    gltf["accessors"][0]["count"] = json!(30);

    let err = decode_room(&gltf).unwrap_err();
    assert!(matches!(err, DecodeError::IndexOutOfBounds { .. }));
}

#[test]
fn test_scene_roots_keep_document_order() {
    let mut gltf = room_document(json!({ "byteLength": 42, "uri": "roomScene.bin" }));
    gltf["nodes"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "name": "lamp" }));
    gltf["scenes"][0]["nodes"] = json!([0, 2]);

    let scene = decode_room(&gltf).unwrap();
    let names: Vec<_> = scene
        .nodes()
        .iter()
        .map(|node| node.name.as_deref())
        .collect();
    assert_eq!(names, vec![Some("room"), Some("boombox"), Some("lamp")]);
    assert_eq!(scene.roots().len(), 2);
}
