//! Shared fixtures: a tiny room scene with one external buffer.

#![allow(dead_code)]

use std::sync::Mutex;

use roomview::{LoadEvent, MemoryFetcher, ProgressSink};
use serde_json::{Value, json};

pub const SCENE: &str = "models/roomScene.gltf";
pub const BUFFER: &str = "models/roomScene.bin";

/// A unit quad in the XY plane (four VEC3 floats) plus six u16 indices.
pub fn quad_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    for v in [
        -0.5f32, -0.5, 0.0, 0.5, -0.5, 0.0, 0.5, 0.5, 0.0, -0.5, 0.5, 0.0,
    ] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    for i in [0u16, 1, 2, 0, 2, 3] {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    bytes
}

/// A room with a floor node and a `boombox` child carrying the quad.
pub fn room_document(buffer_uri: &str) -> Value {
    json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "room", "children": [1] },
            { "name": "boombox", "mesh": 0, "translation": [0.0, 0.0, -1.0] }
        ],
        "meshes": [{
            "name": "boombox",
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }]
        }],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
                "min": [-0.5, -0.5, 0.0], "max": [0.5, 0.5, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 6, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 48 },
            { "buffer": 0, "byteOffset": 48, "byteLength": 12 }
        ],
        "buffers": [{ "byteLength": 60, "uri": buffer_uri }]
    })
}

/// A fetcher serving the room scene and its buffer.
pub fn room_fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .with(SCENE, serde_json::to_vec(&room_document("roomScene.bin")).unwrap())
        .with(BUFFER, quad_bytes())
}

/// Records every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LoadEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<LoadEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: LoadEvent) {
        self.events.lock().unwrap().push(event);
    }
}
