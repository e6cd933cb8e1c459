//! Mesh conversion and spawning of decoded scene graphs.
//!
//! Every node with a mesh becomes one entity with its composed world
//! transform; the hierarchy is already flattened by the decoder. Each node
//! gets its own material so the pickable object can be recoloured alone.

use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use roomview::{NodeId, SceneGraph};
use roomview_decode::TriangleMesh;

/// Base colour of scene materials; the decoder keeps geometry only.
const SURFACE_COLOR: Color = Color::srgb(0.8, 0.8, 0.8);

/// Entity spawned for a scene node.
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneNodeEntity(pub NodeId);

/// Maps scene nodes to their spawned entities.
#[derive(Resource, Debug, Default)]
pub struct SceneEntities(pub HashMap<NodeId, Entity>);

/// Convert a decoded mesh to a Bevy mesh with smooth normals.
pub fn convert_mesh(mesh: &TriangleMesh) -> Mesh {
    let positions: Vec<[f32; 3]> = mesh.positions.iter().map(|p| p.to_array()).collect();

    let mut out = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    out.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    out.insert_indices(Indices::U32(mesh.indices.clone()));
    out.compute_normals();
    out
}

/// Spawn an entity for every node of `graph` that has a mesh and is not in
/// `spawned` yet.
pub fn spawn_graph(
    commands: &mut Commands,
    graph: &SceneGraph,
    spawned: &mut SceneEntities,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let mut handles = HashMap::new();
    let mut count = 0usize;

    for (index, node) in graph.nodes().iter().enumerate() {
        let id = NodeId(index);
        if spawned.0.contains_key(&id) {
            continue;
        }
        let Some(mesh_id) = node.mesh else {
            continue;
        };
        let Some(mesh) = graph.mesh(mesh_id) else {
            continue;
        };
        if mesh.indices.is_empty() {
            continue;
        }

        let handle = handles
            .entry(mesh_id)
            .or_insert_with(|| meshes.add(convert_mesh(mesh)))
            .clone();
        let material = materials.add(StandardMaterial {
            base_color: SURFACE_COLOR,
            perceptual_roughness: 0.8,
            ..default()
        });

        let entity = commands
            .spawn((
                Name::new(node.name.clone().unwrap_or_else(|| format!("node {index}"))),
                SceneNodeEntity(id),
                Mesh3d(handle),
                MeshMaterial3d(material),
                Transform::from_matrix(node.world),
            ))
            .id();
        spawned.0.insert(id, entity);
        count += 1;
    }

    tracing::info!(entities = count, meshes = handles.len(), "spawned scene meshes");
}
