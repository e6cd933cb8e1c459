//! Scene graph produced by the decoder.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. World
//! transforms are composed once when the graph is built, and a name index is
//! built at the same time so lookups by name never walk the tree.

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use crate::aabb::Aabb;

/// Index of a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Index of a mesh in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

/// A node of the scene hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Node name from the document, if any.
    pub name: Option<String>,
    /// Parent node, `None` for roots.
    pub parent: Option<NodeId>,
    /// Child nodes in document order.
    pub children: Vec<NodeId>,
    /// Transform relative to the parent.
    pub local: Mat4,
    /// Transform relative to the scene root.
    pub world: Mat4,
    /// Mesh drawn at this node.
    pub mesh: Option<MeshId>,
}

/// Triangle geometry in mesh-local space.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    /// Mesh name from the document, if any.
    pub name: Option<String>,
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
    /// Bounds of `positions`.
    pub bounds: Aabb,
}

impl TriangleMesh {
    /// Create a mesh and compute its bounds.
    #[must_use]
    pub fn new(name: Option<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(positions.iter().copied());
        Self {
            name,
            positions,
            indices,
            bounds,
        }
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over the triangles, transformed by `matrix`.
    ///
    /// Triangles referencing missing vertices are skipped.
    pub fn triangles(&self, matrix: Mat4) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let vertex = |i: u32| {
                self.positions
                    .get(i as usize)
                    .map(|p| matrix.transform_point3(*p))
            };
            Some([vertex(tri[0])?, vertex(tri[1])?, vertex(tri[2])?])
        })
    }
}

/// A decoded scene: node hierarchy plus meshes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    meshes: Vec<TriangleMesh>,
    roots: Vec<NodeId>,
    names: HashMap<String, NodeId>,
}

/// Incremental construction of a [`SceneGraph`].
///
/// Nodes must be added parent first; world transforms are composed as each
/// node is added.
#[derive(Debug, Default)]
pub struct SceneGraphBuilder {
    graph: SceneGraph,
}

impl SceneGraphBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh and return its id.
    pub fn add_mesh(&mut self, mesh: TriangleMesh) -> MeshId {
        self.graph.meshes.push(mesh);
        MeshId(self.graph.meshes.len() - 1)
    }

    /// Add a node under `parent` (or as a root) and return its id.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: Option<String>,
        local: Mat4,
        mesh: Option<MeshId>,
    ) -> NodeId {
        let id = NodeId(self.graph.nodes.len());
        let world = match parent.and_then(|p| self.graph.nodes.get(p.0)) {
            Some(parent_node) => parent_node.world * local,
            None => local,
        };

        match parent {
            Some(p) => {
                if let Some(parent_node) = self.graph.nodes.get_mut(p.0) {
                    parent_node.children.push(id);
                }
            }
            None => self.graph.roots.push(id),
        }

        self.graph.nodes.push(SceneNode {
            name,
            parent,
            children: Vec::new(),
            local,
            world,
            mesh,
        });
        id
    }

    /// Finish construction and build the name index.
    #[must_use]
    pub fn build(mut self) -> SceneGraph {
        self.graph.rebuild_index();
        self.graph
    }
}

impl SceneGraph {
    /// Root nodes in document order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// All nodes, indexable by [`NodeId`].
    #[must_use]
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// All meshes, indexable by [`MeshId`].
    #[must_use]
    pub fn meshes(&self) -> &[TriangleMesh] {
        &self.meshes
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    /// Look up a mesh.
    #[must_use]
    pub fn mesh(&self, id: MeshId) -> Option<&TriangleMesh> {
        self.meshes.get(id.0)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a node by name.
    ///
    /// When several nodes share a name, the first in depth-first document
    /// order wins.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Depth-first traversal of the subtree rooted at `root`, parents first.
    pub fn descendants(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![root];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            if let Some(node) = self.nodes.get(id.0) {
                stack.extend(node.children.iter().rev());
            }
            Some(id)
        })
        .filter(|id| id.0 < self.nodes.len())
    }

    /// Depth-first traversal of the whole graph, parents first.
    pub fn depth_first(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots.iter().flat_map(|root| self.descendants(*root))
    }

    /// World-space bounds of every mesh in the subtree rooted at `root`.
    #[must_use]
    pub fn world_bounds(&self, root: NodeId) -> Aabb {
        self.descendants(root)
            .filter_map(|id| {
                let node = &self.nodes[id.0];
                let mesh = self.mesh(node.mesh?)?;
                Some(mesh.bounds.transformed(&node.world))
            })
            .fold(Aabb::EMPTY, Aabb::union)
    }

    /// Append the roots of `other` as new roots of this graph.
    ///
    /// Ids from `other` are remapped. Names already present keep resolving
    /// to their original node.
    pub fn append(&mut self, other: SceneGraph) {
        let node_offset = self.nodes.len();
        let mesh_offset = self.meshes.len();

        self.meshes.extend(other.meshes);
        self.nodes.extend(other.nodes.into_iter().map(|mut node| {
            node.parent = node.parent.map(|p| NodeId(p.0 + node_offset));
            for child in &mut node.children {
                child.0 += node_offset;
            }
            node.mesh = node.mesh.map(|m| MeshId(m.0 + mesh_offset));
            node
        }));
        self.roots
            .extend(other.roots.into_iter().map(|r| NodeId(r.0 + node_offset)));
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        let mut names = HashMap::new();
        for id in self.depth_first() {
            if let Some(name) = &self.nodes[id.0].name {
                names.entry(name.clone()).or_insert(id);
            }
        }
        self.names = names;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> TriangleMesh {
        TriangleMesh::new(
            Some("tri".to_string()),
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_world_transform_composes_parent_first() {
        let mut builder = SceneGraphBuilder::new();
        let root = builder.add_node(
            None,
            Some("root".to_string()),
            Mat4::from_translation(Vec3::X),
            None,
        );
        let child = builder.add_node(
            Some(root),
            Some("child".to_string()),
            Mat4::from_scale(Vec3::splat(2.0)),
            None,
        );
        let graph = builder.build();

        let world = graph.node(child).unwrap().world;
        // Scale first, then the parent's translation.
        assert_eq!(world.transform_point3(Vec3::ONE), Vec3::new(3.0, 2.0, 2.0));
        assert_eq!(graph.node(root).unwrap().children, vec![child]);
        assert_eq!(graph.node(child).unwrap().parent, Some(root));
    }

    #[test]
    fn test_find_by_name_first_depth_first_match() {
        let mut builder = SceneGraphBuilder::new();
        let a = builder.add_node(None, Some("a".to_string()), Mat4::IDENTITY, None);
        let b = builder.add_node(None, Some("b".to_string()), Mat4::IDENTITY, None);
        // Added later but visited before the second root.
        let nested = builder.add_node(Some(a), Some("b".to_string()), Mat4::IDENTITY, None);
        let graph = builder.build();

        assert_ne!(nested, b);
        assert_eq!(graph.find_by_name("b"), Some(nested));
        assert_eq!(graph.find_by_name("a"), Some(a));
        assert_eq!(graph.find_by_name("missing"), None);
    }

    #[test]
    fn test_world_bounds_cover_subtree() {
        let mut builder = SceneGraphBuilder::new();
        let mesh = builder.add_mesh(unit_triangle());
        let root = builder.add_node(None, None, Mat4::IDENTITY, Some(mesh));
        builder.add_node(
            Some(root),
            None,
            Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)),
            Some(mesh),
        );
        let graph = builder.build();

        let bounds = graph.world_bounds(root);
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 5.0));
    }

    #[test]
    fn test_append_remaps_ids() {
        let mut first = SceneGraphBuilder::new();
        first.add_node(None, Some("room".to_string()), Mat4::IDENTITY, None);
        let mut graph = first.build();

        let mut second = SceneGraphBuilder::new();
        let mesh = second.add_mesh(unit_triangle());
        let parent = second.add_node(None, Some("room".to_string()), Mat4::IDENTITY, None);
        second.add_node(Some(parent), Some("boombox".to_string()), Mat4::IDENTITY, Some(mesh));
        graph.append(second.build());

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.roots(), &[NodeId(0), NodeId(1)]);
        assert_eq!(graph.find_by_name("room"), Some(NodeId(0)));

        let boombox = graph.find_by_name("boombox").unwrap();
        let node = graph.node(boombox).unwrap();
        assert_eq!(node.parent, Some(NodeId(1)));
        assert_eq!(graph.mesh(node.mesh.unwrap()).unwrap().triangle_count(), 1);
    }

    #[test]
    fn test_triangles_transformed() {
        let mesh = unit_triangle();
        let tris: Vec<_> = mesh
            .triangles(Mat4::from_translation(Vec3::Z))
            .collect();
        assert_eq!(tris, vec![[Vec3::Z, Vec3::X + Vec3::Z, Vec3::Y + Vec3::Z]]);
    }
}
