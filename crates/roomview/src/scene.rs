//! The live scene the render loop draws and picking reads.

use roomview_decode::{NodeId, SceneGraph};

use crate::picking::PickTarget;

/// Loaded geometry plus the resolved pick target.
///
/// Starts empty; the render loop draws whatever is attached so far.
#[derive(Debug, Clone, Default)]
pub struct LiveScene {
    graph: SceneGraph,
    pick_name: String,
    pick_target: Option<PickTarget>,
}

impl LiveScene {
    /// Create an empty scene whose pickable object is called `pick_name`.
    #[must_use]
    pub fn new(pick_name: impl Into<String>) -> Self {
        Self {
            graph: SceneGraph::default(),
            pick_name: pick_name.into(),
            pick_target: None,
        }
    }

    /// Attach a loaded subgraph.
    ///
    /// The pick target is resolved on the first attach that contains a node
    /// with the pickable name and never changes afterwards. Returns the
    /// target node when this call resolved it.
    pub fn attach(&mut self, subgraph: SceneGraph) -> Option<NodeId> {
        self.graph.append(subgraph);
        if self.pick_target.is_some() {
            return None;
        }

        match PickTarget::resolve(&self.graph, &self.pick_name) {
            Some(target) => {
                tracing::info!(
                    name = %self.pick_name,
                    triangles = target.triangles.len(),
                    "resolved pick target"
                );
                let node = target.node;
                self.pick_target = Some(target);
                Some(node)
            }
            None => {
                tracing::warn!(name = %self.pick_name, "pickable object not found in scene");
                None
            }
        }
    }

    /// The attached graph.
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The pick target, once resolved.
    #[must_use]
    pub fn pick_target(&self) -> Option<&PickTarget> {
        self.pick_target.as_ref()
    }

    /// Name of the pickable object.
    #[must_use]
    pub fn pick_name(&self) -> &str {
        &self.pick_name
    }
}
