//! Pointer picking against a single designated object.
//!
//! Picking casts a ray from the camera through the pointer and tests it
//! against the target's world-space bounds first, then against every
//! triangle of the target's subtree.

use glam::{Vec2, Vec3};
use roomview_decode::{Aabb, NodeId, SceneGraph};

use crate::camera::{CameraState, Viewport};

/// A ray with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Ray from the camera through a pointer position in viewport pixels.
    ///
    /// `None` for degenerate viewports.
    #[must_use]
    pub fn from_viewport(pointer: Vec2, viewport: Viewport, camera: &CameraState) -> Option<Self> {
        if viewport.is_degenerate() {
            return None;
        }
        let ndc = pointer_to_ndc(pointer, viewport);
        let inverse = camera.view_projection(viewport).inverse();
        let through = inverse.project_point3(ndc.extend(0.5));
        let direction = (through - camera.position).try_normalize()?;
        Some(Self {
            origin: camera.position,
            direction,
        })
    }

    /// Point at distance `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Pointer pixels to normalized device coordinates.
#[must_use]
pub fn pointer_to_ndc(pointer: Vec2, viewport: Viewport) -> Vec2 {
    Vec2::new(
        (pointer.x / viewport.width) * 2.0 - 1.0,
        -(pointer.y / viewport.height) * 2.0 + 1.0,
    )
}

/// Slab-method ray-AABB intersection.
///
/// Returns the distance to the entry point, or to the exit point when the
/// origin is inside the box.
#[must_use]
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    if aabb.is_empty() {
        return None;
    }
    let inv = Vec3::new(
        if ray.direction.x != 0.0 { 1.0 / ray.direction.x } else { f32::INFINITY },
        if ray.direction.y != 0.0 { 1.0 / ray.direction.y } else { f32::INFINITY },
        if ray.direction.z != 0.0 { 1.0 / ray.direction.z } else { f32::INFINITY },
    );

    let t0 = (aabb.min - ray.origin) * inv;
    let t1 = (aabb.max - ray.origin) * inv;
    let near = t0.min(t1);
    let far = t0.max(t1);

    let t_enter = near.max_element();
    let t_exit = far.min_element();
    if t_enter > t_exit || t_exit < 0.0 {
        return None;
    }
    Some(if t_enter >= 0.0 { t_enter } else { t_exit })
}

/// Moller-Trumbore ray-triangle intersection, both faces.
///
/// Returns the distance along the ray for hits in front of the origin.
#[must_use]
pub fn ray_triangle(ray: &Ray, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

/// The one pickable object, resolved once after the scene is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PickTarget {
    /// The named node.
    pub node: NodeId,
    /// World-space bounds of the subtree.
    pub bounds: Aabb,
    /// World-space triangles of the subtree, with the node that owns each.
    pub triangles: Vec<(NodeId, [Vec3; 3])>,
}

impl PickTarget {
    /// Resolve the node called `name` and gather its subtree geometry.
    #[must_use]
    pub fn resolve(graph: &SceneGraph, name: &str) -> Option<Self> {
        let node = graph.find_by_name(name)?;
        let mut triangles = Vec::new();
        for id in graph.descendants(node) {
            let Some(scene_node) = graph.node(id) else {
                continue;
            };
            let Some(mesh) = scene_node.mesh.and_then(|m| graph.mesh(m)) else {
                continue;
            };
            triangles.extend(mesh.triangles(scene_node.world).map(|tri| (id, tri)));
        }
        Some(Self {
            node,
            bounds: graph.world_bounds(node),
            triangles,
        })
    }
}

/// A successful pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Node owning the hit triangle.
    pub node: NodeId,
    /// World-space hit point.
    pub point: Vec3,
    /// Distance from the camera.
    pub distance: f32,
    /// Index into [`PickTarget::triangles`].
    pub triangle: usize,
}

/// Test the pointer against the pick target.
///
/// `None` when there is no target yet, the viewport is degenerate or the
/// ray misses.
#[must_use]
pub fn pick(
    pointer: Vec2,
    viewport: Viewport,
    camera: &CameraState,
    target: Option<&PickTarget>,
) -> Option<Hit> {
    let target = target?;
    let ray = Ray::from_viewport(pointer, viewport, camera)?;
    ray_aabb(&ray, &target.bounds)?;

    target
        .triangles
        .iter()
        .enumerate()
        .filter_map(|(index, (node, tri))| {
            ray_triangle(&ray, *tri).map(|distance| Hit {
                node: *node,
                point: ray.at(distance),
                distance,
                triangle: index,
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use roomview_decode::{SceneGraphBuilder, TriangleMesh};

    fn camera_at_z(z: f32) -> CameraState {
        let mut camera = CameraState {
            position: Vec3::new(0.0, 0.0, z),
            ..CameraState::default()
        };
        camera.look_at(Vec3::ZERO);
        camera
    }

    /// A 2x2 quad in the XY plane under a `boombox` node.
    fn quad_scene() -> SceneGraph {
        let mut builder = SceneGraphBuilder::new();
        let mesh = builder.add_mesh(TriangleMesh::new(
            None,
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
        ));
        let room = builder.add_node(None, Some("room".to_string()), Mat4::IDENTITY, None);
        let boombox = builder.add_node(Some(room), Some("boombox".to_string()), Mat4::IDENTITY, None);
        builder.add_node(Some(boombox), Some("speaker".to_string()), Mat4::IDENTITY, Some(mesh));
        builder.build()
    }

    #[test]
    fn test_pointer_to_ndc() {
        let viewport = Viewport::new(800.0, 600.0);
        assert_eq!(pointer_to_ndc(Vec2::new(400.0, 300.0), viewport), Vec2::ZERO);
        assert_eq!(pointer_to_ndc(Vec2::ZERO, viewport), Vec2::new(-1.0, 1.0));
        assert_eq!(pointer_to_ndc(Vec2::new(800.0, 600.0), viewport), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_center_ray_follows_forward() {
        let camera = camera_at_z(10.0);
        let ray = Ray::from_viewport(Vec2::new(400.0, 300.0), Viewport::new(800.0, 600.0), &camera)
            .unwrap();
        assert_eq!(ray.origin, camera.position);
        assert!(ray.direction.abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn test_ray_aabb() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray { origin: Vec3::new(0.0, 0.0, 5.0), direction: Vec3::NEG_Z };
        assert!((ray_aabb(&ray, &aabb).unwrap() - 4.0).abs() < 1e-6);

        let inside = Ray { origin: Vec3::ZERO, direction: Vec3::X };
        assert!((ray_aabb(&inside, &aabb).unwrap() - 1.0).abs() < 1e-6);

        let away = Ray { origin: Vec3::new(0.0, 0.0, 5.0), direction: Vec3::Z };
        assert!(ray_aabb(&away, &aabb).is_none());
        assert!(ray_aabb(&ray, &Aabb::EMPTY).is_none());
    }

    #[test]
    fn test_ray_triangle_double_sided() {
        let tri = [Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        let front = Ray { origin: Vec3::new(0.0, 0.0, 3.0), direction: Vec3::NEG_Z };
        let back = Ray { origin: Vec3::new(0.0, 0.0, -3.0), direction: Vec3::Z };
        assert!((ray_triangle(&front, tri).unwrap() - 3.0).abs() < 1e-6);
        assert!((ray_triangle(&back, tri).unwrap() - 3.0).abs() < 1e-6);

        let miss = Ray { origin: Vec3::new(5.0, 0.0, 3.0), direction: Vec3::NEG_Z };
        assert!(ray_triangle(&miss, tri).is_none());
    }

    #[test]
    fn test_pick_hits_center() {
        let graph = quad_scene();
        let target = PickTarget::resolve(&graph, "boombox").unwrap();
        assert_eq!(target.triangles.len(), 2);

        // Slightly right of center, away from the shared diagonal.
        let hit = pick(
            Vec2::new(420.0, 300.0),
            Viewport::new(800.0, 600.0),
            &camera_at_z(10.0),
            Some(&target),
        )
        .unwrap();
        assert!((hit.distance - 10.0).abs() < 1e-2);
        assert!(hit.point.z.abs() < 1e-4);
        assert!(hit.point.x > 0.0 && hit.point.y.abs() < 1e-4);
        assert_eq!(hit.triangle, 0);
        assert_eq!(Some(hit.node), graph.find_by_name("speaker"));
    }

    #[test]
    fn test_pick_misses_corner() {
        let graph = quad_scene();
        let target = PickTarget::resolve(&graph, "boombox").unwrap();
        assert!(
            pick(Vec2::new(5.0, 5.0), Viewport::new(800.0, 600.0), &camera_at_z(10.0), Some(&target))
                .is_none()
        );
    }

    #[test]
    fn test_pick_without_target_or_viewport() {
        let graph = quad_scene();
        let target = PickTarget::resolve(&graph, "boombox").unwrap();
        let camera = camera_at_z(10.0);
        assert!(pick(Vec2::new(400.0, 300.0), Viewport::new(800.0, 600.0), &camera, None).is_none());
        assert!(pick(Vec2::ZERO, Viewport::new(0.0, 0.0), &camera, Some(&target)).is_none());
        assert!(PickTarget::resolve(&graph, "lamp").is_none());
    }

    #[test]
    fn test_pick_nearest_triangle() {
        let mut builder = SceneGraphBuilder::new();
        let tri = builder.add_mesh(TriangleMesh::new(
            None,
            vec![Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
        ));
        let root = builder.add_node(None, Some("boombox".to_string()), Mat4::IDENTITY, None);
        builder.add_node(Some(root), Some("far".to_string()), Mat4::IDENTITY, Some(tri));
        builder.add_node(
            Some(root),
            Some("near".to_string()),
            Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0)),
            Some(tri),
        );
        let graph = builder.build();
        let target = PickTarget::resolve(&graph, "boombox").unwrap();

        let hit = pick(
            Vec2::new(400.0, 300.0),
            Viewport::new(800.0, 600.0),
            &camera_at_z(10.0),
            Some(&target),
        )
        .unwrap();
        assert_eq!(Some(hit.node), graph.find_by_name("near"));
        assert!((hit.distance - 8.0).abs() < 1e-3);
    }
}
