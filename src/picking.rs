//! Resolving a pick ray to the scene nodes it passes through.

use lin_alg::f32::Vec3;

use crate::{ray::Ray, scene::SceneGraph, types::NodeId};

/// A node the ray passes through.
#[derive(Clone, Copy, Debug)]
pub struct Hit {
    /// Along the ray, from its origin. 0 if the origin is inside the node's box.
    pub distance: f32,
    pub node: NodeId,
    /// Where the ray enters the node's box, in world space.
    pub point: Vec3,
}

/// Find every leaf under `root` whose world box the ray passes through, nearest first.
///
/// Only leaves are tested; group nodes are never hits themselves, but their children are
/// visited in order. `exclude` is the node carrying the camera the ray was cast from, which
/// must never be picked. Hits at equal distances are all kept, in pre-order.
pub fn find_intersections(
    scene: &SceneGraph,
    root: NodeId,
    ray: &Ray,
    exclude: Option<NodeId>,
) -> Vec<Hit> {
    let mut hits = Vec::new();
    collect_hits(scene, root, ray, exclude, &mut hits);

    // Stable; ties stay in traversal order.
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// The nearest hit, if any.
pub fn pick(scene: &SceneGraph, root: NodeId, ray: &Ray, exclude: Option<NodeId>) -> Option<Hit> {
    find_intersections(scene, root, ray, exclude).into_iter().next()
}

fn collect_hits(
    scene: &SceneGraph,
    node: NodeId,
    ray: &Ray,
    exclude: Option<NodeId>,
    hits: &mut Vec<Hit>,
) {
    let Some(n) = scene.get(node) else {
        return;
    };

    if !n.is_leaf() {
        for child in &n.children {
            collect_hits(scene, *child, ray, exclude, hits);
        }
        return;
    }

    if Some(node) == exclude {
        return;
    }

    if let Some(distance) = n.world_bounds().and_then(|b| ray.intersect_aabb(b)) {
        hits.push(Hit {
            distance,
            node,
            point: ray.point_at(distance),
        });
    }
}

#[cfg(test)]
mod tests {
    use lin_alg::f32::Quaternion;

    use super::*;
    use crate::types::Aabb;

    fn add_box(scene: &mut SceneGraph, parent: NodeId, name: &str, z: f32) -> NodeId {
        scene
            .create_child(
                parent,
                name,
                Vec3::new(0., 0., z),
                Quaternion::new_identity(),
                Some(Aabb::from_half_extents(Vec3::new(1., 1., 1.))),
            )
            .unwrap()
    }

    fn fwd_ray() -> Ray {
        Ray::new(Vec3::new_zero(), Vec3::new(0., 0., 1.))
    }

    #[test]
    fn sorted_nearest_first() {
        let mut scene = SceneGraph::new();
        let world = scene
            .create_child(scene.root(), "world", Vec3::new_zero(), Quaternion::new_identity(), None)
            .unwrap();
        let far = add_box(&mut scene, world, "far", 31.);
        let near = add_box(&mut scene, world, "near", 11.);
        let mid = add_box(&mut scene, world, "mid", 21.);

        let hits = find_intersections(&scene, world, &fwd_ray(), None);

        let order: Vec<_> = hits.iter().map(|h| h.node).collect();
        assert_eq!(order, vec![near, mid, far]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!((hits[0].distance - 10.).abs() < 1e-4);
        assert!((hits[0].point.z - 10.).abs() < 1e-4);
    }

    #[test]
    fn equal_distances_keep_both_hits_in_traversal_order() {
        let mut scene = SceneGraph::new();
        let world = scene
            .create_child(scene.root(), "world", Vec3::new_zero(), Quaternion::new_identity(), None)
            .unwrap();
        let a = add_box(&mut scene, world, "a", 11.);
        let b = add_box(&mut scene, world, "b", 11.);

        let hits = find_intersections(&scene, world, &fwd_ray(), None);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node, a);
        assert_eq!(hits[1].node, b);
    }

    #[test]
    fn group_nodes_are_not_tested() {
        let mut scene = SceneGraph::new();
        let world = scene
            .create_child(scene.root(), "world", Vec3::new_zero(), Quaternion::new_identity(), None)
            .unwrap();
        // A group with its own box, whose only child is off to the side.
        let group = scene
            .create_child(
                world,
                "group",
                Vec3::new(0., 0., 11.),
                Quaternion::new_identity(),
                Some(Aabb::from_half_extents(Vec3::new(1., 1., 1.))),
            )
            .unwrap();
        scene
            .create_child(
                group,
                "child",
                Vec3::new(10., 0., 0.),
                Quaternion::new_identity(),
                Some(Aabb::from_half_extents(Vec3::new(1., 1., 1.))),
            )
            .unwrap();

        assert!(find_intersections(&scene, world, &fwd_ray(), None).is_empty());
    }

    #[test]
    fn excluded_node_is_never_hit() {
        let mut scene = SceneGraph::new();
        let world = scene
            .create_child(scene.root(), "world", Vec3::new_zero(), Quaternion::new_identity(), None)
            .unwrap();
        // Surrounds the ray origin, so it would be the nearest hit at distance 0.
        let cam = add_box(&mut scene, world, "cam", 0.);
        let target = add_box(&mut scene, world, "target", 11.);

        let hits = find_intersections(&scene, world, &fwd_ray(), Some(cam));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node, target);

        let hits = find_intersections(&scene, world, &fwd_ray(), None);
        assert_eq!(hits[0].node, cam);
        assert_eq!(hits[0].distance, 0.);
    }

    #[test]
    fn empty_scene_and_misses() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        assert!(find_intersections(&scene, root, &fwd_ray(), None).is_empty());

        add_box(&mut scene, root, "behind", -20.);
        assert!(find_intersections(&scene, root, &fwd_ray(), None).is_empty());
        assert!(pick(&scene, root, &fwd_ray(), None).is_none());
    }

    #[test]
    fn unbounded_leaves_are_ignored() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene
            .create_child(root, "light", Vec3::new(0., 0., 5.), Quaternion::new_identity(), None)
            .unwrap();

        assert!(find_intersections(&scene, root, &fwd_ray(), None).is_empty());
    }
}
