//! The scene graph: a strict tree of named nodes, each with a local transform relative to its
//! parent, and an optional box for the object attached to it. World-space boxes are derived
//! state, recomputed whenever a node or one of its ancestors moves.

use std::collections::HashMap;

use lin_alg::f32::{Quaternion, Vec3};

use crate::{
    error::SceneError,
    types::{Aabb, NodeId},
};

pub const ROOT_NAME: &str = "root";

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    /// Relative to the parent.
    pub position: Vec3,
    /// Relative to the parent.
    pub orientation: Quaternion,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Box of the attached object, in node space. Nodes with nothing attached (lights, empty
    /// groups) have none, and can't be picked.
    pub local_bounds: Option<Aabb>,
    /// Derived from `local_bounds` and the world transform.
    world_bounds: Option<Aabb>,
    world_position: Vec3,
    world_orientation: Quaternion,
    /// Show the bounding box around this node.
    pub highlighted: bool,
}

impl SceneNode {
    fn new(
        name: &str,
        parent: Option<NodeId>,
        position: Vec3,
        orientation: Quaternion,
        local_bounds: Option<Aabb>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            position,
            orientation,
            parent,
            children: Vec::new(),
            local_bounds,
            world_bounds: None,
            world_position: position,
            world_orientation: orientation,
            highlighted: false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn world_bounds(&self) -> Option<&Aabb> {
        self.world_bounds.as_ref()
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    pub fn world_orientation(&self) -> Quaternion {
        self.world_orientation
    }
}

/// Nodes are stored in an append-only arena; destroyed slots stay empty.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    nodes: Vec<Option<SceneNode>>,
    names: HashMap<String, NodeId>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = SceneNode::new(
            ROOT_NAME,
            None,
            Vec3::new_zero(),
            Quaternion::new_identity(),
            None,
        );

        let mut names = HashMap::new();
        names.insert(ROOT_NAME.to_owned(), NodeId(0));

        Self {
            nodes: vec![Some(root)],
            names,
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, including the root.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root is always present.
        false
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0).and_then(|n| n.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0).and_then(|n| n.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Empty if the node doesn't exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn world_bounds(&self, id: NodeId) -> Option<Aabb> {
        self.get(id).and_then(|n| n.world_bounds)
    }

    pub fn create_child(
        &mut self,
        parent: NodeId,
        name: &str,
        position: Vec3,
        orientation: Quaternion,
        local_bounds: Option<Aabb>,
    ) -> Result<NodeId, SceneError> {
        if self.names.contains_key(name) {
            return Err(SceneError::DuplicateName(name.to_owned()));
        }

        let id = NodeId(self.nodes.len());

        let parent_node = self.get_mut(parent).ok_or(SceneError::NoSuchNode(parent))?;
        parent_node.children.push(id);

        self.nodes.push(Some(SceneNode::new(
            name,
            Some(parent),
            position,
            orientation,
            local_bounds,
        )));
        self.names.insert(name.to_owned(), id);

        self.update_world(id);
        Ok(id)
    }

    /// Destroys the node and its whole subtree. Returns the removed ids, the node itself first.
    pub fn destroy(&mut self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        if id == self.root {
            return Err(SceneError::RootImmutable);
        }

        let parent = self
            .get(id)
            .ok_or(SceneError::NoSuchNode(id))?
            .parent;

        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|c| *c != id);
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                self.names.remove(&node.name);
                // Reverse, so the subtree comes out in pre-order.
                stack.extend(node.children.iter().rev());
                removed.push(current);
            }
        }

        Ok(removed)
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> Result<(), SceneError> {
        self.get_mut(id).ok_or(SceneError::NoSuchNode(id))?.position = position;
        self.update_world(id);
        Ok(())
    }

    pub fn set_orientation(
        &mut self,
        id: NodeId,
        orientation: Quaternion,
    ) -> Result<(), SceneError> {
        self.get_mut(id).ok_or(SceneError::NoSuchNode(id))?.orientation = orientation;
        self.update_world(id);
        Ok(())
    }

    /// Move by `delta`, in parent space.
    pub fn translate(&mut self, id: NodeId, delta: Vec3) -> Result<(), SceneError> {
        let node = self.get_mut(id).ok_or(SceneError::NoSuchNode(id))?;
        node.position += delta;
        self.update_world(id);
        Ok(())
    }

    /// Rotate about `axis`, expressed in parent space, pivoting around the node's own origin.
    /// `angle` is in radians.
    pub fn rotate(&mut self, id: NodeId, axis: Vec3, angle: f32) -> Result<(), SceneError> {
        let node = self.get_mut(id).ok_or(SceneError::NoSuchNode(id))?;
        node.orientation = (Quaternion::from_axis_angle(axis, angle) * node.orientation)
            .to_normalized();
        self.update_world(id);
        Ok(())
    }

    /// Orientation of the frame `id`'s position and orientation are expressed in.
    fn parent_frame(&self, id: NodeId) -> Result<Quaternion, SceneError> {
        let node = self.get(id).ok_or(SceneError::NoSuchNode(id))?;
        Ok(node
            .parent
            .and_then(|p| self.get(p))
            .map(|p| p.world_orientation)
            .unwrap_or_else(Quaternion::new_identity))
    }

    /// Move by `delta`, in world space.
    pub fn translate_world(&mut self, id: NodeId, delta: Vec3) -> Result<(), SceneError> {
        let frame = self.parent_frame(id)?;
        self.translate(id, conjugate(frame).rotate_vec(delta))
    }

    /// Rotate about `axis`, expressed in world space, pivoting around the node's own origin.
    /// `angle` is in radians.
    pub fn rotate_world(&mut self, id: NodeId, axis: Vec3, angle: f32) -> Result<(), SceneError> {
        let frame = self.parent_frame(id)?;
        self.rotate(id, conjugate(frame).rotate_vec(axis), angle)
    }

    pub fn set_highlight(&mut self, id: NodeId, highlighted: bool) -> Result<(), SceneError> {
        self.get_mut(id).ok_or(SceneError::NoSuchNode(id))?.highlighted = highlighted;
        Ok(())
    }

    /// Recompute world transforms and boxes for `id` and everything below it.
    fn update_world(&mut self, id: NodeId) {
        let (parent_pos, parent_or) = match self.get(id).and_then(|n| n.parent) {
            Some(p) => match self.get(p) {
                Some(parent) => (parent.world_position, parent.world_orientation),
                None => return,
            },
            None => (Vec3::new_zero(), Quaternion::new_identity()),
        };

        let mut stack = vec![(id, parent_pos, parent_or)];

        while let Some((current, parent_pos, parent_or)) = stack.pop() {
            let Some(node) = self.get_mut(current) else {
                continue;
            };

            node.world_orientation = parent_or * node.orientation;
            node.world_position = parent_pos + parent_or.rotate_vec(node.position);
            node.world_bounds = node
                .local_bounds
                .map(|b| b.transformed(node.world_position, node.world_orientation));

            let (pos, or) = (node.world_position, node.world_orientation);
            for child in &node.children {
                stack.push((*child, pos, or));
            }
        }
    }
}

/// Inverse of a unit quaternion.
fn conjugate(q: Quaternion) -> Quaternion {
    Quaternion::new(q.w, -q.x, -q.y, -q.z)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use super::*;
    use crate::types::UP_VEC;

    const EPS: f32 = 1e-4;

    fn unit_box() -> Option<Aabb> {
        Some(Aabb::from_half_extents(Vec3::new(1., 1., 1.)))
    }

    #[test]
    fn create_and_find() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene
            .create_child(root, "a", Vec3::new(1., 2., 3.), Quaternion::new_identity(), None)
            .unwrap();

        assert_eq!(scene.find("a"), Some(a));
        assert_eq!(scene.children(root), &[a]);
        assert_eq!(scene.get(a).unwrap().parent, Some(root));
        assert_eq!(scene.len(), 2);
        assert!(scene.find("b").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene
            .create_child(root, "a", Vec3::new_zero(), Quaternion::new_identity(), None)
            .unwrap();

        let result =
            scene.create_child(root, "a", Vec3::new_zero(), Quaternion::new_identity(), None);
        assert!(matches!(result, Err(SceneError::DuplicateName(_))));
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn child_bounds_follow_parent() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = scene
            .create_child(root, "group", Vec3::new(10., 0., 0.), Quaternion::new_identity(), None)
            .unwrap();
        let leaf = scene
            .create_child(group, "leaf", Vec3::new(0., 5., 0.), Quaternion::new_identity(), unit_box())
            .unwrap();

        let b = scene.world_bounds(leaf).unwrap();
        assert!((b.center().x - 10.).abs() < EPS);
        assert!((b.center().y - 5.).abs() < EPS);

        scene.translate(group, Vec3::new(0., 0., 7.)).unwrap();

        let b = scene.world_bounds(leaf).unwrap();
        assert!((b.center().z - 7.).abs() < EPS);
        assert!(scene.world_bounds(group).is_none());
    }

    #[test]
    fn rotation_pivots_about_node_origin() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let n = scene
            .create_child(root, "n", Vec3::new(3., 0., 0.), Quaternion::new_identity(), unit_box())
            .unwrap();

        scene.rotate(n, UP_VEC, TAU / 4.).unwrap();

        let node = scene.get(n).unwrap();
        assert!((node.position.x - 3.).abs() < EPS);
        // A cube is symmetric under quarter turns.
        let b = scene.world_bounds(n).unwrap();
        assert!((b.center().x - 3.).abs() < EPS);
        assert!((b.max.y - 1.).abs() < EPS);

        // Children swing around with their parent.
        let child = scene
            .create_child(n, "child", Vec3::new(0., 0., 2.), Quaternion::new_identity(), None)
            .unwrap();
        let c = scene.get(child).unwrap();
        assert!((c.world_position().z).abs() < EPS);
        assert!((c.world_position().x - 3.).abs() > 1.);
        assert!((c.world_orientation().w - node_w(&scene, n)).abs() < EPS);
    }

    #[test]
    fn world_space_edits_under_a_rotated_parent() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = scene
            .create_child(root, "group", Vec3::new_zero(), Quaternion::new_identity(), None)
            .unwrap();
        scene.rotate(group, UP_VEC, TAU / 4.).unwrap();
        let leaf = scene
            .create_child(group, "leaf", Vec3::new_zero(), Quaternion::new_identity(), unit_box())
            .unwrap();

        scene.translate_world(leaf, Vec3::new(5., 0., 0.)).unwrap();
        let p = scene.get(leaf).unwrap().world_position();
        assert!((p.x - 5.).abs() < EPS);
        assert!(p.y.abs() < EPS && p.z.abs() < EPS);

        // A quarter turn about world X tips the leaf's up onto the world Z axis.
        scene
            .rotate_world(leaf, Vec3::new(1., 0., 0.), TAU / 4.)
            .unwrap();
        let up = scene.get(leaf).unwrap().world_orientation().rotate_vec(UP_VEC);
        assert!(up.x.abs() < EPS && up.y.abs() < EPS);
        assert!((up.z.abs() - 1.).abs() < EPS);
    }

    fn node_w(scene: &SceneGraph, id: NodeId) -> f32 {
        scene.get(id).unwrap().orientation.w
    }

    #[test]
    fn destroy_removes_subtree_and_detaches() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = scene
            .create_child(root, "group", Vec3::new_zero(), Quaternion::new_identity(), None)
            .unwrap();
        let a = scene
            .create_child(group, "a", Vec3::new_zero(), Quaternion::new_identity(), unit_box())
            .unwrap();
        let b = scene
            .create_child(group, "b", Vec3::new_zero(), Quaternion::new_identity(), unit_box())
            .unwrap();

        let removed = scene.destroy(group).unwrap();

        assert_eq!(removed, vec![group, a, b]);
        assert!(scene.children(root).is_empty());
        assert!(scene.get(a).is_none());
        assert!(scene.find("b").is_none());
        assert_eq!(scene.len(), 1);

        // Stale handles stay stale, even once new nodes are added.
        let c = scene
            .create_child(root, "a", Vec3::new_zero(), Quaternion::new_identity(), None)
            .unwrap();
        assert_ne!(c, a);
        assert!(scene.get(a).is_none());
    }

    #[test]
    fn root_cant_be_destroyed() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        assert!(matches!(scene.destroy(root), Err(SceneError::RootImmutable)));
    }

    #[test]
    fn operations_on_missing_nodes_fail() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene
            .create_child(root, "a", Vec3::new_zero(), Quaternion::new_identity(), None)
            .unwrap();
        scene.destroy(a).unwrap();

        assert!(matches!(scene.destroy(a), Err(SceneError::NoSuchNode(_))));
        assert!(scene.translate(a, Vec3::new(1., 0., 0.)).is_err());
        assert!(scene.set_highlight(a, true).is_err());
        assert!(scene.children(a).is_empty());
    }
}
