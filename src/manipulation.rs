//! Operations on the selected node, and building: creating, deleting and un-doing entities,
//! paid for out of the player's cash.

use std::collections::{HashMap, VecDeque};

use lin_alg::f32::{Quaternion, Vec3};
use log::{debug, info, warn};

use crate::{
    camera::Camera,
    error::BuildError,
    scene::SceneGraph,
    selection::Selection,
    types::{Aabb, EntityKind, NodeId, UP_VEC},
};

/// Built entities are named this, followed by their sequential index.
pub const ENTITY_PREFIX: &str = "entity";

pub fn entity_name(index: u32) -> String {
    format!("{ENTITY_PREFIX}{index}")
}

/// The player's cash. Unsigned; purchases that would overdraw it are refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Budget {
    cash: u32,
}

impl Budget {
    pub fn new(cash: u32) -> Self {
        Self { cash }
    }

    pub fn cash(&self) -> u32 {
        self.cash
    }

    pub fn can_afford(&self, kind: EntityKind) -> bool {
        self.cash >= kind.cost()
    }

    fn spend(&mut self, kind: EntityKind) -> Result<(), BuildError> {
        let cost = kind.cost();
        self.cash = self
            .cash
            .checked_sub(cost)
            .ok_or(BuildError::InsufficientFunds {
                kind,
                cost,
                cash: self.cash,
            })?;
        Ok(())
    }

    fn refund(&mut self, kind: EntityKind) {
        self.cash = self.cash.saturating_add(kind.cost());
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreationRecord {
    pub index: u32,
    pub node: NodeId,
    pub kind: EntityKind,
}

/// Names built entities, remembers what each one is, and keeps the most recent creations
/// for undo.
#[derive(Clone, Debug)]
pub struct EntityRegistry {
    next_index: u32,
    /// Newest last. Bounded by `undo_depth`; the oldest record is dropped when it's full.
    history: VecDeque<CreationRecord>,
    undo_depth: usize,
    built: HashMap<NodeId, EntityKind>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new(1)
    }
}

impl EntityRegistry {
    pub fn new(undo_depth: usize) -> Self {
        Self {
            next_index: 0,
            history: VecDeque::with_capacity(undo_depth),
            undo_depth,
            built: HashMap::new(),
        }
    }

    /// The index the next created entity will get.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    pub fn kind_of(&self, node: NodeId) -> Option<EntityKind> {
        self.built.get(&node).copied()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    fn record(&mut self, rec: CreationRecord) {
        if self.undo_depth == 0 {
            return;
        }
        if self.history.len() == self.undo_depth {
            self.history.pop_front();
        }
        self.history.push_back(rec);
    }

    /// Forget destroyed nodes, and return what they were worth.
    fn release(&mut self, removed: &[NodeId]) -> u32 {
        removed
            .iter()
            .filter_map(|id| self.built.remove(id))
            .map(|kind| kind.cost())
            .sum()
    }
}

/// The axis selection rotations use: world up, or the camera's right.
pub fn rotation_axis(cam: &Camera, vertical: bool) -> Vec3 {
    if vertical { UP_VEC } else { cam.right() }
}

/// Move the selected node by `direction * distance`, in world space. Returns false, and changes
/// nothing, if there is no selection.
pub fn translate_selected(
    scene: &mut SceneGraph,
    selection: &Selection,
    direction: Vec3,
    distance: f32,
) -> bool {
    let Some(id) = selection.current() else {
        return false;
    };

    if scene.translate_world(id, direction * distance).is_err() {
        return false;
    }
    debug!("Moved {id:?} by {distance} along {direction:?}");
    true
}

/// Rotate the selected node about its own origin by `angle` degrees. `axis` is in world space;
/// the rotation is applied before the node's existing orientation.
pub fn rotate_selected(
    scene: &mut SceneGraph,
    selection: &Selection,
    axis: Vec3,
    angle: f32,
) -> bool {
    let Some(id) = selection.current() else {
        return false;
    };

    if scene.rotate_world(id, axis, angle.to_radians()).is_err() {
        return false;
    }
    debug!("Rotated {id:?} by {angle}° about {axis:?}");
    true
}

/// Build a new entity under `parent`, named `entity<N>`. Refused if the player can't afford it.
pub fn create_entity(
    scene: &mut SceneGraph,
    registry: &mut EntityRegistry,
    budget: &mut Budget,
    parent: NodeId,
    kind: EntityKind,
    position: Vec3,
    orientation: Quaternion,
) -> Result<NodeId, BuildError> {
    // Check the cost before touching the graph, so a refusal leaves no trace.
    let mut after = *budget;
    after.spend(kind)?;

    let index = registry.next_index;
    let name = entity_name(index);
    let bounds = Aabb::from_half_extents(kind.half_extents());

    let node = scene.create_child(parent, &name, position, orientation, Some(bounds))?;

    *budget = after;
    registry.next_index += 1;
    registry.built.insert(node, kind);
    registry.record(CreationRecord { index, node, kind });

    info!("Built {name} ({}); cash left: {}", kind.label(), budget.cash());
    Ok(node)
}

/// Destroy the selected node and everything under it. Built entities are refunded. Returns the
/// destroyed node, or `None` if nothing was selected.
pub fn delete_selected(
    scene: &mut SceneGraph,
    selection: &mut Selection,
    registry: &mut EntityRegistry,
    budget: &mut Budget,
) -> Option<NodeId> {
    let id = selection.current()?;

    let removed = match scene.destroy(id) {
        Ok(r) => r,
        Err(e) => {
            warn!("Unable to delete the selection: {e}");
            return None;
        }
    };
    selection.forget_removed(&removed);

    let refund = registry.release(&removed);
    budget.cash = budget.cash.saturating_add(refund);

    info!("Deleted {id:?}; refunded {refund}");
    Some(id)
}

/// Remove the most recently created entity, if it's still around, and refund it. The creation
/// counter steps back so the next entity reuses its name. Returns the destroyed node.
pub fn undo_last_create(
    scene: &mut SceneGraph,
    selection: &mut Selection,
    registry: &mut EntityRegistry,
    budget: &mut Budget,
) -> Option<NodeId> {
    let rec = registry.history.pop_back()?;
    registry.next_index = rec.index;

    let name = entity_name(rec.index);
    // Deleted since it was built; it was refunded then.
    let Some(node) = scene.find(&name).filter(|n| *n == rec.node) else {
        info!("Undo: {name} is already gone");
        return None;
    };

    let removed = match scene.destroy(node) {
        Ok(r) => r,
        Err(e) => {
            warn!("Undo of {name} failed: {e}");
            return None;
        }
    };
    selection.forget_removed(&removed);

    if registry.release(&removed) > 0 {
        budget.refund(rec.kind);
    }

    info!("Undid {name}; cash: {}", budget.cash());
    Some(node)
}
