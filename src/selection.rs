//! The highlighted-node state machine. At most one node is selected at a time, and it's the only
//! node with its highlight flag set.

use log::{debug, warn};

use crate::{scene::SceneGraph, types::NodeId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(NodeId),
}

impl Selection {
    pub fn current(&self) -> Option<NodeId> {
        match self {
            Self::Unselected => None,
            Self::Selected(id) => Some(*id),
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected(_))
    }

    /// Select `node`, moving the highlight off of any previous selection. Re-picking the selected
    /// node, or picking a node that doesn't exist, changes nothing. Returns true if the selection
    /// changed.
    pub fn pick(&mut self, scene: &mut SceneGraph, node: NodeId) -> bool {
        if self.current() == Some(node) || !scene.contains(node) {
            return false;
        }

        if let Err(e) = scene.set_highlight(node, true) {
            warn!("Unable to highlight the new selection: {e}");
            return false;
        }

        // The previous node may have been destroyed without `forget_removed` being called.
        if let Self::Selected(prev) = *self {
            if let Err(e) = scene.set_highlight(prev, false) {
                warn!("Unable to clear the previous highlight: {e}");
            }
        }
        *self = Self::Selected(node);

        debug!("Selected {:?}", scene.get(node).map(|n| n.name.as_str()));
        true
    }

    /// Returns true if there was a selection to clear.
    pub fn deselect(&mut self, scene: &mut SceneGraph) -> bool {
        let Self::Selected(prev) = *self else {
            return false;
        };

        if let Err(e) = scene.set_highlight(prev, false) {
            warn!("Unable to clear the highlight on deselect: {e}");
        }
        *self = Self::Unselected;
        true
    }

    /// Call when nodes are destroyed. Drops the selection if it was among them; the nodes are gone,
    /// so there is no highlight to clear.
    pub fn forget_removed(&mut self, removed: &[NodeId]) -> bool {
        match self.current() {
            Some(id) if removed.contains(&id) => {
                *self = Self::Unselected;
                true
            }
            _ => false,
        }
    }
}
