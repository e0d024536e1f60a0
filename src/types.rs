//! Shared value types: node handles, bounding boxes, buildable entity kinds, input
//! settings, and the update flags the host consumes.

#[cfg(feature = "app_utils")]
use bincode::{Decode, Encode};
use lin_alg::f32::{Quaternion, Vec3};

pub const UP_VEC: Vec3 = Vec3 {
    x: 0.,
    y: 1.,
    z: 0.,
};
pub const RIGHT_VEC: Vec3 = Vec3 {
    x: 1.,
    y: 0.,
    z: 0.,
};
pub const FWD_VEC: Vec3 = Vec3 {
    x: 0.,
    y: 0.,
    z: 1.,
};

/// Index of a node in the scene graph arena. Ids are never reused, so a handle to a destroyed
/// node resolves to nothing instead of to a newer node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A box centered on the origin, with the given half extents.
    pub fn from_half_extents(half: Vec3) -> Self {
        Self {
            min: -half,
            max: half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// The axis-aligned box enclosing this box after rotating it by `orientation` and then
    /// moving it by `position`.
    pub fn transformed(&self, position: Vec3, orientation: Quaternion) -> Self {
        let mut min = Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let mut max = Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);

        for corner in self.corners() {
            let p = orientation.rotate_vec(corner) + position;

            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Self { min, max }
    }
}

/// Things the player can build. Each has a price and a box used for picking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A piece of coaster track.
    Rail,
    Decoration,
}

impl EntityKind {
    pub fn cost(self) -> u32 {
        match self {
            Self::Rail => 50,
            Self::Decoration => 25,
        }
    }

    /// Half extents of the attached model, in node space.
    pub fn half_extents(self) -> Vec3 {
        match self {
            Self::Rail => Vec3::new(2., 0.5, 4.),
            Self::Decoration => Vec3::new(1., 1., 1.),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Rail => "Rail",
            Self::Decoration => "Decor.",
        }
    }
}

#[cfg_attr(feature = "app_utils", derive(Encode, Decode))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CameraMode {
    #[default]
    /// Dragging over empty space rotates the view around; releasing the pointer keeps the
    /// selection.
    Orbit,
    /// The pointer always steers the camera, FPS-style. Releasing the pointer releases the
    /// selection.
    FreeLook,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Orbit => Self::FreeLook,
            Self::FreeLook => Self::Orbit,
        }
    }
}

#[derive(Clone, Debug)]
/// Step sizes are in world units, angles in degrees, and pointer sensitivities are per pixel.
pub struct InputSettings {
    /// Distance moved per movement key press; applies to the camera and the selection.
    pub move_step: f32,
    /// Distance moved per scroll unit.
    pub zoom_step: f32,
    /// Camera pitch or yaw per arrow key press.
    pub camera_rotate_step: f32,
    /// Selection rotation per arrow key press.
    pub selection_rotate_step: f32,
    /// Degrees per pixel when dragging over empty space in orbit mode.
    pub orbit_sens: f32,
    /// Degrees per pixel for free-look, and for rotating the selection by dragging.
    pub look_sens: f32,
    /// World units per pixel when dragging the selection.
    pub drag_move_sens: f32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            move_step: 1.5,
            zoom_step: 1.5,
            camera_rotate_step: 5.,
            selection_rotate_step: 90.,
            orbit_sens: 0.1,
            look_sens: 0.3,
            drag_move_sens: 0.1,
        }
    }
}

/// This struct is accumulated by the session's event handlers, and drained by the host after each
/// call to find out what needs refreshing. Handlers set the corresponding flag when they change the
/// relevant part of the state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineUpdates {
    /// Nodes were created, destroyed or moved.
    pub scene: bool,
    pub camera: bool,
    /// The highlighted node changed.
    pub selection: bool,
    /// Cash, clock or tray layout changed.
    pub hud: bool,
    pub sky: bool,
}

impl EngineUpdates {
    pub fn any(&self) -> bool {
        self.scene || self.camera || self.selection || self.hud || self.sky
    }
}
