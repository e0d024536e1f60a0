#![allow(clippy::too_many_arguments)]

//! The picking and editing core of a roller coaster builder.
//!
//! Clicks are turned into rays from the camera, and tested against the boxes of the leaves of a
//! scene graph; the nearest hit becomes the selection, which is highlighted, and can then be
//! moved, rotated, or deleted. Around this sits a build session: a cash budget for new track and
//! decorations, a countdown, a cycling sky, and the build and settings trays, described with
//! [EGUI](https://docs.rs/egui/latest/egui/).
//!
//! Rendering, audio, and windowing are left to the host. It forwards input through the
//! `EventHandler` trait, and reads back `EngineUpdates` to find out what to redraw.

mod camera;
pub mod config;
mod error;
pub mod input;
pub mod manipulation;
pub mod picking;
mod ray;
pub mod scene;
mod selection;
pub mod session;
pub mod tray;
mod types;

pub use camera::Camera;
pub use config::{Preferences, SessionConfig};
pub use error::{BuildError, ConfigError, SceneError};
pub use input::{Action, Key, PointerButton};
pub use picking::{Hit, find_intersections, pick};
pub use ray::Ray;
pub use scene::{SceneGraph, SceneNode};
pub use selection::Selection;
pub use session::{EventHandler, Session};
pub use tray::TrayAction;
pub use types::{
    Aabb, CameraMode, EngineUpdates, EntityKind, FWD_VEC, InputSettings, NodeId, RIGHT_VEC,
    UP_VEC,
};
// Re-export winit and egui for use in the API; this prevents the calling lib from needing them
// as direct dependencies.
pub use egui;
pub use winit;
