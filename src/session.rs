//! The build session. Owns the scene, the camera, the selection and the game state, and turns
//! host events into picks, camera motion and edits. The host calls the `EventHandler` methods,
//! then drains `EngineUpdates` to find out what to refresh.

#[cfg(feature = "app_utils")]
use std::path::Path;

use lin_alg::f32::{Quaternion, Vec3};
use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    camera::Camera,
    config::{self, Preferences, SessionConfig},
    error::{BuildError, SceneError},
    input::{self, Action, Key, PointerButton},
    manipulation::{self, Budget, EntityRegistry},
    picking,
    scene::SceneGraph,
    selection::Selection,
    tray::{self, Hud, TrayAction},
    types::{Aabb, CameraMode, EngineUpdates, EntityKind, NodeId, UP_VEC},
};

#[cfg(feature = "app_utils")]
use crate::error::ConfigError;

pub const WORLD_NODE: &str = "world";
pub const CAMERA_NODE: &str = "camera";
pub const LIGHT_NODE: &str = "light";
pub const SCENERY_NODE: &str = "scenery";

const CAMERA_START: Vec3 = Vec3 {
    x: 1_683.,
    y: 50.,
    z: 2_116.,
};
const CAMERA_TARGET: Vec3 = Vec3 {
    x: 1_963.,
    y: 50.,
    z: 1_660.,
};
const LIGHT_POS: Vec3 = Vec3 {
    x: 1_700.,
    y: 400.,
    z: 2_000.,
};
const SCENERY_POS: Vec3 = Vec3 {
    x: 1_683.,
    y: 50.,
    z: 2_110.,
};

/// Sky boxes are numbered from 1.
pub const SKY_COUNT: u8 = 5;

/// Entry points for host events. Each returns true if the event was consumed.
/// `pos` is normalized to the viewport: (0, 0) is top left, (1, 1) bottom right. Pointer
/// deltas are in pixels, and scroll amounts in lines.
pub trait EventHandler {
    fn pointer_down(&mut self, button: PointerButton, pos: (f32, f32)) -> bool;
    fn pointer_up(&mut self, button: PointerButton) -> bool;
    fn pointer_move(&mut self, dx: f32, dy: f32) -> bool;
    fn scroll(&mut self, amount: f32) -> bool;
    fn key_down(&mut self, key: Key) -> bool;
    fn key_up(&mut self, key: Key) -> bool;
    /// `dt` is in seconds.
    fn tick(&mut self, dt: f32) -> bool;
}

/// What a held pointer button is doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    Idle,
    /// Pressed over empty space.
    WorldRotate,
    /// Pressed on a node, which is now selected.
    Manipulate,
}

/// Counts down the time left to build. Stops at zero.
#[derive(Clone, Debug)]
pub struct BuildClock {
    remaining: f32, // seconds
}

impl BuildClock {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.),
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn time_up(&self) -> bool {
        self.remaining <= 0.
    }

    /// Returns true if the displayed time changed.
    pub fn tick(&mut self, dt: f32) -> bool {
        let before = self.whole_seconds();
        self.remaining = (self.remaining - dt).max(0.);
        self.whole_seconds() != before
    }

    fn whole_seconds(&self) -> u32 {
        self.remaining.ceil() as u32
    }

    /// `MM:SS`
    pub fn label(&self) -> String {
        let secs = self.whole_seconds();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

/// Steps through the sky boxes, one per period of play.
#[derive(Clone, Debug)]
pub struct SkyCycle {
    index: u8,
    elapsed: f32,
    period: f32,
}

impl SkyCycle {
    pub fn new(index: u8, period: f32) -> Self {
        Self {
            index: index.clamp(1, SKY_COUNT),
            elapsed: 0.,
            period,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Returns true if the sky changed. Any number of whole periods may pass in one tick;
    /// non-finite and negative steps are ignored.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !(self.period.is_finite() && self.period > 0.) || !(dt.is_finite() && dt > 0.) {
            return false;
        }

        self.elapsed += dt;
        let periods = (self.elapsed / self.period).floor();
        if periods < 1. {
            return false;
        }

        self.elapsed %= self.period;
        let steps = (periods % SKY_COUNT as f32) as u8;
        self.index = (self.index - 1 + steps) % SKY_COUNT + 1;
        true
    }
}

pub struct Session {
    config: SessionConfig,
    prefs: Preferences,
    scene: SceneGraph,
    camera: Camera,
    world: NodeId,
    camera_node: NodeId,
    selection: Selection,
    registry: EntityRegistry,
    budget: Budget,
    drag: DragMode,
    shift_held: bool,
    ctrl_held: bool,
    camera_mode: CameraMode,
    /// Set while the settings tray is open.
    paused: bool,
    clock: BuildClock,
    sky: SkyCycle,
    updates: EngineUpdates,
    quit_requested: bool,
}

impl Session {
    /// Set up the starting scene: the world, the camera looking out over it, a light, and one
    /// piece of scenery.
    pub fn new(config: SessionConfig, prefs: Preferences) -> Result<Self, SceneError> {
        let mut scene = SceneGraph::new();
        let world = scene.create_child(
            scene.root(),
            WORLD_NODE,
            Vec3::new_zero(),
            Quaternion::new_identity(),
            None,
        )?;

        let mut camera = Camera {
            position: CAMERA_START,
            ..Default::default()
        };
        camera.look_at(CAMERA_TARGET);
        if let Ok((w, h)) = prefs.resolution() {
            camera.set_viewport(w, h);
        }

        let camera_node = scene.create_child(
            world,
            CAMERA_NODE,
            camera.position,
            camera.orientation,
            Some(Aabb::from_half_extents(Vec3::new(0.5, 0.5, 0.5))),
        )?;
        scene.create_child(
            world,
            LIGHT_NODE,
            LIGHT_POS,
            Quaternion::new_identity(),
            None,
        )?;
        scene.create_child(
            world,
            SCENERY_NODE,
            SCENERY_POS,
            Quaternion::new_identity(),
            Some(Aabb::from_half_extents(Vec3::new(2., 2., 2.))),
        )?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sky = SkyCycle::new(rng.gen_range(1..=SKY_COUNT - 1), config.sky_period);

        info!("Starting session with ${}, sky {}", config.starting_cash, sky.index());

        Ok(Self {
            registry: EntityRegistry::new(config.undo_depth),
            budget: Budget::new(config.starting_cash),
            clock: BuildClock::new(config.build_time),
            camera_mode: prefs.camera_mode,
            config,
            prefs,
            scene,
            camera,
            world,
            camera_node,
            selection: Selection::default(),
            drag: DragMode::Idle,
            shift_held: false,
            ctrl_held: false,
            paused: false,
            sky,
            updates: EngineUpdates::default(),
            quit_requested: false,
        })
    }

    pub fn with_default_scene() -> Result<Self, SceneError> {
        Self::new(Default::default(), Default::default())
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn world(&self) -> NodeId {
        self.world
    }

    pub fn camera_node(&self) -> NodeId {
        self.camera_node
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn cash(&self) -> u32 {
        self.budget.cash()
    }

    pub fn drag_mode(&self) -> DragMode {
        self.drag
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.camera_mode
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn clock(&self) -> &BuildClock {
        &self.clock
    }

    pub fn clock_label(&self) -> String {
        self.clock.label()
    }

    pub fn sky_index(&self) -> u8 {
        self.sky.index()
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Returns what changed since the last call, and resets the flags.
    pub fn take_updates(&mut self) -> EngineUpdates {
        std::mem::take(&mut self.updates)
    }

    pub fn hud(&self) -> Hud {
        Hud {
            cash: self.budget.cash(),
            clock: self.clock.label(),
            has_selection: self.selection.is_selected(),
            can_undo: self.registry.can_undo(),
        }
    }

    /// Call after the window is resized.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
        self.updates.camera = true;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.camera.look_at(target);
        self.sync_camera();
    }

    /// Keep the camera's node in step with the camera, so its box moves with it.
    fn sync_camera(&mut self) {
        let _ = self
            .scene
            .set_position(self.camera_node, self.camera.position);
        let _ = self
            .scene
            .set_orientation(self.camera_node, self.camera.orientation);
        self.updates.camera = true;
    }

    fn move_camera(&mut self, delta: Vec3) {
        self.camera.translate(delta);
        self.sync_camera();
    }

    fn deselect(&mut self) -> bool {
        let changed = self.selection.deselect(&mut self.scene);
        if changed {
            self.updates.selection = true;
            self.updates.hud = true;
        }
        changed
    }

    /// Build an entity a fixed distance in front of the camera. It isn't selected.
    pub fn create(&mut self, kind: EntityKind) -> Result<NodeId, BuildError> {
        let position = self.camera.position + self.camera.forward() * self.config.placement_distance;

        let node = manipulation::create_entity(
            &mut self.scene,
            &mut self.registry,
            &mut self.budget,
            self.world,
            kind,
            position,
            Quaternion::new_identity(),
        )?;

        self.updates.scene = true;
        self.updates.hud = true;
        Ok(node)
    }

    pub fn delete_selected(&mut self) -> Option<NodeId> {
        let removed = manipulation::delete_selected(
            &mut self.scene,
            &mut self.selection,
            &mut self.registry,
            &mut self.budget,
        )?;
        self.updates.scene = true;
        self.updates.selection = true;
        self.updates.hud = true;
        Some(removed)
    }

    pub fn undo_last_create(&mut self) -> Option<NodeId> {
        let had_selection = self.selection.is_selected();
        let removed = manipulation::undo_last_create(
            &mut self.scene,
            &mut self.selection,
            &mut self.registry,
            &mut self.budget,
        );
        // The counter and history change even if the node was already gone.
        self.updates.hud = true;

        if removed.is_some() {
            self.updates.scene = true;
            self.updates.selection |= had_selection != self.selection.is_selected();
        }
        removed
    }

    /// Carry out a key action. Returns true if anything happened.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => {
                info!("Quit requested");
                self.quit_requested = true;
                true
            }
            Action::PitchCamera(angle) => {
                self.camera.pitch(angle);
                self.sync_camera();
                true
            }
            Action::YawCamera(angle) => {
                self.camera.yaw(angle);
                self.sync_camera();
                true
            }
            Action::Move(dir) => {
                let dir = dir.to_vec(&self.camera);
                let step = self.config.input.move_step;

                self.move_camera(dir * step);
                if manipulation::translate_selected(&mut self.scene, &self.selection, dir, step) {
                    self.updates.scene = true;
                }
                true
            }
            Action::RotateSelection {
                angle,
                vertical_axis,
            } => {
                let axis = manipulation::rotation_axis(&self.camera, vertical_axis);
                let rotated =
                    manipulation::rotate_selected(&mut self.scene, &self.selection, axis, angle);
                self.updates.scene |= rotated;
                rotated
            }
            Action::ToggleCameraMode => {
                self.deselect();
                self.drag = DragMode::Idle;
                self.camera_mode = self.camera_mode.toggled();
                self.prefs.camera_mode = self.camera_mode;
                info!("Camera mode: {:?}", self.camera_mode);
                true
            }
            Action::Create(kind) => match self.create(kind) {
                Ok(_) => true,
                Err(e) => {
                    warn!("{e}");
                    false
                }
            },
            Action::DeleteSelected => self.delete_selected().is_some(),
            Action::Undo => self.undo_last_create().is_some(),
            Action::Deselect => self.deselect(),
        }
    }

    /// Carry out a tray button or setting change.
    pub fn apply_tray_action(&mut self, action: TrayAction) -> bool {
        match action {
            TrayAction::Create(kind) => self.apply(Action::Create(kind)),
            TrayAction::Remove => self.apply(Action::DeleteSelected),
            TrayAction::Undo => self.apply(Action::Undo),
            TrayAction::Release => self.apply(Action::Deselect),
            TrayAction::OpenSettings => {
                info!("Paused");
                self.paused = true;
                self.drag = DragMode::Idle;
                self.updates.hud = true;
                true
            }
            TrayAction::Return => {
                info!("Resumed");
                self.paused = false;
                self.updates.hud = true;
                true
            }
            TrayAction::SetFxVolume(v) => {
                self.prefs.fx_volume = v;
                self.prefs.clamp();
                true
            }
            TrayAction::SetMusicVolume(v) => {
                self.prefs.music_volume = v;
                self.prefs.clamp();
                true
            }
            TrayAction::SetResolution(res) => match config::parse_resolution(&res) {
                Ok((w, h)) => {
                    self.prefs.resolution = res;
                    self.set_viewport(w, h);
                    true
                }
                Err(e) => {
                    warn!("{e}");
                    false
                }
            },
        }
    }

    /// Lay out whichever tray is showing, and apply what the player clicked.
    pub fn draw_trays(&mut self, ctx: &egui::Context) -> bool {
        let action = if self.paused {
            tray::settings_tray(ctx, &self.prefs)
        } else {
            tray::build_tray(ctx, &self.hud())
        };

        match action {
            Some(a) => self.apply_tray_action(a),
            None => false,
        }
    }

    #[cfg(feature = "app_utils")]
    pub fn save_prefs(&self, path: &Path) -> Result<(), ConfigError> {
        config::save(path, &self.prefs)
    }
}

impl EventHandler for Session {
    fn pointer_down(&mut self, button: PointerButton, pos: (f32, f32)) -> bool {
        if button != PointerButton::Left || self.paused {
            return false;
        }

        let ray = self.camera.screen_ray(pos);
        match picking::pick(&self.scene, self.world, &ray, Some(self.camera_node)) {
            Some(hit) => {
                debug!("Hit {:?} at {:.2}", hit.node, hit.distance);
                if self.selection.pick(&mut self.scene, hit.node) {
                    self.updates.selection = true;
                    self.updates.hud = true;
                }
                self.drag = DragMode::Manipulate;
            }
            None => {
                self.deselect();
                self.drag = DragMode::WorldRotate;
            }
        }
        true
    }

    fn pointer_up(&mut self, button: PointerButton) -> bool {
        if button != PointerButton::Left {
            return false;
        }

        self.drag = DragMode::Idle;
        if self.camera_mode == CameraMode::FreeLook {
            self.deselect();
        }
        true
    }

    fn pointer_move(&mut self, dx: f32, dy: f32) -> bool {
        if self.paused {
            return false;
        }

        let settings = &self.config.input;

        if self.drag == DragMode::Manipulate
            && self.selection.is_selected()
            && (self.shift_held || self.ctrl_held)
        {
            let moved = if self.shift_held {
                let sens = settings.drag_move_sens;
                // Screen Y points down.
                manipulation::translate_selected(
                    &mut self.scene,
                    &self.selection,
                    self.camera.right(),
                    dx * sens,
                ) | manipulation::translate_selected(
                    &mut self.scene,
                    &self.selection,
                    self.camera.up(),
                    -dy * sens,
                )
            } else {
                let sens = settings.look_sens;
                manipulation::rotate_selected(&mut self.scene, &self.selection, UP_VEC, dx * sens)
                    | manipulation::rotate_selected(
                        &mut self.scene,
                        &self.selection,
                        self.camera.right(),
                        dy * sens,
                    )
            };
            self.updates.scene |= moved;
            return moved;
        }

        let moved = match self.camera_mode {
            CameraMode::FreeLook => input::free_look(&mut self.camera, dx, dy, settings),
            CameraMode::Orbit => {
                self.drag == DragMode::WorldRotate
                    && input::orbit_drag(&mut self.camera, dx, dy, settings)
            }
        };

        if moved {
            self.sync_camera();
        }
        moved
    }

    fn scroll(&mut self, amount: f32) -> bool {
        if self.paused || amount == 0. {
            return false;
        }

        let delta = self.camera.forward() * (amount * self.config.input.zoom_step);
        self.move_camera(delta);
        true
    }

    fn key_down(&mut self, key: Key) -> bool {
        match key {
            Key::Shift => self.shift_held = true,
            Key::Ctrl => self.ctrl_held = true,
            _ => (),
        }

        if self.paused && key != Key::Escape {
            return false;
        }

        match input::map_key(key, self.selection.is_selected(), &self.config.input) {
            Some(action) => self.apply(action),
            // Modifiers.
            None => true,
        }
    }

    fn key_up(&mut self, key: Key) -> bool {
        match key {
            Key::Shift => self.shift_held = false,
            Key::Ctrl => self.ctrl_held = false,
            _ => return false,
        }
        true
    }

    fn tick(&mut self, dt: f32) -> bool {
        if self.paused || !dt.is_finite() || dt <= 0. {
            return false;
        }

        let clock_changed = self.clock.tick(dt);
        let sky_changed = self.sky.tick(dt);

        if clock_changed && self.clock.time_up() {
            info!("Build time is up");
        }
        if sky_changed {
            debug!("Sky {}", self.sky.index());
        }

        self.updates.hud |= clock_changed;
        self.updates.sky |= sky_changed;
        clock_changed || sky_changed
    }
}
