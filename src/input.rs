//! Handles keyboard and mouse input: translating host events into symbolic keys, the static key
//! map, and the pointer-driven camera motions.

use lin_alg::f32::Vec3;
use winit::{
    event::{MouseButton, MouseScrollDelta},
    keyboard::KeyCode,
};

use crate::{
    camera::Camera,
    types::{EntityKind, InputSettings},
};

// Pixels per scroll "line", for touchpads and other devices that report pixel deltas.
const PIXELS_PER_LINE: f32 = 40.;

const EPS_MOUSE: f32 = 0.00001;

/// The keys the session reacts to. Anything else is dropped by the host adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    /// Switch between orbit and free-look.
    C,
    /// New rail.
    N,
    /// New decoration.
    B,
    U,
    R,
    Delete,
    Shift,
    Ctrl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Which camera-relative direction to move in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDir {
    Forward,
    Back,
    Left,
    Right,
}

impl MoveDir {
    /// Unit vector, in world space.
    pub fn to_vec(self, cam: &Camera) -> Vec3 {
        match self {
            Self::Forward => cam.forward(),
            Self::Back => -cam.forward(),
            Self::Left => -cam.right(),
            Self::Right => cam.right(),
        }
    }
}

/// What a key press asks the session to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    Quit,
    /// Degrees, about the camera's right axis.
    PitchCamera(f32),
    /// Degrees, about world up.
    YawCamera(f32),
    /// Moves the camera, and the selection along with it.
    Move(MoveDir),
    RotateSelection { angle: f32, vertical_axis: bool },
    ToggleCameraMode,
    Create(EntityKind),
    DeleteSelected,
    Undo,
    Deselect,
}

/// The key map. Arrow keys steer the camera when nothing is selected, and turn the selection
/// otherwise. Modifier keys return `None`; the session tracks their held state separately.
pub fn map_key(key: Key, has_selection: bool, settings: &InputSettings) -> Option<Action> {
    let cam_step = settings.camera_rotate_step;
    let sel_step = settings.selection_rotate_step;

    let action = match key {
        Key::Escape => Action::Quit,
        Key::Up if has_selection => Action::RotateSelection {
            angle: sel_step,
            vertical_axis: false,
        },
        Key::Down if has_selection => Action::RotateSelection {
            angle: -sel_step,
            vertical_axis: false,
        },
        Key::Left if has_selection => Action::RotateSelection {
            angle: sel_step,
            vertical_axis: true,
        },
        Key::Right if has_selection => Action::RotateSelection {
            angle: -sel_step,
            vertical_axis: true,
        },
        Key::Up => Action::PitchCamera(cam_step),
        Key::Down => Action::PitchCamera(-cam_step),
        Key::Left => Action::YawCamera(cam_step),
        Key::Right => Action::YawCamera(-cam_step),
        Key::W => Action::Move(MoveDir::Forward),
        Key::S => Action::Move(MoveDir::Back),
        Key::A => Action::Move(MoveDir::Left),
        Key::D => Action::Move(MoveDir::Right),
        Key::C => Action::ToggleCameraMode,
        Key::N => Action::Create(EntityKind::Rail),
        Key::B => Action::Create(EntityKind::Decoration),
        Key::Delete => Action::DeleteSelected,
        Key::U => Action::Undo,
        Key::R => Action::Deselect,
        Key::Shift | Key::Ctrl => return None,
    };

    Some(action)
}

/// Translate a host key code. Returns `None` for keys we don't use.
pub fn key_from_code(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyR => Key::R,
        KeyCode::Delete => Key::Delete,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Ctrl,
        _ => return None,
    };
    Some(key)
}

pub fn button_from_winit(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Left),
        MouseButton::Right => Some(PointerButton::Right),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Scroll amount in lines; positive is away from the user.
pub fn scroll_amount(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
    }
}

/// Rotate the camera in response to dragging over empty space, in orbit mode. Only the dominant
/// axis of the drag applies: horizontal drags yaw, vertical drags pitch. The world follows the
/// pointer on both axes. Returns true if the camera changed.
pub fn orbit_drag(cam: &mut Camera, dx: f32, dy: f32, settings: &InputSettings) -> bool {
    if dx.abs() < EPS_MOUSE && dy.abs() < EPS_MOUSE {
        return false;
    }

    if dx.abs() > dy.abs() {
        cam.yaw(-dx * settings.orbit_sens);
    } else {
        cam.pitch(dy * settings.orbit_sens);
    }
    true
}

/// Free-look: horizontal pointer motion turns about world up, vertical motion pitches. Returns
/// true if the camera changed.
pub fn free_look(cam: &mut Camera, dx: f32, dy: f32, settings: &InputSettings) -> bool {
    if dx.abs() < EPS_MOUSE && dy.abs() < EPS_MOUSE {
        return false;
    }

    cam.pitch(-dy * settings.look_sens);
    cam.yaw(dx * settings.look_sens);
    true
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;
    use crate::types::{RIGHT_VEC, UP_VEC};

    #[test]
    fn arrows_depend_on_selection() {
        let s = InputSettings::default();

        assert_eq!(map_key(Key::Up, false, &s), Some(Action::PitchCamera(5.)));
        assert_eq!(map_key(Key::Right, false, &s), Some(Action::YawCamera(-5.)));
        assert_eq!(
            map_key(Key::Up, true, &s),
            Some(Action::RotateSelection {
                angle: 90.,
                vertical_axis: false
            })
        );
        assert_eq!(
            map_key(Key::Right, true, &s),
            Some(Action::RotateSelection {
                angle: -90.,
                vertical_axis: true
            })
        );
    }

    #[test]
    fn other_keys_ignore_selection() {
        let s = InputSettings::default();

        for has_selection in [false, true] {
            assert_eq!(map_key(Key::Escape, has_selection, &s), Some(Action::Quit));
            assert_eq!(
                map_key(Key::A, has_selection, &s),
                Some(Action::Move(MoveDir::Left))
            );
            assert_eq!(
                map_key(Key::C, has_selection, &s),
                Some(Action::ToggleCameraMode)
            );
            assert_eq!(
                map_key(Key::N, has_selection, &s),
                Some(Action::Create(EntityKind::Rail))
            );
            assert_eq!(map_key(Key::U, has_selection, &s), Some(Action::Undo));
            assert_eq!(map_key(Key::R, has_selection, &s), Some(Action::Deselect));
            assert_eq!(map_key(Key::Shift, has_selection, &s), None);
        }
    }

    #[test]
    fn winit_translation() {
        assert_eq!(key_from_code(KeyCode::KeyW), Some(Key::W));
        assert_eq!(key_from_code(KeyCode::ShiftRight), Some(Key::Shift));
        assert_eq!(key_from_code(KeyCode::F5), None);

        assert_eq!(button_from_winit(MouseButton::Left), Some(PointerButton::Left));
        assert_eq!(button_from_winit(MouseButton::Back), None);

        assert_eq!(scroll_amount(MouseScrollDelta::LineDelta(0., -2.)), -2.);
        let px = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0., 80.));
        assert_eq!(scroll_amount(px), 2.);
    }

    #[test]
    fn orbit_uses_dominant_axis() {
        let s = InputSettings::default();
        let mut cam = Camera::default();

        assert!(orbit_drag(&mut cam, 100., 3., &s));
        // Pure yaw; no pitch crept in.
        assert!(cam.forward().y.abs() < 1e-5);
        assert!(cam.forward().x.abs() > 0.1);

        let mut cam = Camera::default();
        assert!(orbit_drag(&mut cam, 3., 100., &s));
        assert!(cam.forward().x.abs() < 1e-5);
        assert!(cam.forward().y.abs() > 0.1);

        assert!(!orbit_drag(&mut cam, 0., 0., &s));
    }

    #[test]
    fn orbit_drags_the_world_with_the_pointer() {
        let s = InputSettings::default();

        // Dragging right swings the world right, so the view turns left.
        let mut cam = Camera::default();
        orbit_drag(&mut cam, 50., 0., &s);
        assert!(cam.forward().dot(RIGHT_VEC) < -0.01);

        // Dragging down pulls the world down, so the view tips up.
        let mut cam = Camera::default();
        orbit_drag(&mut cam, 0., 50., &s);
        assert!(cam.forward().dot(UP_VEC) > 0.01);
    }

    #[test]
    fn free_look_keeps_horizon_level() {
        let s = InputSettings::default();
        let mut cam = Camera::default();

        assert!(free_look(&mut cam, 40., -25., &s));
        assert!(cam.right().y.abs() < 1e-5);
        assert!(!free_look(&mut cam, 0., 0., &s));
    }
}
