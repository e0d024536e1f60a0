//! Session settings, and the player preferences we persist between runs.

#[cfg(feature = "app_utils")]
use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

#[cfg(feature = "app_utils")]
use bincode::{Decode, Encode};

use crate::{
    error::ConfigError,
    types::{CameraMode, InputSettings},
};

/// Resolutions offered by the settings tray.
pub const RESOLUTIONS: [&str; 24] = [
    "800x600",
    "1024x760",
    "1024x768",
    "1152x864",
    "1280x720",
    "1280x768",
    "1280x800",
    "1280x960",
    "1280x1024",
    "1360x764",
    "1400x1050",
    "1440x900",
    "1600x1200",
    "1680x1050",
    "1792x1344",
    "1856x1392",
    "1920x1080",
    "1920x1200",
    "1920x1440",
    "2560x1440",
    "2560x1600",
    "2880x1800",
    "3840x2160",
    "3840x2400",
];

/// Parse a `"WIDTHxHEIGHT"` string, eg `"1280x720"`.
pub fn parse_resolution(s: &str) -> Result<(u32, u32), ConfigError> {
    let err = || ConfigError::Resolution(s.to_owned());

    let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(err)?;
    let w: u32 = w.trim().parse().map_err(|_| err())?;
    let h: u32 = h.trim().parse().map_err(|_| err())?;

    if w == 0 || h == 0 {
        return Err(err());
    }
    Ok((w, h))
}

/// Fixed rules and tuning for a build session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub input: InputSettings,
    pub starting_cash: u32,
    /// Length of the build countdown.
    pub build_time: f32, // seconds
    /// How long each skybox is shown before moving to the next.
    pub sky_period: f32, // seconds
    /// How many creations can be undone. 0 disables undo.
    pub undo_depth: usize,
    /// New entities are placed this far in front of the camera.
    pub placement_distance: f32,
    /// Seeds the session's RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input: Default::default(),
            starting_cash: 400,
            build_time: 180.,
            sky_period: 288.,
            undo_depth: 1,
            placement_distance: 20.,
            seed: None,
        }
    }
}

/// Player-adjustable settings, saved to disk.
#[cfg_attr(feature = "app_utils", derive(Encode, Decode))]
#[derive(Clone, Debug, PartialEq)]
pub struct Preferences {
    /// 0. to 1.
    pub fx_volume: f32,
    /// 0. to 1.
    pub music_volume: f32,
    /// One of `RESOLUTIONS`.
    pub resolution: String,
    pub camera_mode: CameraMode,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            fx_volume: 1.,
            music_volume: 1.,
            resolution: "1280x720".to_owned(),
            camera_mode: CameraMode::Orbit,
        }
    }
}

impl Preferences {
    pub fn resolution(&self) -> Result<(u32, u32), ConfigError> {
        parse_resolution(&self.resolution)
    }

    /// Keep volumes in range after an edit.
    pub fn clamp(&mut self) {
        self.fx_volume = self.fx_volume.clamp(0., 1.);
        self.music_volume = self.music_volume.clamp(0., 1.);
    }
}

/// Save to file, using Bincode.
#[cfg(feature = "app_utils")]
pub fn save<T: Encode>(path: &Path, data: &T) -> Result<(), ConfigError> {
    let config = bincode::config::standard();
    let encoded: Vec<u8> = bincode::encode_to_vec(data, config)?;

    let mut file = File::create(path)?;
    file.write_all(&encoded)?;
    Ok(())
}

/// Load from file, using Bincode.
#[cfg(feature = "app_utils")]
pub fn load<T: Decode<()>>(path: &Path) -> Result<T, ConfigError> {
    let config = bincode::config::standard();

    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    let (decoded, _len) =
        bincode::decode_from_slice(&buffer, config).map_err(|source| ConfigError::Decode {
            path: path.to_owned(),
            source,
        })?;
    Ok(decoded)
}
