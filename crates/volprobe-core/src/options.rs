//! Configuration options for volprobe.

use std::path::{Path, PathBuf};

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::color_maps::DEFAULT_COLOR_MAP;
use crate::error::Result;
use crate::grid::GridSettings;
use crate::params::RaymarchParams;
use crate::volume::{NoiseSettings, Volume, DEFAULT_VOLUME_DIMS};

/// Where the density volume comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VolumeSource {
    /// Layered Perlin noise.
    Perlin {
        #[serde(default = "default_volume_dims")]
        dims: UVec3,
        #[serde(default)]
        noise: NoiseSettings,
    },
    /// A headerless little-endian `f32` file.
    File {
        path: PathBuf,
        #[serde(default = "default_volume_dims")]
        dims: UVec3,
    },
}

fn default_volume_dims() -> UVec3 {
    DEFAULT_VOLUME_DIMS
}

impl Default for VolumeSource {
    fn default() -> Self {
        VolumeSource::Perlin {
            dims: DEFAULT_VOLUME_DIMS,
            noise: NoiseSettings::default(),
        }
    }
}

impl VolumeSource {
    /// Generates or loads the volume.
    pub fn build(&self) -> Result<Volume> {
        match self {
            VolumeSource::Perlin { dims, noise } => Volume::perlin(*dims, noise),
            VolumeSource::File { path, dims } => Volume::load(path, *dims),
        }
    }
}

/// Initial state of the fly camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Starting position in world space.
    pub position: Vec3,
    /// Heading in degrees; -90 looks down -Z.
    pub yaw: f32,
    /// Elevation in degrees.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Movement speed in world units per second.
    pub move_speed: f32,
    /// Degrees of rotation per pixel of mouse motion.
    pub mouse_sensitivity: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 2.0),
            yaw: -90.0,
            pitch: 0.0,
            fov_y: 45.0,
            near: 0.01,
            far: 100.0,
            move_speed: 1.5,
            mouse_sensitivity: 0.1,
        }
    }
}

/// Global configuration options for volprobe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Initial window width.
    pub window_width: u32,
    /// Initial window height.
    pub window_height: u32,
    /// Density volume source.
    pub volume: VolumeSource,
    /// Probe lattice.
    pub grid: GridSettings,
    /// Initial raymarch parameters. The density range is replaced by the
    /// volume's own range at startup.
    pub raymarch: RaymarchParams,
    /// Transfer function name.
    pub color_map: String,
    /// Color behind the volume.
    pub background_color: Vec3,
    /// Camera rig.
    pub camera: CameraSettings,
    /// Whether to draw the light marker.
    pub show_lamp: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            window_width: 1024,
            window_height: 768,
            volume: VolumeSource::default(),
            grid: GridSettings::default(),
            raymarch: RaymarchParams::default(),
            color_map: DEFAULT_COLOR_MAP.to_string(),
            background_color: Vec3::new(0.1, 0.1, 0.12),
            camera: CameraSettings::default(),
            show_lamp: true,
        }
    }
}

impl Options {
    /// Reads options from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let options = serde_json::from_str(&text)?;
        log::info!("loaded options from {}", path.display());
        Ok(options)
    }

    /// Writes options as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
