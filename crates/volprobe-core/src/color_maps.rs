//! Color maps and the density transfer function lookup table.

use std::collections::HashMap;

use glam::{Vec3, Vec4};

use crate::error::{Result, VolumeError};

/// Number of entries in a baked transfer function table.
pub const LUT_RESOLUTION: usize = 512;

/// Name of the color map used when none is configured.
pub const DEFAULT_COLOR_MAP: &str = "spectral";

/// A color map for mapping scalar values to colors.
#[derive(Debug, Clone)]
pub struct ColorMap {
    /// Color map name.
    pub name: String,
    /// Color samples (evenly spaced from 0 to 1).
    pub colors: Vec<Vec3>,
}

impl ColorMap {
    /// Creates a new color map.
    pub fn new(name: impl Into<String>, colors: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    /// Samples the color map at a given value (0 to 1).
    pub fn sample(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);

        if self.colors.is_empty() {
            return Vec3::ZERO;
        }

        if self.colors.len() == 1 {
            return self.colors[0];
        }

        let n = self.colors.len() - 1;
        let idx = (t * n as f32).floor() as usize;
        let idx = idx.min(n - 1);
        let frac = t * n as f32 - idx as f32;

        self.colors[idx].lerp(self.colors[idx + 1], frac)
    }

    /// Bakes the color map into a fixed-size RGBA table.
    pub fn bake(&self, resolution: usize) -> Result<ColorMapLut> {
        if self.colors.is_empty() {
            return Err(VolumeError::EmptyColorMap(self.name.clone()));
        }
        let resolution = resolution.max(2);
        let last = (resolution - 1) as f32;
        let entries = (0..resolution)
            .map(|i| self.sample(i as f32 / last).extend(1.0))
            .collect();
        Ok(ColorMapLut { entries })
    }
}

/// A baked transfer function, indexed by normalized density.
///
/// The same table is uploaded to the GPU, so CPU and shader lookups agree.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMapLut {
    entries: Vec<Vec4>,
}

impl ColorMapLut {
    /// Returns the table entries.
    #[must_use]
    pub fn entries(&self) -> &[Vec4] {
        &self.entries
    }

    /// Returns the table as plain arrays for buffer upload.
    #[must_use]
    pub fn to_rgba_array(&self) -> Vec<[f32; 4]> {
        self.entries.iter().map(|c| c.to_array()).collect()
    }

    /// Looks up `t` in `[0, 1]`, interpolating linearly between adjacent entries.
    #[must_use]
    pub fn sample(&self, t: f32) -> Vec4 {
        let last = self.entries.len() - 1;
        let x = t.clamp(0.0, 1.0) * last as f32;
        let idx = (x.floor() as usize).min(last - 1);
        let frac = x - idx as f32;
        self.entries[idx].lerp(self.entries[idx + 1], frac)
    }
}

/// Registry for managing color maps.
#[derive(Default)]
pub struct ColorMapRegistry {
    color_maps: HashMap<String, ColorMap>,
}

impl ColorMapRegistry {
    /// Creates a new color map registry with default color maps.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        // Spectral (reversed so dense regions read warm)
        self.register(ColorMap::new(
            "spectral",
            vec![
                Vec3::new(0.369, 0.310, 0.635),
                Vec3::new(0.196, 0.533, 0.741),
                Vec3::new(0.400, 0.761, 0.647),
                Vec3::new(0.671, 0.867, 0.643),
                Vec3::new(0.902, 0.961, 0.596),
                Vec3::new(1.000, 1.000, 0.749),
                Vec3::new(0.996, 0.878, 0.545),
                Vec3::new(0.992, 0.682, 0.380),
                Vec3::new(0.957, 0.427, 0.263),
                Vec3::new(0.835, 0.243, 0.310),
                Vec3::new(0.620, 0.004, 0.259),
            ],
        ));

        // Viridis color map
        self.register(ColorMap::new(
            "viridis",
            vec![
                Vec3::new(0.267, 0.004, 0.329),
                Vec3::new(0.282, 0.140, 0.457),
                Vec3::new(0.253, 0.265, 0.529),
                Vec3::new(0.206, 0.371, 0.553),
                Vec3::new(0.163, 0.471, 0.558),
                Vec3::new(0.127, 0.566, 0.550),
                Vec3::new(0.134, 0.658, 0.517),
                Vec3::new(0.266, 0.749, 0.440),
                Vec3::new(0.477, 0.821, 0.318),
                Vec3::new(0.741, 0.873, 0.150),
                Vec3::new(0.993, 0.906, 0.144),
            ],
        ));

        // Grayscale, handy for inspecting raw density
        self.register(ColorMap::new("gray", vec![Vec3::ZERO, Vec3::ONE]));
    }

    /// Registers a color map.
    pub fn register(&mut self, color_map: ColorMap) {
        self.color_maps.insert(color_map.name.clone(), color_map);
    }

    /// Gets a color map by name.
    pub fn get(&self, name: &str) -> Option<&ColorMap> {
        self.color_maps.get(name)
    }

    /// Bakes the named color map into a lookup table.
    pub fn bake(&self, name: &str, resolution: usize) -> Result<ColorMapLut> {
        self.get(name)
            .ok_or_else(|| VolumeError::UnknownColorMap(name.to_string()))?
            .bake(resolution)
    }
}
