//! Dense density volumes: generation, loading and trilinear sampling.

use std::path::Path;

use glam::{UVec3, Vec3};
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VolumeError};

/// Resolution of the volume shipped with the demo assets.
pub const DEFAULT_VOLUME_DIMS: UVec3 = UVec3::splat(64);

/// Parameters for procedural volume generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Seed for the Perlin permutation table.
    pub seed: u32,
    /// Number of octaves to accumulate.
    pub octaves: u32,
    /// Frequency of the first octave, in periods across the volume.
    pub frequency: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 4,
            frequency: 4.0,
        }
    }
}

/// A dense 3D scalar density field.
///
/// Cells are stored with `x` varying fastest, then `y`, then `z`. The density
/// range is computed once at construction and the data is immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    dims: UVec3,
    data: Vec<f32>,
    min: f32,
    max: f32,
}

impl Volume {
    /// Creates a volume from raw cell data, scanning it for the density range.
    pub fn from_data(dims: UVec3, data: Vec<f32>) -> Result<Self> {
        let expected = cell_count(dims)?;
        if data.len() != expected {
            return Err(VolumeError::SizeMismatch {
                expected: expected * 4,
                actual: data.len() * 4,
            });
        }

        let (min, max) = data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &d| {
                (lo.min(d), hi.max(d))
            });

        Ok(Self {
            dims,
            data,
            min,
            max,
        })
    }

    /// Generates a billowy density field from layered 3D Perlin noise.
    ///
    /// Each octave doubles the frequency and halves the amplitude; the absolute
    /// value of every octave is summed, so the result is never negative.
    pub fn perlin(dims: UVec3, settings: &NoiseSettings) -> Result<Self> {
        let count = cell_count(dims)?;
        let perlin = Perlin::new(settings.seed);
        let size = dims.as_dvec3();

        let mut data = Vec::with_capacity(count);
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;

        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    // Sample at cell centers so no cell lands on a lattice point.
                    let p = [
                        (f64::from(x) + 0.5) / size.x,
                        (f64::from(y) + 0.5) / size.y,
                        (f64::from(z) + 0.5) / size.z,
                    ];

                    let mut frequency = settings.frequency;
                    let mut amplitude = 1.0;
                    let mut density = 0.0;
                    for _ in 0..settings.octaves {
                        let n = perlin.get([p[0] * frequency, p[1] * frequency, p[2] * frequency]);
                        density += n.abs() * amplitude;
                        frequency *= 2.0;
                        amplitude *= 0.5;
                    }

                    let density = density as f32;
                    min = min.min(density);
                    max = max.max(density);
                    data.push(density);
                }
            }
        }

        log::info!(
            "generated {}x{}x{} perlin volume ({} octaves), density range [{min}, {max}]",
            dims.x,
            dims.y,
            dims.z,
            settings.octaves
        );

        Ok(Self {
            dims,
            data,
            min,
            max,
        })
    }

    /// Decodes a headerless little-endian `f32` array.
    ///
    /// The byte count must be exactly `width * height * depth * 4`.
    pub fn from_le_bytes(dims: UVec3, bytes: &[u8]) -> Result<Self> {
        let expected = cell_count(dims)? * 4;
        if bytes.len() != expected {
            return Err(VolumeError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let data = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Self::from_data(dims, data)
    }

    /// Loads a `.bin` volume asset.
    pub fn load(path: impl AsRef<Path>, dims: UVec3) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let volume = Self::from_le_bytes(dims, &bytes)?;
        log::info!(
            "loaded volume '{}' ({}x{}x{}), density range [{}, {}]",
            path.display(),
            dims.x,
            dims.y,
            dims.z,
            volume.min,
            volume.max
        );
        Ok(volume)
    }

    /// Encodes the cells in the `.bin` asset layout.
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|d| d.to_le_bytes()).collect()
    }

    /// Writes the volume as a `.bin` asset.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_le_bytes())?;
        Ok(())
    }

    /// Returns the volume resolution.
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Returns the raw cell data.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the smallest cell density.
    #[must_use]
    pub fn min_density(&self) -> f32 {
        self.min
    }

    /// Returns the largest cell density.
    #[must_use]
    pub fn max_density(&self) -> f32 {
        self.max
    }

    /// Flat index of a cell: `z * H * W + y * W + x`.
    #[must_use]
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let w = self.dims.x as usize;
        let h = self.dims.y as usize;
        z as usize * h * w + y as usize * w + x as usize
    }

    /// Returns the density of a cell, or `None` outside the volume.
    #[must_use]
    pub fn cell(&self, x: u32, y: u32, z: u32) -> Option<f32> {
        if x < self.dims.x && y < self.dims.y && z < self.dims.z {
            Some(self.data[self.index(x, y, z)])
        } else {
            None
        }
    }

    fn clamped_cell(&self, x: i32, y: i32, z: i32) -> f32 {
        let max = self.dims.as_ivec3() - 1;
        let x = x.clamp(0, max.x) as u32;
        let y = y.clamp(0, max.y) as u32;
        let z = z.clamp(0, max.z) as u32;
        self.data[self.index(x, y, z)]
    }

    /// Samples the density at normalized coordinates in `[0, 1]^3`.
    ///
    /// Matches hardware linear filtering with clamp-to-edge addressing: texel
    /// centers sit at `(i + 0.5) / n` and coordinates outside the volume repeat
    /// the border cells.
    #[must_use]
    pub fn sample(&self, uvw: Vec3) -> f32 {
        let texel = uvw * self.dims.as_vec3() - Vec3::splat(0.5);
        let base = texel.floor();
        let f = texel - base;
        let i = base.as_ivec3();

        let c000 = self.clamped_cell(i.x, i.y, i.z);
        let c100 = self.clamped_cell(i.x + 1, i.y, i.z);
        let c010 = self.clamped_cell(i.x, i.y + 1, i.z);
        let c110 = self.clamped_cell(i.x + 1, i.y + 1, i.z);
        let c001 = self.clamped_cell(i.x, i.y, i.z + 1);
        let c101 = self.clamped_cell(i.x + 1, i.y, i.z + 1);
        let c011 = self.clamped_cell(i.x, i.y + 1, i.z + 1);
        let c111 = self.clamped_cell(i.x + 1, i.y + 1, i.z + 1);

        let x00 = lerp(c000, c100, f.x);
        let x10 = lerp(c010, c110, f.x);
        let x01 = lerp(c001, c101, f.x);
        let x11 = lerp(c011, c111, f.x);
        let y0 = lerp(x00, x10, f.y);
        let y1 = lerp(x01, x11, f.y);
        lerp(y0, y1, f.z)
    }
}

/// Maps a raw density into `[0, 1]` using the given range.
///
/// A degenerate range (`max <= min`) maps everything at or below `min` to 0
/// and everything above it to 1 instead of dividing by zero.
#[must_use]
pub fn normalize_density(raw: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if range <= f32::EPSILON {
        return if raw > min { 1.0 } else { 0.0 };
    }
    ((raw - min) / range).clamp(0.0, 1.0)
}

fn cell_count(dims: UVec3) -> Result<usize> {
    if dims.x == 0 || dims.y == 0 || dims.z == 0 {
        return Err(VolumeError::InvalidDimensions(dims.x, dims.y, dims.z));
    }
    Ok(dims.x as usize * dims.y as usize * dims.z as usize)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
