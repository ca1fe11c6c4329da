//! Probe lattice layout.

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VolumeError};

/// A single lighting probe.
///
/// Layout matches the WGSL `Probe` struct (16 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Probe {
    /// World-space probe position, cached for shader lookup.
    pub position: [f32; 3],
    /// Fraction of the light reaching this probe, in `[0, 1]`.
    pub transmittance: f32,
}

/// User-facing grid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Number of probes along each axis.
    pub dims: UVec3,
    /// World-space minimum corner.
    pub min: Vec3,
    /// World-space maximum corner.
    pub max: Vec3,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            dims: UVec3::splat(16),
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }
}

/// Immutable probe grid parameters with derived quantities.
///
/// `cell_size = (max - min) / (dims - 1)` componentwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridParams {
    dims: UVec3,
    min: Vec3,
    max: Vec3,
    extents: Vec3,
    extents_rcp: Vec3,
    cell_size: Vec3,
}

impl GridParams {
    /// Validates the settings and derives extents and cell size.
    ///
    /// Every axis needs at least two probes and a positive extent.
    pub fn new(settings: &GridSettings) -> Result<Self> {
        let GridSettings { dims, min, max } = *settings;
        if dims.min_element() < 2 {
            return Err(VolumeError::InvalidGrid(format!(
                "grid needs at least 2 probes per axis, got {}x{}x{}",
                dims.x, dims.y, dims.z
            )));
        }

        let extents = max - min;
        if extents.min_element() <= 0.0 || !extents.is_finite() {
            return Err(VolumeError::InvalidGrid(format!(
                "grid bounds are empty: min {min}, max {max}"
            )));
        }

        Ok(Self {
            dims,
            min,
            max,
            extents,
            extents_rcp: extents.recip(),
            cell_size: extents / (dims - 1).as_vec3(),
        })
    }

    #[must_use]
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.max
    }

    #[must_use]
    pub fn extents(&self) -> Vec3 {
        self.extents
    }

    #[must_use]
    pub fn extents_rcp(&self) -> Vec3 {
        self.extents_rcp
    }

    #[must_use]
    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    /// Total number of probes.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.dims.x as usize * self.dims.y as usize * self.dims.z as usize
    }

    /// Flat probe index: `z * Nx * Ny + y * Nx + x`.
    #[must_use]
    pub fn index(&self, coord: UVec3) -> usize {
        let nx = self.dims.x as usize;
        let ny = self.dims.y as usize;
        coord.z as usize * nx * ny + coord.y as usize * nx + coord.x as usize
    }

    /// Inverse of [`GridParams::index`].
    #[must_use]
    pub fn coord(&self, index: usize) -> UVec3 {
        let nx = self.dims.x as usize;
        let ny = self.dims.y as usize;
        UVec3::new(
            (index % nx) as u32,
            ((index / nx) % ny) as u32,
            (index / (nx * ny)) as u32,
        )
    }

    /// World-space position of the probe at `coord`.
    #[must_use]
    pub fn position(&self, coord: UVec3) -> Vec3 {
        coord.as_vec3() * self.cell_size + self.min
    }

    /// Continuous lattice coordinates of a world-space point, clamped to the grid.
    #[must_use]
    pub fn lattice_coords(&self, world: Vec3) -> Vec3 {
        let g = (world - self.min) * self.extents_rcp * (self.dims - 1).as_vec3();
        g.clamp(Vec3::ZERO, (self.dims - 1).as_vec3())
    }
}
