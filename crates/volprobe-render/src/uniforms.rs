//! GPU parameter blocks.
//!
//! Each struct mirrors a WGSL struct in `common.wgsl` field for field, with
//! explicit padding so every `vec3` starts on a 16-byte boundary.

use glam::Vec3;
use volprobe_core::{FrameInput, GridParams, RaymarchParams};

/// Transforms for the cube and camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct ModelUniforms {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub inv_world: [[f32; 4]; 4],
    pub camera_local: [f32; 3],
    pub _padding: f32,
}

impl ModelUniforms {
    /// Packs the frame's transforms.
    #[must_use]
    pub fn from_frame(frame: &FrameInput) -> Self {
        Self {
            world: frame.world.to_cols_array_2d(),
            view: frame.camera.view.to_cols_array_2d(),
            proj: frame.camera.proj.to_cols_array_2d(),
            inv_world: frame.inv_world().to_cols_array_2d(),
            camera_local: frame.camera_local().to_array(),
            _padding: 0.0,
        }
    }
}

/// Raymarch and light march parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct RaymarchUniforms {
    pub width: u32,
    pub height: u32,
    pub min_val: f32,
    pub max_val: f32,
    pub light_pos: [f32; 3],
    pub absorption: f32,
    pub density_scale: f32,
    pub ambient: f32,
    pub use_probes: u32, // 0 = off, 1 = on
    pub interpolation: u32, // 0 = nearest, 1 = trilinear
    pub step_size: f32,
    pub max_steps: u32,
    pub opacity_cutoff: f32,
    pub light_step_size: f32,
    pub light_max_steps: u32,
    pub colormap_len: u32,
    pub _padding: [u32; 2],
}

impl RaymarchUniforms {
    /// Packs the per-frame parameters.
    #[must_use]
    pub fn new(params: &RaymarchParams, colormap_len: u32) -> Self {
        let march = &params.march;
        Self {
            width: params.width,
            height: params.height,
            min_val: params.min_val,
            max_val: params.max_val,
            light_pos: params.light_pos.to_array(),
            absorption: params.absorption,
            density_scale: params.density_scale,
            ambient: params.ambient,
            use_probes: u32::from(params.use_probes),
            interpolation: params.interpolation.to_index(),
            step_size: march.step_size.max(1e-4),
            max_steps: march.max_steps,
            opacity_cutoff: march.opacity_cutoff,
            light_step_size: march.light_step_size.max(1e-4),
            light_max_steps: march.light_max_steps,
            colormap_len,
            _padding: [0; 2],
        }
    }
}

/// Probe lattice layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct GridUniforms {
    pub dims: [u32; 3],
    pub probe_count: u32,
    pub min: [f32; 3],
    pub _pad0: f32,
    pub max: [f32; 3],
    pub _pad1: f32,
    pub extents: [f32; 3],
    pub _pad2: f32,
    pub extents_rcp: [f32; 3],
    pub _pad3: f32,
    pub cell_size: [f32; 3],
    pub _pad4: f32,
}

impl GridUniforms {
    /// Packs the grid parameters.
    #[must_use]
    pub fn from_params(grid: &GridParams) -> Self {
        Self {
            dims: grid.dims().to_array(),
            probe_count: grid.probe_count() as u32,
            min: grid.min().to_array(),
            _pad0: 0.0,
            max: grid.max().to_array(),
            _pad1: 0.0,
            extents: grid.extents().to_array(),
            _pad2: 0.0,
            extents_rcp: grid.extents_rcp().to_array(),
            _pad3: 0.0,
            cell_size: grid.cell_size().to_array(),
            _pad4: 0.0,
        }
    }
}

/// Light marker transform and color.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LampUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

impl LampUniforms {
    /// Places the marker at the frame's light.
    #[must_use]
    pub fn from_frame(frame: &FrameInput, size: f32, color: Vec3) -> Self {
        Self {
            view_proj: (frame.camera.proj * frame.camera.view).to_cols_array_2d(),
            position: frame.params.light_pos.to_array(),
            size,
            color: color.extend(1.0).to_array(),
        }
    }
}
