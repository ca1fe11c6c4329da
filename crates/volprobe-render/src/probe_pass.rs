//! Probe fill compute pass.

use glam::UVec3;

use crate::buffer::{storage_entry, texture_entry, uniform_entry};
use crate::error::RenderResult;
use crate::shader::ShaderBuilder;

/// Invocations per workgroup along each axis; matches `@workgroup_size`.
pub const PROBE_WORKGROUP_SIZE: u32 = 4;

/// Workgroup counts covering a probe lattice.
#[must_use]
pub fn workgroup_counts(dims: UVec3) -> UVec3 {
    UVec3::new(
        dims.x.div_ceil(PROBE_WORKGROUP_SIZE),
        dims.y.div_ceil(PROBE_WORKGROUP_SIZE),
        dims.z.div_ceil(PROBE_WORKGROUP_SIZE),
    )
}

/// Recomputes every probe's transmittance toward the light.
pub struct ProbePass {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl ProbePass {
    /// Creates the compute pipeline.
    pub fn new(device: &wgpu::Device) -> RenderResult<Self> {
        let compute = wgpu::ShaderStages::COMPUTE;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Probe Fill Bind Group Layout"),
            entries: &[
                uniform_entry(0, compute),
                uniform_entry(1, compute),
                uniform_entry(2, compute),
                texture_entry(3, compute, wgpu::TextureViewDimension::D3),
                storage_entry(4, compute, false),
            ],
        });

        let shader = ShaderBuilder::new()
            .with_source(include_str!("shaders/probe_fill.wgsl"))
            .with_label("Probe Fill Shader")
            .build_module(device)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Probe Fill Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Probe Fill Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("cs_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }

    /// Creates a bind group. The probe buffer is bound writable here and
    /// read-only in the raymarch pass, never both in one pass.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        model_buffer: &wgpu::Buffer,
        raymarch_buffer: &wgpu::Buffer,
        grid_buffer: &wgpu::Buffer,
        volume_view: &wgpu::TextureView,
        probe_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Probe Fill Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: model_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: raymarch_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: grid_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(volume_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: probe_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// Records one dispatch covering the whole lattice.
    pub fn dispatch(&self, encoder: &mut wgpu::CommandEncoder, bind_group: &wgpu::BindGroup, dims: UVec3) {
        let groups = workgroup_counts(dims);
        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Probe Fill Pass"),
            timestamp_writes: None,
        });
        compute_pass.set_pipeline(&self.pipeline);
        compute_pass.set_bind_group(0, bind_group, &[]);
        compute_pass.dispatch_workgroups(groups.x, groups.y, groups.z);
    }
}
