//! Fullscreen raymarch pass.

use crate::bounds_pass::BoundsTargets;
use crate::buffer::{storage_entry, texture_entry, uniform_entry};
use crate::error::RenderResult;
use crate::shader::ShaderBuilder;

/// Integrates the volume between the bounds and blends it over the target.
pub struct RaymarchPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// Buffers and views the raymarch bind group references.
pub struct RaymarchBindings<'a> {
    pub model_buffer: &'a wgpu::Buffer,
    pub raymarch_buffer: &'a wgpu::Buffer,
    pub grid_buffer: &'a wgpu::Buffer,
    pub volume_view: &'a wgpu::TextureView,
    pub bounds: &'a BoundsTargets,
    pub probe_buffer: &'a wgpu::Buffer,
    pub colormap_buffer: &'a wgpu::Buffer,
}

impl RaymarchPass {
    /// Creates the raymarch pipeline for the given output format.
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> RenderResult<Self> {
        let fragment = wgpu::ShaderStages::FRAGMENT;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Raymarch Bind Group Layout"),
            entries: &[
                uniform_entry(0, fragment),
                uniform_entry(1, fragment),
                uniform_entry(2, fragment),
                texture_entry(3, fragment, wgpu::TextureViewDimension::D3),
                texture_entry(4, fragment, wgpu::TextureViewDimension::D2),
                texture_entry(5, fragment, wgpu::TextureViewDimension::D2),
                storage_entry(6, fragment, true),
                storage_entry(7, fragment, true),
            ],
        });

        let shader = ShaderBuilder::new()
            .with_source(include_str!("shaders/raymarch.wgsl"))
            .with_label("Raymarch Shader")
            .build_module(device)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Raymarch Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Raymarch Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: output_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }

    /// Creates a bind group. Must be recreated when the bounds targets are.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        bindings: &RaymarchBindings<'_>,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Raymarch Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: bindings.model_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: bindings.raymarch_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: bindings.grid_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(bindings.volume_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&bindings.bounds.front_view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(&bindings.bounds.back_view),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: bindings.probe_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: bindings.colormap_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// Clears the target to the background and blends the volume over it.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
        background: wgpu::Color,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Raymarch Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(background),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1); // Fullscreen triangle
    }
}
