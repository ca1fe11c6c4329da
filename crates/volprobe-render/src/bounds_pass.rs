//! Front and back cube surface passes.

use volprobe_core::unit_cube_triangles;

use crate::buffer::{create_vertex_buffer, uniform_entry};
use crate::error::RenderResult;
use crate::shader::ShaderBuilder;

/// Format of the position targets. Positions need full float precision.
pub const BOUNDS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// The pair of position images the raymarch pass reads.
pub struct BoundsTargets {
    pub front_texture: wgpu::Texture,
    pub front_view: wgpu::TextureView,
    pub back_texture: wgpu::Texture,
    pub back_view: wgpu::TextureView,
}

impl BoundsTargets {
    /// Allocates both targets at the output size.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let create = |label: &str| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: BOUNDS_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        };

        let (front_texture, front_view) = create("bounds front texture");
        let (back_texture, back_view) = create("bounds back texture");
        Self {
            front_texture,
            front_view,
            back_texture,
            back_view,
        }
    }
}

/// Rasterizes the unit cube into the bounds targets.
pub struct BoundsPass {
    front_pipeline: wgpu::RenderPipeline,
    back_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl BoundsPass {
    /// Creates the two cube pipelines.
    pub fn new(device: &wgpu::Device) -> RenderResult<Self> {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bounds Bind Group Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let shader = ShaderBuilder::new()
            .with_source(include_str!("shaders/bounds.wgsl"))
            .with_label("Bounds Shader")
            .build_module(device)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bounds Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let create_pipeline = |label: &str, cull_mode: wgpu::Face| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: 12,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: BOUNDS_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(cull_mode),
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let front_pipeline = create_pipeline("Bounds Front Pipeline", wgpu::Face::Back);
        let back_pipeline = create_pipeline("Bounds Back Pipeline", wgpu::Face::Front);

        let vertices = unit_cube_triangles();
        let vertex_buffer = create_vertex_buffer(device, &vertices, Some("Unit Cube Vertices"));

        Ok(Self {
            front_pipeline,
            back_pipeline,
            bind_group_layout,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        })
    }

    /// The unit cube triangle list, shared with the lamp draw.
    pub fn cube_vertices(&self) -> (&wgpu::Buffer, u32) {
        (&self.vertex_buffer, self.vertex_count)
    }

    /// Creates a bind group for the model uniforms.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        model_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bounds Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        })
    }

    /// Records the entry and exit surface passes.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &BoundsTargets,
        bind_group: &wgpu::BindGroup,
    ) {
        let passes = [
            ("Bounds Front Pass", &targets.front_view, &self.front_pipeline),
            ("Bounds Back Pass", &targets.back_view, &self.back_pipeline),
        ];

        for (label, view, pipeline) in passes {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(0..self.vertex_count, 0..1);
        }
    }
}
