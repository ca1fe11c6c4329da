//! The main rendering engine.

mod readback;

use std::sync::Arc;

use glam::Vec3;
use volprobe_core::{
    render_frame, ColorMapLut, FrameInput, GridParams, ProbeGrid, RenderBackend, Volume,
};

use crate::bounds_pass::{BoundsPass, BoundsTargets};
use crate::buffer::{create_storage_buffer, create_uniform_buffer, update_uniform};
use crate::error::{RenderError, RenderResult};
use crate::lamp_pass::LampPass;
use crate::probe_pass::ProbePass;
use crate::raymarch_pass::{RaymarchBindings, RaymarchPass};
use crate::uniforms::{GridUniforms, LampUniforms, ModelUniforms, RaymarchUniforms};

/// Output format for headless rendering. Colors are written as display values.
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// The scene data uploaded once at engine creation.
#[derive(Debug, Clone, Copy)]
pub struct SceneDesc<'a> {
    /// Density volume.
    pub volume: &'a Volume,
    /// Baked transfer function.
    pub lut: &'a ColorMapLut,
    /// Probe lattice.
    pub grid: GridParams,
}

/// The main rendering engine backed by wgpu.
pub struct RenderEngine {
    /// The wgpu instance.
    pub instance: wgpu::Instance,
    /// The wgpu adapter.
    pub adapter: wgpu::Adapter,
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    /// The render surface (None for headless).
    pub surface: Option<wgpu::Surface<'static>>,
    /// Surface configuration.
    pub surface_config: wgpu::SurfaceConfiguration,
    /// Current viewport width.
    pub width: u32,
    /// Current viewport height.
    pub height: u32,
    /// Color behind the volume.
    pub background: Vec3,
    /// Whether to draw the light marker.
    pub show_lamp: bool,
    /// Edge length of the light marker in world units.
    pub lamp_size: f32,
    grid: GridParams,
    // Owns the storage behind `volume_view`.
    _volume_texture: wgpu::Texture,
    volume_view: wgpu::TextureView,
    colormap_buffer: wgpu::Buffer,
    colormap_len: u32,
    probe_buffer: wgpu::Buffer,
    model_buffer: wgpu::Buffer,
    raymarch_buffer: wgpu::Buffer,
    grid_buffer: wgpu::Buffer,
    lamp_buffer: wgpu::Buffer,
    bounds_targets: BoundsTargets,
    bounds_pass: BoundsPass,
    probe_pass: ProbePass,
    raymarch_pass: RaymarchPass,
    lamp_pass: LampPass,
    bounds_bind_group: wgpu::BindGroup,
    probe_bind_group: wgpu::BindGroup,
    raymarch_bind_group: wgpu::BindGroup,
    lamp_bind_group: wgpu::BindGroup,
    encoder: Option<wgpu::CommandEncoder>,
}

impl RenderEngine {
    /// Creates a new windowed render engine.
    pub async fn new_windowed(
        window: Arc<winit::window::Window>,
        scene: &SceneDesc<'_>,
    ) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = request_device(&adapter, "volprobe device").await?;

        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let surface_caps = surface.get_capabilities(&adapter);
        // The raymarch output is already in display space.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::SurfaceConfigurationFailed)?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Self::from_parts(instance, adapter, device, queue, Some(surface), surface_config, scene)
    }

    /// Creates a new headless render engine.
    pub async fn new_headless(width: u32, height: u32, scene: &SceneDesc<'_>) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = request_device(&adapter, "volprobe device (headless)").await?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: HEADLESS_FORMAT,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Self::from_parts(instance, adapter, device, queue, None, surface_config, scene)
    }

    fn from_parts(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: Option<wgpu::Surface<'static>>,
        surface_config: wgpu::SurfaceConfiguration,
        scene: &SceneDesc<'_>,
    ) -> RenderResult<Self> {
        let (width, height) = (surface_config.width, surface_config.height);
        let (volume_texture, volume_view) = upload_volume(&device, &queue, scene.volume)?;

        let colormap = scene.lut.to_rgba_array();
        let colormap_buffer = create_storage_buffer(&device, &colormap, Some("Colormap Buffer"));

        let probes = ProbeGrid::new(scene.grid);
        let probe_buffer = create_storage_buffer(&device, probes.probes(), Some("Probe Buffer"));

        let model_buffer = create_uniform_buffer(
            &device,
            &<ModelUniforms as bytemuck::Zeroable>::zeroed(),
            Some("Model Uniform Buffer"),
        );
        let raymarch_buffer = create_uniform_buffer(
            &device,
            &<RaymarchUniforms as bytemuck::Zeroable>::zeroed(),
            Some("Raymarch Uniform Buffer"),
        );
        let grid_buffer = create_uniform_buffer(
            &device,
            &GridUniforms::from_params(&scene.grid),
            Some("Grid Uniform Buffer"),
        );
        let lamp_buffer = create_uniform_buffer(
            &device,
            &<LampUniforms as bytemuck::Zeroable>::zeroed(),
            Some("Lamp Uniform Buffer"),
        );

        let bounds_pass = BoundsPass::new(&device)?;
        let probe_pass = ProbePass::new(&device)?;
        let raymarch_pass = RaymarchPass::new(&device, surface_config.format)?;
        let lamp_pass = LampPass::new(&device, surface_config.format)?;

        let bounds_targets = BoundsTargets::new(&device, width, height);
        let bounds_bind_group = bounds_pass.create_bind_group(&device, &model_buffer);
        let probe_bind_group = probe_pass.create_bind_group(
            &device,
            &model_buffer,
            &raymarch_buffer,
            &grid_buffer,
            &volume_view,
            &probe_buffer,
        );
        let raymarch_bind_group = raymarch_pass.create_bind_group(
            &device,
            &RaymarchBindings {
                model_buffer: &model_buffer,
                raymarch_buffer: &raymarch_buffer,
                grid_buffer: &grid_buffer,
                volume_view: &volume_view,
                bounds: &bounds_targets,
                probe_buffer: &probe_buffer,
                colormap_buffer: &colormap_buffer,
            },
        );
        let lamp_bind_group = lamp_pass.create_bind_group(&device, &lamp_buffer);

        log::info!(
            "render engine ready: {}x{} {:?}, {} probes, adapter {}",
            width,
            height,
            surface_config.format,
            scene.grid.probe_count(),
            adapter.get_info().name
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface,
            surface_config,
            width,
            height,
            background: Vec3::ZERO,
            show_lamp: true,
            lamp_size: 0.05,
            grid: scene.grid,
            _volume_texture: volume_texture,
            volume_view,
            colormap_buffer,
            colormap_len: colormap.len() as u32,
            probe_buffer,
            model_buffer,
            raymarch_buffer,
            grid_buffer,
            lamp_buffer,
            bounds_targets,
            bounds_pass,
            probe_pass,
            raymarch_pass,
            lamp_pass,
            bounds_bind_group,
            probe_bind_group,
            raymarch_bind_group,
            lamp_bind_group,
            encoder: None,
        })
    }

    /// Returns the probe lattice parameters.
    #[must_use]
    pub fn grid(&self) -> &GridParams {
        &self.grid
    }

    /// Resizes the surface and the bounds targets.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.width = width;
        self.height = height;
        self.surface_config.width = width;
        self.surface_config.height = height;

        if let Some(ref surface) = self.surface {
            surface.configure(&self.device, &self.surface_config);
        }

        self.bounds_targets = BoundsTargets::new(&self.device, width, height);
        self.raymarch_bind_group = self.raymarch_pass.create_bind_group(
            &self.device,
            &RaymarchBindings {
                model_buffer: &self.model_buffer,
                raymarch_buffer: &self.raymarch_buffer,
                grid_buffer: &self.grid_buffer,
                volume_view: &self.volume_view,
                bounds: &self.bounds_targets,
                probe_buffer: &self.probe_buffer,
                colormap_buffer: &self.colormap_buffer,
            },
        );
        log::debug!("resized render targets to {width}x{height}");
    }

    fn write_uniforms(&self, frame: &FrameInput) {
        update_uniform(&self.queue, &self.model_buffer, &ModelUniforms::from_frame(frame));
        update_uniform(
            &self.queue,
            &self.raymarch_buffer,
            &RaymarchUniforms::new(&frame.params, self.colormap_len),
        );
        update_uniform(
            &self.queue,
            &self.lamp_buffer,
            &LampUniforms::from_frame(frame, self.lamp_size, Vec3::new(1.0, 0.95, 0.6)),
        );
    }

    fn background_color(&self) -> wgpu::Color {
        wgpu::Color {
            r: f64::from(self.background.x),
            g: f64::from(self.background.y),
            b: f64::from(self.background.z),
            a: 1.0,
        }
    }

    /// Renders one frame to the window surface and presents it.
    pub fn render(&mut self, frame: &FrameInput) -> RenderResult<()> {
        // The acquired surface texture must match the bounds targets.
        if frame.params.width != self.width || frame.params.height != self.height {
            self.resize(frame.params.width, frame.params.height);
        }

        let output = {
            let Some(surface) = &self.surface else {
                return Err(RenderError::SurfaceConfigurationFailed);
            };
            match surface.get_current_texture() {
                Ok(output) => output,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    log::warn!("surface lost or outdated, reconfiguring");
                    surface.configure(&self.device, &self.surface_config);
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        };

        let mut view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        render_frame(self, frame, &mut view)?;
        output.present();
        Ok(())
    }
}

impl RenderBackend for RenderEngine {
    type Target = wgpu::TextureView;
    type Error = RenderError;

    fn capture_bounds(&mut self, frame: &FrameInput) -> RenderResult<()> {
        frame.check_size()?;
        let (width, height) = (frame.params.width, frame.params.height);
        if width != self.width || height != self.height {
            self.resize(width, height);
        }
        self.write_uniforms(frame);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("volprobe frame encoder"),
            });
        self.bounds_pass
            .render(&mut encoder, &self.bounds_targets, &self.bounds_bind_group);
        self.encoder = Some(encoder);
        Ok(())
    }

    fn fill_probes(&mut self, _frame: &FrameInput) -> RenderResult<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or(RenderError::FrameNotStarted("fill_probes"))?;
        self.probe_pass
            .dispatch(encoder, &self.probe_bind_group, self.grid.dims());
        Ok(())
    }

    fn raymarch(&mut self, _frame: &FrameInput, target: &mut wgpu::TextureView) -> RenderResult<()> {
        let background = self.background_color();
        let encoder = self
            .encoder
            .as_mut()
            .ok_or(RenderError::FrameNotStarted("raymarch"))?;
        self.raymarch_pass
            .render(encoder, target, &self.raymarch_bind_group, background);
        if self.show_lamp {
            self.lamp_pass.render(
                encoder,
                target,
                &self.lamp_bind_group,
                self.bounds_pass.cube_vertices(),
            );
        }
        Ok(())
    }

    fn submit(&mut self) -> RenderResult<()> {
        let encoder = self
            .encoder
            .take()
            .ok_or(RenderError::FrameNotStarted("submit"))?;
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

async fn request_device(
    adapter: &wgpu::Adapter,
    label: &str,
) -> RenderResult<(wgpu::Device, wgpu::Queue)> {
    let device = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
        })
        .await?;
    Ok(device)
}

/// Uploads the density field as an `R32Float` 3D texture.
fn upload_volume(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    volume: &Volume,
) -> RenderResult<(wgpu::Texture, wgpu::TextureView)> {
    let dims = volume.dims();
    let limit = device.limits().max_texture_dimension_3d;
    if dims.max_element() > limit {
        return Err(RenderError::VolumeTooLarge(dims.x, dims.y, dims.z, limit));
    }

    let size = wgpu::Extent3d {
        width: dims.x,
        height: dims.y,
        depth_or_array_layers: dims.z,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Volume Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D3,
        format: wgpu::TextureFormat::R32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(volume.data()),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(dims.x * 4),
            rows_per_image: Some(dims.y),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    Ok((texture, view))
}
