//! Copying frames, bounds and probes back to the CPU.

use glam::Vec4;
use volprobe_core::{render_frame, FrameInput, Probe};

use super::RenderEngine;
use crate::error::{RenderError, RenderResult};

impl RenderEngine {
    /// Calculates bytes per row with proper alignment for GPU buffer copies.
    pub(crate) fn aligned_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
        let unaligned = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        unaligned.div_ceil(align) * align
    }

    /// Renders `frame` offscreen and returns its pixels as tightly packed RGBA8.
    pub fn capture_frame(&mut self, frame: &FrameInput) -> RenderResult<Vec<u8>> {
        frame.check_size()?;
        let (width, height) = (frame.params.width, frame.params.height);
        let format = self.surface_config.format;
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Capture Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let mut view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        render_frame(self, frame, &mut view)?;

        let mut pixels = self.read_texture(&texture, width, height, 4)?;
        if matches!(
            format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        ) {
            for chunk in pixels.chunks_exact_mut(4) {
                chunk.swap(0, 2);
            }
        }
        Ok(pixels)
    }

    /// Reads the probe buffer written by the last submitted frame.
    pub fn read_probes(&self) -> RenderResult<Vec<Probe>> {
        let size = self.probe_buffer.size();
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Probe Readback Buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("probe readback encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.probe_buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let bytes = self.map_buffer(&staging)?;
        Ok(bytes
            .chunks_exact(std::mem::size_of::<Probe>())
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }

    /// Reads the front and back bound textures of the last submitted frame.
    ///
    /// Both targets are `Rgba32Float`, so every texel is 16 bytes.
    pub fn read_bounds(&self) -> RenderResult<(Vec<Vec4>, Vec<Vec4>)> {
        let front = self.read_texture(
            &self.bounds_targets.front_texture,
            self.width,
            self.height,
            16,
        )?;
        let back = self.read_texture(
            &self.bounds_targets.back_texture,
            self.width,
            self.height,
            16,
        )?;
        let to_vec4 = |bytes: Vec<u8>| -> Vec<Vec4> {
            bytes
                .chunks_exact(16)
                .map(|texel| Vec4::from_array(bytemuck::pod_read_unaligned::<[f32; 4]>(texel)))
                .collect()
        };
        Ok((to_vec4(front), to_vec4(back)))
    }

    /// Copies a 2D texture into a staging buffer and strips the row padding.
    fn read_texture(
        &self,
        texture: &wgpu::Texture,
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
    ) -> RenderResult<Vec<u8>> {
        let bytes_per_row = Self::aligned_bytes_per_row(width, bytes_per_pixel);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Texture Readback Buffer"),
            size: u64::from(bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("texture readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let data = self.map_buffer(&buffer)?;
        let row_bytes = (width * bytes_per_pixel) as usize;
        let mut result = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height {
            let start = (row * bytes_per_row) as usize;
            result.extend_from_slice(&data[start..start + row_bytes]);
        }
        Ok(result)
    }

    /// Maps a `MAP_READ` buffer, waits for the GPU and returns a copy of its contents.
    fn map_buffer(&self, buffer: &wgpu::Buffer) -> RenderResult<Vec<u8>> {
        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver outlives the poll below.
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|_| RenderError::Timeout)?;
        rx.recv()
            .map_err(|_| RenderError::BufferMapFailed)?
            .map_err(|_| RenderError::BufferMapFailed)?;

        let data = slice.get_mapped_range().to_vec();
        buffer.unmap();
        Ok(data)
    }
}
