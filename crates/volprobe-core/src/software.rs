//! CPU implementation of [`RenderBackend`].
//!
//! Runs the same three stages as the GPU engine using the reference
//! algorithms in this crate, parallelized with rayon. Useful for tests and
//! for machines without a graphics adapter.

use glam::{Vec3, Vec4};
use rayon::prelude::*;

use crate::backend::RenderBackend;
use crate::bounds::BoundsBuffers;
use crate::color_maps::ColorMapLut;
use crate::error::VolumeError;
use crate::frame::FrameInput;
use crate::grid::GridParams;
use crate::probes::ProbeGrid;
use crate::raymarch::{Integrator, RaySample};
use crate::volume::Volume;

/// An RGBA float image, row-major from the top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameImage {
    width: u32,
    height: u32,
    pixels: Vec<Vec4>,
}

impl FrameImage {
    /// Creates a black image.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec4::ZERO; width as usize * height as usize],
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width != self.width || height != self.height {
            *self = Self::new(width, height);
        }
    }

    /// Converts to 8-bit RGBA.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.to_array())
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }
}

/// Renders frames entirely on the CPU.
pub struct SoftwareBackend {
    volume: Volume,
    lut: ColorMapLut,
    bounds: BoundsBuffers,
    probes: ProbeGrid,
    samples: Vec<RaySample>,
    background: Vec3,
}

impl SoftwareBackend {
    /// Creates a backend that owns the volume for its lifetime.
    #[must_use]
    pub fn new(volume: Volume, lut: ColorMapLut, grid: GridParams) -> Self {
        Self {
            volume,
            lut,
            bounds: BoundsBuffers::new(0, 0),
            probes: ProbeGrid::new(grid),
            samples: Vec::new(),
            background: Vec3::ZERO,
        }
    }

    /// Sets the color behind the volume.
    #[must_use]
    pub fn with_background(mut self, background: Vec3) -> Self {
        self.background = background;
        self
    }

    /// Bounds captured by the last frame.
    #[must_use]
    pub fn bounds(&self) -> &BoundsBuffers {
        &self.bounds
    }

    /// Probes filled by the last frame.
    #[must_use]
    pub fn probes(&self) -> &ProbeGrid {
        &self.probes
    }

    /// Per-pixel integration results of the last frame, before compositing.
    #[must_use]
    pub fn samples(&self) -> &[RaySample] {
        &self.samples
    }
}

impl RenderBackend for SoftwareBackend {
    type Target = FrameImage;
    type Error = VolumeError;

    fn capture_bounds(&mut self, frame: &FrameInput) -> Result<(), Self::Error> {
        frame.check_size()?;
        self.bounds.resize(frame.params.width, frame.params.height);
        self.bounds.capture(frame);
        Ok(())
    }

    fn fill_probes(&mut self, frame: &FrameInput) -> Result<(), Self::Error> {
        self.probes.fill(&self.volume, frame);
        Ok(())
    }

    fn raymarch(&mut self, frame: &FrameInput, target: &mut FrameImage) -> Result<(), Self::Error> {
        let (width, height) = (self.bounds.width(), self.bounds.height());
        if width != frame.params.width || height != frame.params.height {
            return Err(VolumeError::Render(format!(
                "bounds are {width}x{height} but frame is {}x{}",
                frame.params.width, frame.params.height
            )));
        }

        let integrator = Integrator::new(&self.volume, &self.lut, &frame.params)
            .with_probes(&self.probes)
            .with_world(frame.world);
        let camera_local = frame.camera_local();

        self.samples = self
            .bounds
            .front()
            .par_iter()
            .zip(self.bounds.back().par_iter())
            .map(|(front, back)| integrator.integrate_pixel(*front, *back, camera_local))
            .collect();

        target.resize(width, height);
        let background = self.background;
        target
            .pixels
            .par_iter_mut()
            .zip(self.samples.par_iter())
            .for_each(|(pixel, sample)| *pixel = sample.over(background));
        Ok(())
    }

    fn submit(&mut self) -> Result<(), Self::Error> {
        log::trace!("software frame complete ({} pixels)", self.samples.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::render_frame;
    use crate::color_maps::ColorMapRegistry;
    use crate::frame::CameraMatrices;
    use crate::grid::GridSettings;
    use crate::params::RaymarchParams;
    use glam::UVec3;

    #[test]
    fn test_render_frame_covers_center_only() {
        let volume = Volume::from_data(UVec3::splat(4), vec![1.0; 64]).unwrap();
        let lut = ColorMapRegistry::new().bake("gray", 64).unwrap();
        let grid = GridParams::new(&GridSettings::default()).unwrap();
        let mut backend = SoftwareBackend::new(volume, lut, grid).with_background(Vec3::ONE);

        let camera = CameraMatrices::look_from(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::NEG_Z,
            Vec3::Y,
            0.8,
            1.0,
            0.1,
            10.0,
        );
        let params = RaymarchParams {
            min_val: 0.0,
            max_val: 1.0,
            ..RaymarchParams::default()
        }
        .with_size(17, 17);
        let frame = FrameInput::new(camera, params);

        let mut image = FrameImage::new(1, 1);
        render_frame(&mut backend, &frame, &mut image).unwrap();

        assert_eq!((image.width(), image.height()), (17, 17));
        assert_eq!(image.pixel(0, 0), Vec4::ONE);
        assert!(backend.samples()[8 * 17 + 8].alpha > 0.9);
        assert_eq!(image.to_rgba8().len(), 17 * 17 * 4);
    }

    #[test]
    fn test_zero_sized_frame_is_rejected() {
        let volume = Volume::from_data(UVec3::splat(2), vec![1.0; 8]).unwrap();
        let lut = ColorMapRegistry::new().bake("gray", 8).unwrap();
        let grid = GridParams::new(&GridSettings::default()).unwrap();
        let mut backend = SoftwareBackend::new(volume, lut, grid);
        let camera = CameraMatrices::look_from(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::NEG_Z,
            Vec3::Y,
            0.8,
            1.0,
            0.1,
            10.0,
        );
        let mut image = FrameImage::new(4, 4);

        for (width, height) in [(0, 0), (0, 8), (8, 0)] {
            let params = RaymarchParams {
                width,
                height,
                ..RaymarchParams::default()
            };
            let frame = FrameInput::new(camera, params);
            let result = render_frame(&mut backend, &frame, &mut image);
            assert!(
                matches!(result, Err(VolumeError::EmptyFrame { .. })),
                "{width}x{height} should be rejected"
            );
        }
        assert!(backend.samples().is_empty());
    }

    #[test]
    fn test_raymarch_before_bounds_is_an_error() {
        let volume = Volume::from_data(UVec3::splat(2), vec![0.0; 8]).unwrap();
        let lut = ColorMapRegistry::new().bake("gray", 8).unwrap();
        let grid = GridParams::new(&GridSettings::default()).unwrap();
        let mut backend = SoftwareBackend::new(volume, lut, grid);
        let camera = CameraMatrices::look_from(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::NEG_Z,
            Vec3::Y,
            0.8,
            1.0,
            0.1,
            10.0,
        );
        let frame = FrameInput::new(camera, RaymarchParams::default().with_size(4, 4));
        let mut image = FrameImage::new(4, 4);
        assert!(matches!(
            backend.raymarch(&frame, &mut image),
            Err(VolumeError::Render(_))
        ));
    }
}
