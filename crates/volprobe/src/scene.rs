//! Scene construction and headless rendering.

use pollster::FutureExt;
use volprobe_core::{
    render_frame, ColorMapLut, ColorMapRegistry, FrameImage, FrameInput, GridParams, Options,
    SoftwareBackend, Volume, LUT_RESOLUTION,
};
use volprobe_render::{save_image, FlyCamera, RenderEngine, RenderError, SceneDesc};

use crate::error::Result;

/// Everything built once from [`Options`] before the first frame.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Density volume.
    pub volume: Volume,
    /// Baked transfer function.
    pub lut: ColorMapLut,
    /// Probe lattice.
    pub grid: GridParams,
}

impl Scene {
    /// Generates or loads the volume, bakes the colormap and validates the grid.
    pub fn build(options: &Options) -> Result<Self> {
        let volume = options.volume.build()?;
        let lut = ColorMapRegistry::new().bake(&options.color_map, LUT_RESOLUTION)?;
        let grid = GridParams::new(&options.grid)?;
        Ok(Self { volume, lut, grid })
    }

    /// Borrows the scene in the form the GPU engine uploads.
    pub fn desc(&self) -> SceneDesc<'_> {
        SceneDesc {
            volume: &self.volume,
            lut: &self.lut,
            grid: self.grid,
        }
    }

    /// The frame seen from the configured camera, at the configured window size.
    pub fn initial_frame(&self, options: &Options) -> FrameInput {
        let (width, height) = (options.window_width.max(1), options.window_height.max(1));
        let camera = FlyCamera::new(&options.camera, width as f32 / height as f32);
        let params = options
            .raymarch
            .with_volume_range(&self.volume)
            .with_size(width, height);
        FrameInput::new(camera.matrices(), params)
    }
}

/// Renders one frame without a window and returns tightly packed RGBA8 pixels.
///
/// Uses the configured camera when `frame` is `None`. If no GPU adapter is
/// available the frame is rendered by the software backend instead.
pub fn render_to_image(options: &Options, frame: Option<&FrameInput>) -> Result<Vec<u8>> {
    let scene = Scene::build(options)?;
    let frame = frame.copied().unwrap_or_else(|| scene.initial_frame(options));
    frame.check_size()?;
    let (width, height) = (frame.params.width, frame.params.height);

    match RenderEngine::new_headless(width, height, &scene.desc()).block_on() {
        Ok(mut engine) => {
            engine.background = options.background_color;
            engine.show_lamp = options.show_lamp;
            Ok(engine.capture_frame(&frame)?)
        }
        Err(e @ (RenderError::AdapterCreationFailed | RenderError::DeviceCreationFailed(_))) => {
            log::warn!("{e}, rendering on the CPU");
            let mut backend = SoftwareBackend::new(scene.volume, scene.lut, scene.grid)
                .with_background(options.background_color);
            let mut image = FrameImage::new(width, height);
            render_frame(&mut backend, &frame, &mut image)?;
            Ok(image.to_rgba8())
        }
        Err(e) => Err(e.into()),
    }
}

/// Renders one frame without a window and saves it as PNG or JPEG.
pub fn render_to_file(
    path: impl AsRef<std::path::Path>,
    options: &Options,
    frame: Option<&FrameInput>,
) -> Result<()> {
    let (width, height) = frame.map_or((options.window_width, options.window_height), |f| {
        (f.params.width, f.params.height)
    });
    let pixels = render_to_image(options, frame)?;
    save_image(path, &pixels, width.max(1), height.max(1))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;
    use volprobe_core::{NoiseSettings, VolumeSource};

    fn small_options() -> Options {
        Options {
            window_width: 32,
            window_height: 24,
            volume: VolumeSource::Perlin {
                dims: UVec3::splat(8),
                noise: NoiseSettings::default(),
            },
            ..Options::default()
        }
    }

    #[test]
    fn test_scene_build() {
        let scene = Scene::build(&small_options()).unwrap();
        assert_eq!(scene.volume.dims(), UVec3::splat(8));
        assert_eq!(scene.lut.entries().len(), LUT_RESOLUTION);
        assert_eq!(scene.grid.probe_count(), 16 * 16 * 16);
    }

    #[test]
    fn test_unknown_color_map_fails() {
        let options = Options {
            color_map: "no-such-map".to_string(),
            ..small_options()
        };
        assert!(Scene::build(&options).is_err());
    }

    #[test]
    fn test_initial_frame_uses_volume_range() {
        let options = small_options();
        let scene = Scene::build(&options).unwrap();
        let frame = scene.initial_frame(&options);
        assert_eq!((frame.params.width, frame.params.height), (32, 24));
        assert_eq!(frame.params.min_val, scene.volume.min_density());
        assert_eq!(frame.params.max_val, scene.volume.max_density());
    }
}
