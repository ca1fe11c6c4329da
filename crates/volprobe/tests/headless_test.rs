//! Headless rendering integration tests.
//!
//! Without a GPU adapter, frames are rendered by the software backend, so
//! these tests run everywhere.

use volprobe::glam::{UVec3, Vec3};
use volprobe::{render_to_file, render_to_image, NoiseSettings, Options, Scene, VolumeSource};

fn small_options() -> Options {
    Options {
        window_width: 48,
        window_height: 32,
        volume: VolumeSource::Perlin {
            dims: UVec3::splat(12),
            noise: NoiseSettings::default(),
        },
        background_color: Vec3::new(0.2, 0.4, 0.6),
        show_lamp: false,
        ..Options::default()
    }
}

fn has_nontrivial_content(pixels: &[u8], width: u32, height: u32) -> bool {
    assert_eq!(pixels.len(), (width * height * 4) as usize, "pixel buffer size mismatch");
    let first = &pixels[0..4];
    !pixels.chunks(4).all(|px| px == first)
}

#[test]
fn test_render_to_image_default_camera() {
    let pixels = render_to_image(&small_options(), None).unwrap();
    assert!(has_nontrivial_content(&pixels, 48, 32));
}

#[test]
fn test_render_to_image_explicit_frame() {
    let options = small_options();
    let scene = Scene::build(&options).unwrap();
    let mut frame = scene.initial_frame(&options);
    frame.params = frame.params.with_size(20, 10);

    let pixels = render_to_image(&options, Some(&frame)).unwrap();
    assert_eq!(pixels.len(), 20 * 10 * 4);

    // The top-left ray misses the cube.
    let corner = &pixels[0..4];
    assert!((i32::from(corner[0]) - 51).abs() <= 1);
    assert!((i32::from(corner[1]) - 102).abs() <= 1);
    assert!((i32::from(corner[2]) - 153).abs() <= 1);
}

#[test]
fn test_render_to_file_png() {
    let path = std::env::temp_dir().join(format!("volprobe-headless-{}.png", std::process::id()));
    render_to_file(&path, &small_options(), None).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn test_missing_volume_file_is_reported() {
    let options = Options {
        volume: VolumeSource::File {
            path: "does/not/exist.bin".into(),
            dims: UVec3::splat(4),
        },
        ..small_options()
    };
    assert!(render_to_image(&options, None).is_err());
}

#[test]
fn test_render_to_image_rejects_empty_frame() {
    let options = small_options();
    let scene = Scene::build(&options).unwrap();
    let mut frame = scene.initial_frame(&options);
    frame.params.width = 0;

    assert!(render_to_image(&options, Some(&frame)).is_err());
}
