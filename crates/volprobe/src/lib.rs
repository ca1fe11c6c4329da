//! Volumetric raymarching demo.
//!
//! A density volume (Perlin noise or a raw `f32` file) is drawn inside a unit
//! cube. Each frame the cube's front and back faces are captured, a compute
//! pass fills a grid of light transmittance probes, and a fragment pass
//! marches every pixel's ray through the volume, shading samples from the
//! probes.
//!
//! # Quick Start
//!
//! ```no_run
//! use volprobe::{run, Options};
//!
//! run(Options::default()).unwrap();
//! ```
//!
//! Rendering without a window:
//!
//! ```no_run
//! let pixels = volprobe::render_to_image(&volprobe::Options::default(), None).unwrap();
//! assert_eq!(pixels.len(), 1024 * 768 * 4);
//! ```

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Window sizes and mouse deltas convert between u32, f64 and f32
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

mod app;
mod error;
mod scene;

pub use app::{run, App};
pub use error::{AppError, Result};
pub use scene::{render_to_file, render_to_image, Scene};

pub use volprobe_core::{
    glam, CameraSettings, FrameInput, GridSettings, MarchSettings, NoiseSettings, Options,
    ProbeInterpolation, RaymarchParams, Volume, VolumeSource,
};
