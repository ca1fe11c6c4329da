//! Core data model and reference algorithms for volprobe.
//!
//! This crate has no GPU dependency. It provides:
//! - [`Volume`], a dense density field with trilinear sampling
//! - [`GridParams`] and [`ProbeGrid`], the transmittance probe lattice
//! - [`BoundsBuffers`] and [`Integrator`], the CPU twins of the GPU passes
//! - [`RenderBackend`], the interface the frame pipeline drives
//! - [`SoftwareBackend`], a rayon-parallel implementation of that interface
//! - Configuration [`Options`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Index math converts between u32 grid coordinates, usize offsets and f32
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::many_single_char_names)]

pub mod backend;
pub mod bounds;
pub mod color_maps;
pub mod error;
pub mod frame;
pub mod grid;
pub mod options;
pub mod params;
pub mod probes;
pub mod raymarch;
pub mod software;
pub mod volume;

pub use backend::{render_frame, RenderBackend};
pub use bounds::{resolve_segment, unit_cube_triangles, BoundsBuffers, CUBE_HALF_EXTENT};
pub use color_maps::{ColorMap, ColorMapLut, ColorMapRegistry, DEFAULT_COLOR_MAP, LUT_RESOLUTION};
pub use error::{Result, VolumeError};
pub use frame::{CameraMatrices, FrameInput};
pub use grid::{GridParams, GridSettings, Probe};
pub use options::{CameraSettings, Options, VolumeSource};
pub use params::{MarchSettings, ProbeInterpolation, RaymarchParams};
pub use probes::{light_transmittance, ProbeGrid};
pub use raymarch::{Integrator, RaySample};
pub use software::{FrameImage, SoftwareBackend};
pub use volume::{normalize_density, NoiseSettings, Volume, DEFAULT_VOLUME_DIMS};

// Re-export glam for downstream crates
pub use glam;
