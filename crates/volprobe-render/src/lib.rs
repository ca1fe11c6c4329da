//! Rendering backend for volprobe.
//!
//! This crate provides the wgpu-based [`RenderEngine`], which implements
//! [`volprobe_core::RenderBackend`] with four passes:
//! - front/back bound capture of the unit cube
//! - a compute pass filling the transmittance probe grid
//! - a fullscreen raymarch fragment pass
//! - an optional marker at the light position
//!
//! It also provides the fly camera and screenshot helpers used by the viewer.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Pixel and texel sizes convert between u32, usize and f32
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_arguments)]

pub mod bounds_pass;
pub mod buffer;
pub mod camera;
pub mod engine;
pub mod error;
pub mod lamp_pass;
pub mod probe_pass;
pub mod raymarch_pass;
pub mod screenshot;
pub mod shader;
pub mod uniforms;

pub use camera::{FlyCamera, Movement};
pub use engine::{RenderEngine, SceneDesc, HEADLESS_FORMAT};
pub use error::{RenderError, RenderResult};
pub use screenshot::{save_image, ScreenshotError};
pub use shader::ShaderBuilder;
pub use uniforms::{GridUniforms, LampUniforms, ModelUniforms, RaymarchUniforms};
