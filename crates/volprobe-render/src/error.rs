//! Rendering error types.

use thiserror::Error;

use volprobe_core::VolumeError;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface.
    #[error("failed to create surface: {0}")]
    SurfaceCreationFailed(#[from] wgpu::CreateSurfaceError),

    /// Surface configuration failed.
    #[error("surface configuration failed")]
    SurfaceConfigurationFailed,

    /// Shader composition failed.
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// The volume does not fit in a 3D texture on this device.
    #[error("volume {0}x{1}x{2} exceeds the device 3D texture limit of {3}")]
    VolumeTooLarge(u32, u32, u32, u32),

    /// A pass ran before its inputs existed.
    #[error("frame not started: {0}")]
    FrameNotStarted(&'static str),

    /// Surface lost.
    #[error("surface lost")]
    SurfaceLost,

    /// Surface outdated.
    #[error("surface outdated")]
    SurfaceOutdated,

    /// Out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,

    /// GPU buffer mapping failed.
    #[error("GPU buffer mapping failed")]
    BufferMapFailed,

    /// Volume, color map or configuration error.
    #[error(transparent)]
    Volume(#[from] VolumeError),
}

impl From<RenderError> for VolumeError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Volume(inner) => inner,
            other => VolumeError::Render(other.to_string()),
        }
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost => RenderError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            wgpu::SurfaceError::Timeout => RenderError::Timeout,
            _ => RenderError::SurfaceOutdated,
        }
    }
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
