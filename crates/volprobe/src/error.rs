//! Error types for the volprobe application.

use thiserror::Error;
use volprobe_core::VolumeError;
use volprobe_render::{RenderError, ScreenshotError};

/// Errors that stop the demo.
#[derive(Error, Debug)]
pub enum AppError {
    /// Volume, grid, colormap or configuration failure.
    #[error(transparent)]
    Volume(#[from] VolumeError),

    /// GPU setup or frame failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Saving an image failed.
    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),

    /// The event loop could not be created or exited abnormally.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The window could not be created.
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
