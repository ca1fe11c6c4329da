//! Error types for volprobe.

use thiserror::Error;

/// The main error type for volprobe operations.
#[derive(Error, Debug)]
pub enum VolumeError {
    /// Volume data does not match the declared dimensions.
    #[error("volume size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Volume dimensions contain a zero axis.
    #[error("invalid volume dimensions {0}x{1}x{2}")]
    InvalidDimensions(u32, u32, u32),

    /// Probe grid bounds or dimensions are unusable.
    #[error("invalid probe grid: {0}")]
    InvalidGrid(String),

    /// A color map has no color samples.
    #[error("color map '{0}' has no colors")]
    EmptyColorMap(String),

    /// A color map with the given name was not found.
    #[error("color map '{0}' not found")]
    UnknownColorMap(String),

    /// A frame was requested with a zero width or height.
    #[error("frame size {width}x{height} has an empty axis")]
    EmptyFrame { width: u32, height: u32 },

    /// A backend pass failed.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for volprobe operations.
pub type Result<T> = std::result::Result<T, VolumeError>;
