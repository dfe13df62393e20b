//! Error types for petalfall.
//!
//! Sprite loading, configuration, GPU initialization and the hosts that run
//! the petal loop each get their own error enum. Only the hosts return
//! [`RunError`]; the loop itself never fails once constructed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading the petal sprite.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The sprite file could not be read from disk.
    #[error("failed to read sprite '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The sprite file was read but is not a decodable image.
    #[error("failed to decode sprite '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// In-memory image bytes could not be decoded.
    #[error("failed to decode sprite bytes: {0}")]
    DecodeBytes(#[from] image::ImageError),
    /// The decoded image has no pixels to draw.
    #[error("sprite is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },
    /// Raw RGBA data does not match the stated dimensions.
    #[error("RGBA data is {len} bytes, expected {expected} for {width}x{height}")]
    SizeMismatch {
        len: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
}

/// Errors that can occur while loading or validating an [`EffectConfig`](crate::EffectConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for the window.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    /// Failed to create the GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors returned by the window and snapshot hosts.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("failed to write snapshot '{}': {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to start sprite loader thread: {0}")]
    LoaderThread(#[source] io::Error),
}
