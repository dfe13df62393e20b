//! The decorative petal image.
//!
//! A [`Sprite`] is an RGBA bitmap plus the filter used when it is scaled
//! onto the canvas. Sprites are loaded once at startup; the window host
//! decodes on a background thread with [`load_in_background`] and only
//! starts the petal loop once the result arrives.
//!
//! When no image path is configured the petal shipped in
//! `assets/sakura.png`, compiled into the binary, is used.
//!
//! # Supported Formats
//!
//! - PNG (recommended, keeps the petal's alpha)
//! - JPEG

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use glam::Vec2;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// Encoded default petal, 64x64 PNG.
const BUILTIN_PETAL: &[u8] = include_bytes!("../assets/sakura.png");

/// Filter mode for sprite sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Smooth bilinear filtering (default).
    #[default]
    Linear,
    /// Sharp nearest-neighbor filtering. Good for pixel art.
    Nearest,
}

/// A decoded petal image.
#[derive(Debug, Clone)]
pub struct Sprite {
    pixels: RgbaImage,
    filter: FilterMode,
}

impl Sprite {
    /// Create a sprite from raw RGBA data (4 bytes per pixel).
    ///
    /// # Example
    ///
    /// ```ignore
    /// // 2x1: red, blue
    /// let sprite = Sprite::from_rgba(vec![255, 0, 0, 255, 0, 0, 255, 255], 2, 1)?;
    /// ```
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, AssetError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(AssetError::SizeMismatch {
                len: data.len(),
                expected,
                width,
                height,
            });
        }
        let pixels = RgbaImage::from_raw(width, height, data).ok_or(AssetError::SizeMismatch {
            len: expected,
            expected,
            width,
            height,
        })?;
        Self::from_image(pixels)
    }

    /// Decode a sprite from encoded image bytes (PNG or JPEG).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let pixels = image::load_from_memory(bytes)?.into_rgba8();
        Self::from_image(pixels)
    }

    /// Load a sprite from an image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let pixels = image::load_from_memory(&bytes)
            .map_err(|source| AssetError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgba8();
        Self::from_image(pixels)
    }

    /// The default petal bundled with the crate.
    pub fn builtin() -> Result<Self, AssetError> {
        Self::from_bytes(BUILTIN_PETAL)
    }

    /// Load `path`, or the bundled petal when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self, AssetError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    /// Wrap an already decoded image.
    pub fn from_image(pixels: RgbaImage) -> Result<Self, AssetError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::Empty { width, height });
        }
        Ok(Self {
            pixels,
            filter: FilterMode::Linear,
        })
    }

    /// A 1x1 sprite of a single colour.
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(1, 1, image::Rgba([r, g, b, a])),
            filter: FilterMode::Nearest,
        }
    }

    /// Set the filter mode.
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Sample the sprite at `uv` (0..1 on both axes, clamped to the edge).
    ///
    /// Returns straight-alpha RGBA in 0..1.
    pub fn sample(&self, uv: Vec2) -> [f32; 4] {
        let uv = uv.clamp(Vec2::ZERO, Vec2::ONE);
        match self.filter {
            FilterMode::Nearest => {
                let x = ((uv.x * self.width() as f32) as u32).min(self.width() - 1);
                let y = ((uv.y * self.height() as f32) as u32).min(self.height() - 1);
                self.texel(x, y)
            }
            FilterMode::Linear => {
                // Texel centres sit at half-integer coordinates.
                let fx = (uv.x * self.width() as f32 - 0.5).max(0.0);
                let fy = (uv.y * self.height() as f32 - 0.5).max(0.0);
                let x0 = (fx as u32).min(self.width() - 1);
                let y0 = (fy as u32).min(self.height() - 1);
                let x1 = (x0 + 1).min(self.width() - 1);
                let y1 = (y0 + 1).min(self.height() - 1);
                let tx = fx - x0 as f32;
                let ty = fy - y0 as f32;

                let top = lerp4(self.texel(x0, y0), self.texel(x1, y0), tx);
                let bottom = lerp4(self.texel(x0, y1), self.texel(x1, y1), tx);
                lerp4(top, bottom, ty)
            }
        }
    }

    fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels.get_pixel(x, y).0.map(|c| c as f32 / 255.0)
    }
}

fn lerp4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

/// Decode a sprite on a dedicated thread and hand the result to `on_done`.
///
/// `on_done` runs on the loader thread exactly once, with either the sprite
/// or the reason it could not be loaded.
pub fn load_in_background<F>(
    path: Option<PathBuf>,
    filter: FilterMode,
    on_done: F,
) -> std::io::Result<JoinHandle<()>>
where
    F: FnOnce(Result<Sprite, AssetError>) + Send + 'static,
{
    thread::Builder::new()
        .name("sprite-loader".into())
        .spawn(move || {
            match &path {
                Some(path) => log::debug!("decoding sprite {}", path.display()),
                None => log::debug!("decoding built-in sprite"),
            }
            let result = Sprite::load(path.as_deref()).map(|sprite| sprite.with_filter(filter));
            on_done(result);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    fn encode_png(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("PNG encoding should succeed");
        bytes
    }

    #[test]
    fn test_from_rgba_size_mismatch() {
        let err = Sprite::from_rgba(vec![0; 7], 2, 1).unwrap_err();
        assert!(matches!(err, AssetError::SizeMismatch { expected: 8, .. }));
    }

    #[test]
    fn test_empty_sprite_rejected() {
        let err = Sprite::from_rgba(Vec::new(), 0, 4).unwrap_err();
        assert!(matches!(err, AssetError::Empty { width: 0, height: 4 }));
    }

    #[test]
    fn test_from_bytes_png() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]));
        let sprite = Sprite::from_bytes(&encode_png(&image)).unwrap();
        assert_eq!((sprite.width(), sprite.height()), (3, 2));
        assert_eq!(sprite.filter(), FilterMode::Linear);
    }

    #[test]
    fn test_from_bytes_garbage() {
        let err = Sprite::from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AssetError::DecodeBytes(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Sprite::from_file("no/such/petal.png").unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
    }

    #[test]
    fn test_nearest_sampling() {
        let sprite = Sprite::from_rgba(vec![255, 0, 0, 255, 0, 0, 255, 255], 2, 1)
            .unwrap()
            .with_filter(FilterMode::Nearest);
        assert_eq!(sprite.sample(Vec2::new(0.1, 0.5)), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(sprite.sample(Vec2::new(0.9, 0.5)), [0.0, 0.0, 1.0, 1.0]);
        // Clamped to the edge.
        assert_eq!(sprite.sample(Vec2::new(2.0, 0.5)), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_linear_sampling_midpoint() {
        let sprite = Sprite::from_rgba(vec![0, 0, 0, 255, 255, 255, 255, 255], 2, 1).unwrap();
        let mid = sprite.sample(Vec2::new(0.5, 0.5));
        assert!((mid[0] - 0.5).abs() < 1e-4);
        assert!((mid[3] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_load_in_background_reports_failure() {
        let (tx, rx) = mpsc::channel();
        let handle = load_in_background(
            Some(PathBuf::from("no/such/petal.png")),
            FilterMode::Nearest,
            move |result| {
                tx.send(result.is_err()).unwrap();
            },
        )
        .unwrap();
        handle.join().unwrap();
        assert!(rx.recv().unwrap());
    }

    #[test]
    fn test_builtin_petal_decodes() {
        let sprite = Sprite::builtin().unwrap();
        assert_eq!((sprite.width(), sprite.height()), (64, 64));
        // Transparent corner, opaque body.
        assert_eq!(sprite.sample(Vec2::new(0.0, 0.0))[3], 0.0);
        assert!(sprite.sample(Vec2::new(0.5, 0.5))[3] > 0.99);
    }

    #[test]
    fn test_load_without_path_uses_builtin() {
        let sprite = Sprite::load(None).unwrap();
        assert_eq!(sprite.width(), 64);
        let err = Sprite::load(Some(Path::new("no/such/petal.png"))).unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
    }

    #[test]
    fn test_load_in_background_builtin() {
        let (tx, rx) = mpsc::channel();
        let handle = load_in_background(None, FilterMode::Linear, move |result| {
            tx.send(result.map(|s| s.width()).ok()).unwrap();
        })
        .unwrap();
        handle.join().unwrap();
        assert_eq!(rx.recv().unwrap(), Some(64));
    }
}
