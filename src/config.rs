//! Effect configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "petal_count": 150, "sprite_path": "assets/plum.png" }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::canvas::SurfaceSize;
use crate::error::ConfigError;
use crate::sprite::FilterMode;

/// Number of petals in the default effect.
pub const PETAL_COUNT: usize = 100;

/// Settings for the petal effect and its hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Size of the petal population. Fixed for the lifetime of the loop.
    pub petal_count: usize,
    /// Image drawn for every petal. `None` uses the bundled petal.
    pub sprite_path: Option<PathBuf>,
    /// Sampling filter used when scaling the sprite.
    pub filter: FilterMode,
    /// Window title (window host only).
    pub window_title: String,
    /// Initial window size, or the canvas size in headless mode.
    pub surface_size: SurfaceSize,
    /// Opaque colour behind the petals, sRGB in 0..1.
    pub background: [f32; 3],
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            petal_count: PETAL_COUNT,
            sprite_path: None,
            filter: FilterMode::Linear,
            window_title: "Sakura".to_string(),
            surface_size: SurfaceSize::new(1280, 720),
            background: [0.09, 0.07, 0.16],
        }
    }
}

impl EffectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Set the petal population size.
    pub fn with_petal_count(mut self, count: usize) -> Self {
        self.petal_count = count;
        self
    }

    /// Draw petals with the image at `path` instead of the bundled one.
    pub fn with_sprite_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sprite_path = Some(path.into());
        self
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = title.into();
        self
    }

    pub fn with_surface_size(mut self, width: u32, height: u32) -> Self {
        self.surface_size = SurfaceSize::new(width, height);
        self
    }

    pub fn with_background(mut self, rgb: [f32; 3]) -> Self {
        self.background = rgb;
        self
    }

    /// Reject values the effect cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.petal_count == 0 {
            return Err(ConfigError::Invalid("petal_count must be greater than 0".into()));
        }
        if self.surface_size.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "surface_size must be non-zero, got {}x{}",
                self.surface_size.width, self.surface_size.height
            )));
        }
        if self.background.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::Invalid(format!(
                "background components must be within 0..1, got {:?}",
                self.background
            )));
        }
        Ok(())
    }
}
