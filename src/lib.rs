//! # Petalfall
//!
//! A falling cherry-blossom overlay: a fixed population of petals drifting
//! down a 2D surface, swaying, spinning and re-entering at the top once
//! they fall out of view.
//!
//! ## Quick Start
//!
//! ```ignore
//! use petalfall::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     let config = EffectConfig::new()
//!         .with_sprite_path("assets/sakura.png")
//!         .with_surface_size(1280, 720);
//!     petalfall::window::run(config)
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Petals
//!
//! Every [`Petal`] gets a depth in `[0.5, 1.0)` when it spawns. Size and fall
//! speed grow with depth, so nearer petals look bigger and fall faster. Each
//! tick a petal falls, sways sideways along a sine of its own height, spins,
//! and is recycled to just above the top edge once it has left the bottom.
//!
//! ### The loop
//!
//! [`PetalLoop`] does no I/O. A host hands it:
//!
//! | Seam | Trait | Implementations |
//! |------|-------|-----------------|
//! | Drawing surface | [`Canvas`] | [`PixelCanvas`] |
//! | Randomness | [`RandomSource`] | [`SmallRngSource`], [`ScriptedSource`] |
//! | Next-frame scheduling | [`FrameScheduler`] | [`ManualScheduler`], [`window::WindowScheduler`] |
//!
//! Nothing is drawn until the petal [`Sprite`] has loaded. If loading fails
//! the effect never starts and the host keeps showing its background.
//!
//! ### Hosts
//!
//! - [`window::run`] opens a winit window and presents the canvas with wgpu.
//! - [`snapshot::render_snapshot`] runs headless and writes a PNG.

pub mod canvas;
pub mod config;
pub mod effect;
pub mod error;
pub mod petal;
pub mod rng;
pub mod scheduler;
mod shader;
pub mod snapshot;
pub mod sprite;
pub mod time;
pub mod window;

pub use canvas::{Canvas, PixelCanvas, Placement, SurfaceSize};
pub use config::{EffectConfig, PETAL_COUNT};
pub use effect::{LoopState, PetalLoop};
pub use error::{AssetError, ConfigError, GpuError, RunError};
pub use glam::Vec2;
pub use petal::Petal;
pub use rng::{RandomSource, ScriptedSource, SmallRngSource};
pub use scheduler::{FrameScheduler, ManualScheduler};
pub use sprite::{FilterMode, Sprite};
pub use time::FrameClock;

/// Convenient re-exports for hosts.
///
/// ```ignore
/// use petalfall::prelude::*;
/// ```
pub mod prelude {
    pub use crate::canvas::{Canvas, PixelCanvas, SurfaceSize};
    pub use crate::config::EffectConfig;
    pub use crate::effect::{LoopState, PetalLoop};
    pub use crate::error::{AssetError, RunError};
    pub use crate::rng::{RandomSource, SmallRngSource};
    pub use crate::scheduler::{FrameScheduler, ManualScheduler};
    pub use crate::sprite::{FilterMode, Sprite};
    pub use crate::Vec2;
}
