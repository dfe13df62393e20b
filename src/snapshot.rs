//! Headless rendering.
//!
//! Runs the petal loop on a [`PixelCanvas`] with a [`ManualScheduler`] and
//! writes the last frame to an image file. Handy for previews and for
//! checking a sprite without opening a window.

use std::path::Path;

use image::RgbaImage;

use crate::canvas::PixelCanvas;
use crate::config::EffectConfig;
use crate::effect::PetalLoop;
use crate::error::RunError;
use crate::rng::RandomSource;
use crate::scheduler::ManualScheduler;
use crate::sprite::Sprite;

/// Run `frames` scheduled frames and return the composited final image.
///
/// Returns `None` if the loop never started (the sprite failed to load).
pub fn render_frames<R: RandomSource>(
    config: &EffectConfig,
    sprite: Result<Sprite, crate::error::AssetError>,
    frames: u64,
    rng: R,
) -> Option<RgbaImage> {
    let mut canvas = PixelCanvas::new(config.surface_size);
    let mut scheduler = ManualScheduler::new();
    let mut petal_loop = PetalLoop::new(config, config.surface_size, rng);

    petal_loop.sprite_loaded(sprite, &mut scheduler);
    if !petal_loop.is_running() {
        return None;
    }

    while petal_loop.frames() < frames && scheduler.take_request() {
        petal_loop.frame(&mut canvas, &mut scheduler);
    }
    log::debug!(
        "rendered {} frames, {} petals recycled",
        petal_loop.frames(),
        petal_loop.recycled()
    );

    Some(canvas.composite_over(config.background))
}

/// Load the configured sprite, render `frames` frames and save the result.
///
/// Without a configured path the bundled petal is used. Unlike the window
/// host, a sprite that fails to load is an error here: there would be
/// nothing to write.
pub fn render_snapshot<R: RandomSource>(
    config: &EffectConfig,
    frames: u64,
    output: &Path,
    rng: R,
) -> Result<(), RunError> {
    config.validate()?;
    let sprite = Sprite::load(config.sprite_path.as_deref())?.with_filter(config.filter);

    // The sprite loaded, so the loop always starts.
    let Some(image) = render_frames(config, Ok(sprite), frames, rng) else {
        return Ok(());
    };

    image.save(output).map_err(|source| RunError::Snapshot {
        path: output.to_path_buf(),
        source,
    })?;
    log::info!(
        "wrote {}x{} snapshot after {frames} frames to {}",
        image.width(),
        image.height(),
        output.display()
    );
    Ok(())
}
