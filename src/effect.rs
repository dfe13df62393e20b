//! The petal animation loop.
//!
//! [`PetalLoop`] owns a fixed population of [`Petal`]s and turns one
//! scheduled frame into one simulation tick plus one full redraw. It knows
//! nothing about windows or GPUs: the surface, the random source, the
//! sprite-loaded signal and the "run next frame" capability are all handed
//! in by the host.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► AwaitingSprite ──sprite_loaded(Ok)──► Running ──frame()──┐
//!                 │                                   ▲               │
//!                 └──sprite_loaded(Err)──► Stalled    └───────────────┘
//! ```
//!
//! `Stalled` is terminal: a missing sprite means the effect silently never
//! starts.

use std::sync::Arc;

use glam::Vec2;

use crate::canvas::{Canvas, SurfaceSize};
use crate::config::EffectConfig;
use crate::error::AssetError;
use crate::petal::Petal;
use crate::rng::RandomSource;
use crate::scheduler::FrameScheduler;
use crate::sprite::Sprite;

/// Where the loop is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Petals exist but nothing is drawn until the sprite arrives.
    AwaitingSprite,
    /// Frames are being produced and rescheduled.
    Running,
    /// The sprite failed to load; the loop will never run.
    Stalled,
}

/// A fixed-size population of falling petals.
pub struct PetalLoop<R: RandomSource> {
    petals: Vec<Petal>,
    sprite: Option<Arc<Sprite>>,
    state: LoopState,
    rng: R,
    frames: u64,
    recycled: u64,
}

impl<R: RandomSource> PetalLoop<R> {
    /// Populate `config.petal_count` petals spread across `surface`.
    ///
    /// The loop starts in [`LoopState::AwaitingSprite`]; nothing is
    /// scheduled until [`sprite_loaded`](Self::sprite_loaded) succeeds.
    pub fn new(config: &EffectConfig, surface: SurfaceSize, rng: R) -> Self {
        Self::with_count(config.petal_count, surface, rng)
    }

    /// Populate exactly `count` petals.
    pub fn with_count(count: usize, surface: SurfaceSize, mut rng: R) -> Self {
        let bounds = surface.as_vec2();
        let petals = (0..count).map(|_| Petal::spawn(bounds, &mut rng)).collect();
        log::debug!(
            "spawned {count} petals on a {}x{} surface",
            surface.width,
            surface.height
        );

        Self {
            petals,
            sprite: None,
            state: LoopState::AwaitingSprite,
            rng,
            frames: 0,
            recycled: 0,
        }
    }

    /// Deliver the result of loading the petal sprite.
    ///
    /// On success the loop starts and requests its first frame. On failure
    /// it stalls for good. Only the first notification counts.
    pub fn sprite_loaded<S>(&mut self, result: Result<Sprite, AssetError>, scheduler: &mut S)
    where
        S: FrameScheduler + ?Sized,
    {
        if self.state != LoopState::AwaitingSprite {
            log::debug!("ignoring sprite notification in state {:?}", self.state);
            return;
        }

        match result {
            Ok(sprite) => {
                log::info!(
                    "sprite ready ({}x{}), starting petal loop",
                    sprite.width(),
                    sprite.height()
                );
                self.sprite = Some(Arc::new(sprite));
                self.state = LoopState::Running;
                scheduler.request_frame();
            }
            Err(err) => {
                log::warn!("petal sprite unavailable, effect disabled: {err}");
                self.state = LoopState::Stalled;
            }
        }
    }

    /// Run one scheduled frame: tick every petal, redraw the canvas and
    /// request the next frame.
    ///
    /// While the canvas has a zero side the frame still counts and
    /// reschedules, but petals neither move nor get drawn.
    ///
    /// Does nothing (and schedules nothing) unless the loop is running.
    /// Returns whether a frame was produced.
    pub fn frame<C, S>(&mut self, canvas: &mut C, scheduler: &mut S) -> bool
    where
        C: Canvas + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        let Some(sprite) = self.sprite.clone() else {
            return false;
        };
        if self.state != LoopState::Running {
            return false;
        }

        // Bounds may have changed since the last frame. An empty surface
        // (minimized window) pauses the petals instead of recycling them
        // into a zero-width strip.
        let size = canvas.size();
        if !size.is_empty() {
            let bounds = size.as_vec2();
            canvas.clear();
            for petal in &mut self.petals {
                if petal.update(bounds, &mut self.rng) {
                    self.recycled += 1;
                }
                canvas.draw_sprite(&sprite, petal.placement());
            }
        }

        self.frames += 1;
        scheduler.request_frame();
        true
    }

    /// Advance the simulation one tick without drawing or scheduling.
    ///
    /// Bounds with a zero side leave every petal where it is.
    pub fn step(&mut self, bounds: Vec2) {
        if !(bounds.x > 0.0 && bounds.y > 0.0) {
            return;
        }
        for petal in &mut self.petals {
            if petal.update(bounds, &mut self.rng) {
                self.recycled += 1;
            }
        }
    }

    /// Resynchronize the canvas buffer with a new surface size.
    ///
    /// Petals keep their positions; ones that end up outside the new bounds
    /// are recycled by the normal boundary check.
    pub fn resize<C: Canvas + ?Sized>(&mut self, canvas: &mut C, size: SurfaceSize) {
        if canvas.size() != size {
            log::debug!("resizing canvas to {}x{}", size.width, size.height);
            canvas.resize(size);
        }
    }

    pub fn petals(&self) -> &[Petal] {
        &self.petals
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Frames produced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Petals that have left the surface and re-entered at the top.
    pub fn recycled(&self) -> u64 {
        self.recycled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelCanvas;
    use crate::rng::{ScriptedSource, SmallRngSource};
    use crate::scheduler::ManualScheduler;
    use std::path::PathBuf;

    fn missing_sprite() -> AssetError {
        AssetError::Read {
            path: PathBuf::from("anime/sakura.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        }
    }

    #[test]
    fn test_new_populates_exactly_n() {
        let size = SurfaceSize::new(800, 600);
        let lp = PetalLoop::new(&EffectConfig::default(), size, SmallRngSource::seeded(1));
        assert_eq!(lp.petals().len(), 100);
        assert_eq!(lp.state(), LoopState::AwaitingSprite);
        for petal in lp.petals() {
            assert!((0.0..800.0).contains(&petal.position.x));
            assert!(petal.position.y < 0.0);
        }
    }

    #[test]
    fn test_no_frames_before_sprite() {
        let mut lp = PetalLoop::with_count(5, SurfaceSize::new(64, 64), ScriptedSource::constant(0.5));
        let mut canvas = PixelCanvas::new(SurfaceSize::new(64, 64));
        let mut scheduler = ManualScheduler::new();

        assert!(!lp.frame(&mut canvas, &mut scheduler));
        assert_eq!(scheduler.requests(), 0);
        assert_eq!(lp.frames(), 0);
    }

    #[test]
    fn test_sprite_failure_stalls_forever() {
        let mut lp = PetalLoop::with_count(5, SurfaceSize::new(64, 64), ScriptedSource::constant(0.5));
        let mut canvas = PixelCanvas::new(SurfaceSize::new(64, 64));
        let mut scheduler = ManualScheduler::new();

        lp.sprite_loaded(Err(missing_sprite()), &mut scheduler);
        assert_eq!(lp.state(), LoopState::Stalled);
        assert!(!scheduler.is_pending());

        // A late success does not revive it.
        lp.sprite_loaded(Ok(Sprite::solid(255, 255, 255, 255)), &mut scheduler);
        assert_eq!(lp.state(), LoopState::Stalled);
        assert!(!lp.frame(&mut canvas, &mut scheduler));
        assert_eq!(scheduler.requests(), 0);
    }

    #[test]
    fn test_each_frame_requests_one_more() {
        let mut lp = PetalLoop::with_count(10, SurfaceSize::new(64, 64), SmallRngSource::seeded(2));
        let mut canvas = PixelCanvas::new(SurfaceSize::new(64, 64));
        let mut scheduler = ManualScheduler::new();

        lp.sprite_loaded(Ok(Sprite::solid(255, 200, 220, 255)), &mut scheduler);
        assert_eq!(scheduler.requests(), 1);

        for expected in 1..=50 {
            assert!(scheduler.take_request());
            assert!(lp.frame(&mut canvas, &mut scheduler));
            assert_eq!(lp.frames(), expected);
            assert_eq!(scheduler.requests(), expected + 1);
        }
        assert_eq!(lp.petals().len(), 10);
    }

    #[test]
    fn test_frame_draws_visible_petal() {
        let size = SurfaceSize::new(100, 100);
        let mut lp = PetalLoop::with_count(1, size, ScriptedSource::constant(0.5));
        lp.petals[0] = Petal::at(Vec2::new(50.0, 50.0), 0.5);

        let mut canvas = PixelCanvas::new(size);
        let mut scheduler = ManualScheduler::new();
        lp.sprite_loaded(Ok(Sprite::solid(255, 0, 0, 255)), &mut scheduler);
        lp.frame(&mut canvas, &mut scheduler);

        let petal = &lp.petals()[0];
        let (x, y) = (petal.position.x as u32, petal.position.y as u32);
        assert_eq!(canvas.pixels().get_pixel(x, y)[3], 255);
        assert_eq!(canvas.pixels().get_pixel(0, 99)[3], 0);
    }

    #[test]
    fn test_step_keeps_population() {
        let bounds = Vec2::new(320.0, 240.0);
        let mut lp = PetalLoop::with_count(100, SurfaceSize::new(320, 240), SmallRngSource::seeded(5));
        for _ in 0..5_000 {
            lp.step(bounds);
        }
        assert_eq!(lp.petals().len(), 100);
        assert!(lp.recycled() > 0);
        for petal in lp.petals() {
            assert!(petal.size() > 0.0);
            assert!((0.5..1.0).contains(&petal.depth()));
        }
    }

    #[test]
    fn test_empty_canvas_pauses_petals() {
        let mut lp = PetalLoop::with_count(30, SurfaceSize::new(200, 100), SmallRngSource::seeded(12));
        let mut canvas = PixelCanvas::new(SurfaceSize::new(0, 0));
        let mut scheduler = ManualScheduler::new();
        lp.sprite_loaded(Ok(Sprite::solid(255, 255, 255, 255)), &mut scheduler);
        let before: Vec<Petal> = lp.petals().to_vec();

        for _ in 0..500 {
            assert!(scheduler.take_request());
            assert!(lp.frame(&mut canvas, &mut scheduler));
        }
        lp.step(Vec2::ZERO);

        assert_eq!(lp.petals(), &before[..]);
        assert_eq!(lp.recycled(), 0);
        assert_eq!(lp.frames(), 500);
        assert!(scheduler.is_pending());
    }

    #[test]
    fn test_resize_updates_canvas_not_petals() {
        let mut lp = PetalLoop::with_count(20, SurfaceSize::new(800, 600), SmallRngSource::seeded(9));
        let mut canvas = PixelCanvas::new(SurfaceSize::new(800, 600));
        let before: Vec<Vec2> = lp.petals().iter().map(|p| p.position).collect();

        lp.resize(&mut canvas, SurfaceSize::new(400, 300));

        assert_eq!(canvas.size(), SurfaceSize::new(400, 300));
        let after: Vec<Vec2> = lp.petals().iter().map(|p| p.position).collect();
        assert_eq!(before, after);
    }
}
