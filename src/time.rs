//! Frame timing for the window host.
//!
//! The petal loop itself is tick-based: one tick per presented frame, no
//! delta time. [`FrameClock`] only observes how fast frames arrive so the
//! host can report a frame rate.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! // once per presented frame:
//! if let Some(fps) = clock.tick() {
//!     log::debug!("{fps:.1} fps");
//! }
//! ```

use std::time::{Duration, Instant};

/// Counts frames and measures the frame rate over a fixed window.
#[derive(Debug)]
pub struct FrameClock {
    /// When the clock was created.
    start: Instant,
    /// When the last frame was recorded.
    last_frame: Instant,
    /// Time between the last two frames.
    delta: Duration,
    /// Total frames recorded.
    frame_count: u64,
    /// Frame rate measured over the last completed window.
    fps: f32,
    /// Frame count at the start of the current window.
    window_frame_count: u64,
    /// Start of the current measurement window.
    window_start: Instant,
    /// Length of one measurement window.
    report_interval: Duration,
}

impl FrameClock {
    /// Clock reporting the frame rate every 5 seconds.
    pub fn new() -> Self {
        Self::with_report_interval(Duration::from_secs(5))
    }

    pub fn with_report_interval(report_interval: Duration) -> Self {
        Self::starting_at(Instant::now(), report_interval)
    }

    fn starting_at(now: Instant, report_interval: Duration) -> Self {
        Self {
            start: now,
            last_frame: now,
            delta: Duration::ZERO,
            frame_count: 0,
            fps: 0.0,
            window_frame_count: 0,
            window_start: now,
            report_interval,
        }
    }

    /// Record a frame now. Returns the new frame rate whenever a
    /// measurement window completes.
    pub fn tick(&mut self) -> Option<f32> {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Option<f32> {
        self.delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.frame_count += 1;

        let window = now.saturating_duration_since(self.window_start);
        if window < self.report_interval || window.is_zero() {
            return None;
        }

        let frames = self.frame_count - self.window_frame_count;
        self.fps = frames as f32 / window.as_secs_f32();
        self.window_frame_count = self.frame_count;
        self.window_start = now;
        Some(self.fps)
    }

    /// Total frames recorded.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Last measured frame rate (0 until the first window completes).
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Time between the last two frames.
    #[inline]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
