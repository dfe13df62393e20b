//! "Run the next frame" as an injected capability.
//!
//! The petal loop never calls itself. After finishing a frame it asks its
//! [`FrameScheduler`] for exactly one more; the host decides when that frame
//! actually runs. The window host maps this onto
//! `Window::request_redraw`, tests use [`ManualScheduler`] to step one frame
//! at a time.

/// Something that can be asked for one more frame callback.
pub trait FrameScheduler {
    /// Request that the host runs another frame.
    ///
    /// Multiple requests before the host gets round to it collapse into a
    /// single frame.
    fn request_frame(&mut self);
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for &mut S {
    fn request_frame(&mut self) {
        (**self).request_frame();
    }
}

/// Scheduler driven by hand, for tests and headless rendering.
///
/// ```ignore
/// let mut scheduler = ManualScheduler::new();
/// petal_loop.sprite_loaded(Ok(sprite), &mut scheduler);
/// while scheduler.take_request() {
///     petal_loop.frame(&mut canvas, &mut scheduler);
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    pending: bool,
    requests: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a frame has been requested and not yet taken.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending request, if any.
    pub fn take_request(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Total number of `request_frame` calls seen.
    pub fn requests(&self) -> u64 {
        self.requests
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.pending = true;
        self.requests += 1;
    }
}
