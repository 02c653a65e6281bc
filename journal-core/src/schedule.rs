//! Redraw requests and pointer-move frame coalescing.

/// Default interval between applied move frames (about 60 fps).
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Whether a state change requires a new frame.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    /// Something visible changed; compute and compose a new frame.
    Needed,
    /// Nothing visible changed.
    Skip,
}

impl Redraw {
    /// Whether a frame is needed.
    #[must_use]
    pub fn is_needed(self) -> bool {
        self == Self::Needed
    }

    /// Combine two requests; a frame is needed if either needs one.
    pub fn or(self, other: Self) -> Self {
        if self.is_needed() || other.is_needed() {
            Self::Needed
        } else {
            Self::Skip
        }
    }
}

impl From<bool> for Redraw {
    fn from(needed: bool) -> Self {
        if needed {
            Self::Needed
        } else {
            Self::Skip
        }
    }
}

/// Result of offering a frame to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Queued; nothing was pending.
    Scheduled,
    /// Queued, cancelling the previously pending frame.
    Replaced,
    /// Rejected: arrived within the interval of the last applied frame.
    Throttled,
}

/// Holds at most one pending frame and throttles by time.
#[derive(Debug, Clone)]
pub struct FrameScheduler<T> {
    interval_ms: u64,
    pending: Option<T>,
    last_applied_ms: Option<u64>,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL_MS)
    }
}

impl<T> FrameScheduler<T> {
    /// Create a scheduler with the given minimum interval.
    #[must_use]
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            pending: None,
            last_applied_ms: None,
        }
    }

    /// Create a scheduler for a target frame rate.
    #[must_use]
    pub fn from_fps(fps: u32) -> Self {
        Self::new(1000 / u64::from(fps.max(1)))
    }

    /// Minimum interval between applied frames.
    #[must_use]
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Offer a frame produced at `now_ms`.
    pub fn schedule(&mut self, frame: T, now_ms: u64) -> ScheduleOutcome {
        if let Some(last) = self.last_applied_ms {
            if now_ms < last.saturating_add(self.interval_ms) {
                tracing::trace!(now_ms, last, "frame throttled");
                return ScheduleOutcome::Throttled;
            }
        }
        match self.pending.replace(frame) {
            Some(_) => ScheduleOutcome::Replaced,
            None => ScheduleOutcome::Scheduled,
        }
    }

    /// Hand over the pending frame for application at `now_ms`.
    pub fn take_pending(&mut self, now_ms: u64) -> Option<T> {
        let frame = self.pending.take()?;
        self.last_applied_ms = Some(now_ms);
        Some(frame)
    }

    /// Whether a frame is waiting.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending frame, if any. Returns whether one was dropped.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Forget throttle history, e.g. at the start of a new gesture.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_applied_ms = None;
    }
}
