/// Dirty-flag gate between state mutations and layer rebuilds.
///
/// Any number of redraw requests between two frames collapse into a single
/// rebuild. While the window is hidden no frame is drawn; the flag survives
/// and the rebuild happens on the first visible frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameScheduler {
    dirty: bool,
    visible: bool,
    frames: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    /// Creates a visible scheduler with a pending first frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dirty: true,
            visible: true,
            frames: 0,
        }
    }

    /// Marks the layers as stale.
    pub fn request_redraw(&mut self) {
        self.dirty = true;
    }

    /// Suspends or resumes drawing. Returns `true` when the loop resumed.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        let resumed = visible && !self.visible;
        self.visible = visible;
        resumed
    }

    /// Reports whether frames are currently drawn.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.visible
    }

    /// Reports whether a redraw is pending.
    #[must_use]
    pub const fn needs_redraw(&self) -> bool {
        self.dirty
    }

    /// Number of rebuilds performed so far.
    #[must_use]
    pub const fn frames_drawn(&self) -> u64 {
        self.frames
    }

    /// Claims the pending redraw for this frame, clearing the flag.
    ///
    /// Returns `false` when nothing changed or the loop is suspended.
    pub fn begin_frame(&mut self) -> bool {
        if !self.visible || !self.dirty {
            return false;
        }
        self.dirty = false;
        self.frames += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_collapse_into_one_frame() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.begin_frame(), "first frame is always drawn");
        assert!(!scheduler.begin_frame());

        scheduler.request_redraw();
        scheduler.request_redraw();
        assert!(scheduler.begin_frame());
        assert!(!scheduler.begin_frame());
        assert_eq!(scheduler.frames_drawn(), 2);
    }

    #[test]
    fn hidden_scheduler_defers_redraw_until_visible() {
        let mut scheduler = FrameScheduler::new();
        let _ = scheduler.begin_frame();
        assert!(!scheduler.set_visible(false));
        scheduler.request_redraw();
        assert!(!scheduler.begin_frame());
        assert!(scheduler.needs_redraw());

        assert!(scheduler.set_visible(true));
        assert!(!scheduler.set_visible(true), "already running");
        assert!(scheduler.begin_frame());
    }
}
