//! Output cadence tracking: `frames_completed / interval` over a
//! minimum reporting window (design spec §4.5).

use std::time::Instant;

/// Minimum elapsed time before [`CadenceTracker::fps`] reports a value.
const MIN_REPORT_INTERVAL_SECS: f32 = 0.5;

/// Tracks completed-frame cadence over a rolling reporting window, per
/// §4.5: "FPS is computed as `frames_completed / interval` with a ≥ 500 ms
/// reporting interval."
#[derive(Debug)]
pub struct CadenceTracker {
    window_start: Instant,
    completed: u32,
    last_fps: Option<f32>,
}

impl CadenceTracker {
    /// A tracker starting a fresh reporting window now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            completed: 0,
            last_fps: None,
        }
    }

    /// Record one completed frame. Rolls the window over and refreshes
    /// [`CadenceTracker::fps`] once the window reaches its minimum length.
    pub fn record_completion(&mut self) {
        self.completed += 1;
        let elapsed = self.window_start.elapsed().as_secs_f32();
        if elapsed >= MIN_REPORT_INTERVAL_SECS {
            self.last_fps = Some(self.completed as f32 / elapsed);
            self.completed = 0;
            self.window_start = Instant::now();
        }
    }

    /// Most recently computed FPS, `None` until a full reporting window has
    /// elapsed at least once.
    #[must_use]
    pub const fn fps(&self) -> Option<f32> {
        self.last_fps
    }
}

impl Default for CadenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a source frame rate to the pipeline's configured target (§4.5:
/// "Target output rate is `min(source_fps, 30 or 60)`").
#[must_use]
pub const fn target_fps(source_fps: u32, configured: u32) -> u32 {
    if source_fps < configured {
        source_fps
    } else {
        configured
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{target_fps, CadenceTracker};

    #[test]
    fn fps_unreported_before_window_elapses() {
        let mut tracker = CadenceTracker::new();
        tracker.record_completion();
        assert!(tracker.fps().is_none());
    }

    #[test]
    fn fps_reports_after_window_elapses() {
        let mut tracker = CadenceTracker::new();
        tracker.window_start = Instant::now() - Duration::from_millis(600);
        tracker.record_completion();
        assert!(tracker.fps().is_some());
    }

    #[test]
    fn target_fps_clamps_to_lower_rate() {
        assert_eq!(target_fps(24, 30), 24);
        assert_eq!(target_fps(60, 30), 30);
        assert_eq!(target_fps(30, 30), 30);
    }
}
