use std::time::{Duration, Instant};

/// What one `render` call did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameReport {
    pub sprites: usize,
    pub triangles: usize,
    pub draw_calls: usize,
    /// The backend dropped the frame (surface timeout, outdated swapchain, ...).
    pub skipped: bool,
}

/// Aggregate over one reporting window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StatsSummary {
    pub frames: u64,
    pub skipped: u64,
    pub draw_calls: u64,
    pub elapsed: Duration,
}

impl StatsSummary {
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.frames as f64 / secs } else { 0.0 }
    }
}

/// Accumulates [`FrameReport`]s and yields a summary once per window.
#[derive(Debug, Clone)]
pub struct FrameStats {
    window: Duration,
    started: Option<Instant>,
    frames: u64,
    skipped: u64,
    draw_calls: u64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            started: None,
            frames: 0,
            skipped: 0,
            draw_calls: 0,
        }
    }

    /// Adds `report`; returns the summary when the window has elapsed at `now`.
    pub fn record(&mut self, report: &FrameReport, now: Instant) -> Option<StatsSummary> {
        let started = *self.started.get_or_insert(now);

        self.frames += 1;
        self.skipped += u64::from(report.skipped);
        self.draw_calls += report.draw_calls as u64;

        let elapsed = now.saturating_duration_since(started);
        if elapsed < self.window {
            return None;
        }

        let summary = StatsSummary {
            frames: self.frames,
            skipped: self.skipped,
            draw_calls: self.draw_calls,
            elapsed,
        };
        *self = Self::with_window(self.window);
        self.started = Some(now);
        Some(summary)
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_emitted_once_per_window() {
        let mut stats = FrameStats::with_window(Duration::from_millis(100));
        let t0 = Instant::now();
        let report = FrameReport { sprites: 2, triangles: 1, draw_calls: 3, skipped: false };

        assert_eq!(stats.record(&report, t0), None);
        assert_eq!(stats.record(&report, t0 + Duration::from_millis(50)), None);

        let skipped = FrameReport { skipped: true, ..FrameReport::default() };
        let summary = stats.record(&skipped, t0 + Duration::from_millis(100)).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.draw_calls, 6);
        assert!((summary.fps() - 30.0).abs() < 1e-9);

        // The next window starts from the summary instant.
        assert_eq!(stats.record(&report, t0 + Duration::from_millis(150)), None);
    }
}
