use std::collections::VecDeque;
use std::time::Duration;

/// Rolling frame-time statistics for the overlay.
#[derive(Debug, Clone)]
pub struct FrameStats {
    window: usize,
    samples: VecDeque<Duration>,
    frames: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameStats {
    /// Keep the last `window` frame times.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            samples: VecDeque::new(),
            frames: 0,
        }
    }

    pub fn record(&mut self, frame_time: Duration) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(frame_time);
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Mean frame time over the window, in milliseconds.
    pub fn mean_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: Duration = self.samples.iter().sum();
        total.as_secs_f64() * 1000.0 / self.samples.len() as f64
    }

    pub fn fps(&self) -> f64 {
        let ms = self.mean_ms();
        if ms > 0.0 { 1000.0 / ms } else { 0.0 }
    }

    pub fn summary(&self) -> String {
        format!("{:.0} fps ({:.2} ms)", self.fps(), self.mean_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_are_zero() {
        let s = FrameStats::default();
        assert_eq!(s.fps(), 0.0);
        assert_eq!(s.frames(), 0);
    }

    #[test]
    fn window_keeps_recent_samples() {
        let mut s = FrameStats::new(2);
        s.record(Duration::from_millis(100));
        s.record(Duration::from_millis(10));
        s.record(Duration::from_millis(10));
        assert!((s.mean_ms() - 10.0).abs() < 1e-9);
        assert!((s.fps() - 100.0).abs() < 1e-6);
        assert_eq!(s.frames(), 3);
        assert_eq!(s.summary(), "100 fps (10.00 ms)");
    }
}
