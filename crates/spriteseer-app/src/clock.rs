//! Frame timing.

use std::time::{Duration, Instant};

use spriteseer_core::constants::FPS_MEASURE_INTERVAL_MS;

/// Measures the simulation delta, once per frame.
#[derive(Debug, Clone)]
pub struct SimClock {
    last: Instant,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds since the previous tick (or since creation).
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame-rate statistics over the whole run, plus a periodic log line.
#[derive(Debug, Clone)]
pub struct FpsStats {
    min: f64,
    max: f64,
    sum: f64,
    frames: u64,
    window_frames: u32,
    window_time: Duration,
}

impl Default for FpsStats {
    fn default() -> Self {
        Self {
            min: f64::MAX,
            max: 0.0,
            sum: 0.0,
            frames: 0,
            window_frames: 0,
            window_time: Duration::ZERO,
        }
    }
}

impl FpsStats {
    /// Record one frame that took `dt` seconds.
    ///
    /// Returns the average frame rate of the last measurement interval each
    /// time an interval completes.
    pub fn record(&mut self, dt: f32) -> Option<f64> {
        if dt > 0.0 {
            let fps = 1.0 / f64::from(dt);
            self.min = self.min.min(fps);
            self.max = self.max.max(fps);
            self.sum += fps;
            self.frames += 1;
        }

        self.window_frames += 1;
        self.window_time += Duration::from_secs_f32(dt.max(0.0));
        if self.window_time < Duration::from_millis(FPS_MEASURE_INTERVAL_MS) {
            return None;
        }
        let fps = f64::from(self.window_frames) / self.window_time.as_secs_f64();
        self.window_frames = 0;
        self.window_time = Duration::ZERO;
        Some(fps)
    }

    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// `(min, max, avg)`, or `None` before the first timed frame.
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> Option<(f64, f64, f64)> {
        (self.frames > 0).then(|| (self.min, self.max, self.sum / self.frames as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tick_measures_elapsed_time() {
        let start = Instant::now();
        let mut clock = SimClock { last: start };
        let dt = clock.tick_at(start + Duration::from_millis(100));
        assert_relative_eq!(dt, 0.1, epsilon = 1e-6);

        let dt = clock.tick_at(start + Duration::from_millis(150));
        assert_relative_eq!(dt, 0.05, epsilon = 1e-6);
    }

    #[test]
    fn stats_track_extremes() {
        let mut stats = FpsStats::default();
        assert!(stats.summary().is_none());

        stats.record(0.01);
        stats.record(0.02);
        stats.record(0.0);
        let (min, max, avg) = stats.summary().unwrap();
        assert_relative_eq!(min, 50.0, epsilon = 1e-3);
        assert_relative_eq!(max, 100.0, epsilon = 1e-3);
        assert_relative_eq!(avg, 75.0, epsilon = 1e-3);
        assert_eq!(stats.frames(), 2);
    }

    #[test]
    fn interval_reports_average_rate() {
        let mut stats = FpsStats::default();
        let reports: Vec<_> = (0..30).filter_map(|_| stats.record(0.02)).collect();
        // 25 frames of 20 ms complete the first 500 ms interval.
        assert_eq!(reports.len(), 1);
        assert_relative_eq!(reports[0], 50.0, epsilon = 0.5);
    }
}
