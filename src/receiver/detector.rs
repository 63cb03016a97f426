// src/receiver/detector.rs

use crate::common::{
    timing::Tick,
    tuning::{scaled_threshold, DetectorTuning},
};

/// Binary classification of the light level after hysteresis.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Level {
    #[default]
    Low,
    High,
}

/// Rolling min/max over fixed-size blocks of raw samples.
///
/// Thresholds derived from a completed block are applied to the samples of
/// the following block, so decisions always lag one block behind.
#[derive(Debug, Clone)]
pub struct CalibrationWindow {
    tuning: DetectorTuning,
    block_min: u16,
    block_max: u16,
    position: u16,
    low: u16,
    high: u16,
    peak_to_peak: u16,
}

impl CalibrationWindow {
    pub const fn new(tuning: DetectorTuning) -> Self {
        CalibrationWindow {
            tuning,
            block_min: u16::MAX,
            block_max: 0,
            position: 0,
            low: 0,
            high: u16::MAX,
            peak_to_peak: 0,
        }
    }

    /// Folds `sample` into the current block and returns the level it argues for,
    /// or `None` if it sits between the thresholds or the thresholds are not armed yet.
    pub fn observe(&mut self, sample: u16) -> Option<Level> {
        self.block_min = self.block_min.min(sample);
        self.block_max = self.block_max.max(sample);
        self.position += 1;

        let decision = if !self.is_armed() {
            None
        } else if sample >= self.high {
            Some(Level::High)
        } else if sample <= self.low {
            Some(Level::Low)
        } else {
            None
        };

        if self.position >= self.tuning.block_size.max(1) {
            self.close_block();
        }
        decision
    }

    fn close_block(&mut self) {
        self.peak_to_peak = self.block_max - self.block_min;
        self.low = scaled_threshold(self.block_min, self.peak_to_peak, self.tuning.low_percent);
        self.high = scaled_threshold(self.block_min, self.peak_to_peak, self.tuning.high_percent);
        self.position = 0;
        self.block_min = u16::MAX;
        self.block_max = 0;
    }

    /// Whether the previous block had enough amplitude for level decisions.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.peak_to_peak > self.tuning.min_peak_to_peak
    }

    /// Current (low, high) thresholds.
    #[inline]
    pub fn thresholds(&self) -> (u16, u16) {
        (self.low, self.high)
    }

    #[inline]
    pub fn peak_to_peak(&self) -> u16 {
        self.peak_to_peak
    }
}

/// Level tracking with timestamped transitions.
#[derive(Debug, Clone)]
pub struct LevelDetector {
    window: CalibrationWindow,
    level: Level,
    last_flip: Tick,
}

impl LevelDetector {
    pub const fn new(tuning: DetectorTuning) -> Self {
        LevelDetector {
            window: CalibrationWindow::new(tuning),
            level: Level::Low,
            last_flip: Tick::ZERO,
        }
    }

    /// Processes the sample taken at `now`. On a confirmed level change returns
    /// the ticks elapsed since the previous change.
    pub fn observe(&mut self, now: Tick, sample: u16) -> Option<u16> {
        match self.window.observe(sample) {
            Some(next) if next != self.level => {
                self.level = next;
                let duration = now.ticks_since(self.last_flip);
                self.last_flip = now;
                Some(duration)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    #[inline]
    pub fn window(&self) -> &CalibrationWindow {
        &self.window
    }
}

impl Default for LevelDetector {
    fn default() -> Self {
        Self::new(DetectorTuning::DEFAULT)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    /// Feeds one full block alternating between `a` and `b`, returning the next tick.
    fn feed_block(detector: &mut LevelDetector, mut tick: u16, a: u16, b: u16) -> u16 {
        for i in 0..DetectorTuning::DEFAULT.block_size {
            tick = tick.wrapping_add(1);
            let sample = if i % 2 == 0 { a } else { b };
            detector.observe(Tick::new(tick), sample);
        }
        tick
    }

    #[test]
    fn test_initial_state_is_unarmed() {
        let mut window = CalibrationWindow::new(DetectorTuning::DEFAULT);
        assert_eq!(window.thresholds(), (0, u16::MAX));
        assert!(!window.is_armed());
        assert_eq!(window.observe(1023), None);
        assert_eq!(window.observe(0), None);
    }

    #[test]
    fn test_thresholds_from_completed_block() {
        let mut detector = LevelDetector::default();
        let tick = feed_block(&mut detector, 0, 100, 300);
        assert_eq!(detector.window().peak_to_peak(), 200);
        assert_eq!(detector.window().thresholds(), (160, 240));
        assert_eq!(detector.level(), Level::Low);

        // 150 argues for Low, which is where we already are
        assert_eq!(detector.observe(Tick::new(tick + 1), 150), None);
        // 250 crosses the high threshold
        assert_eq!(detector.observe(Tick::new(tick + 2), 250), Some(tick + 2));
        assert_eq!(detector.level(), Level::High);
    }

    #[test]
    fn test_hysteresis_band_holds_level() {
        let mut detector = LevelDetector::default();
        let tick = feed_block(&mut detector, 0, 100, 300);
        assert!(detector.observe(Tick::new(tick + 1), 240).is_some());
        for (i, sample) in [239u16, 200, 161, 239].iter().enumerate() {
            assert_eq!(detector.observe(Tick::new(tick + 2 + i as u16), *sample), None);
        }
        assert_eq!(detector.observe(Tick::new(tick + 10), 160), Some(9));
        assert_eq!(detector.level(), Level::Low);
    }

    #[test]
    fn test_small_amplitude_suppresses_transitions() {
        let mut detector = LevelDetector::default();
        // Exactly 100 counts of peak-to-peak is not enough
        let tick = feed_block(&mut detector, 0, 400, 500);
        assert_eq!(detector.window().peak_to_peak(), 100);
        assert!(!detector.window().is_armed());
        assert_eq!(detector.observe(Tick::new(tick + 1), 1023), None);
        assert_eq!(detector.observe(Tick::new(tick + 2), 0), None);
    }

    #[test]
    fn test_thresholds_lag_one_block() {
        let mut detector = LevelDetector::default();
        let tick = feed_block(&mut detector, 0, 100, 300);
        // During the second block, decisions still use 160/240 even though
        // the block itself spans 0..1000.
        assert_eq!(detector.observe(Tick::new(tick + 1), 0), None);
        assert_eq!(detector.observe(Tick::new(tick + 2), 245), Some(tick + 2));
        assert_eq!(detector.observe(Tick::new(tick + 3), 1000), None);
        let tick = feed_block(&mut detector, tick + 3, 0, 1000);
        assert_eq!(detector.window().thresholds(), (300, 700));
        assert_eq!(detector.level(), Level::High);
        // 250 would have read High under the old thresholds; now it is Low
        assert!(detector.observe(Tick::new(tick + 1), 250).is_some());
        assert_eq!(detector.level(), Level::Low);
    }

    #[test]
    fn test_duration_across_tick_wrap() {
        let mut detector = LevelDetector::default();
        let tick = feed_block(&mut detector, 64_000, 100, 300);
        assert_eq!(tick, 65_000);
        assert_eq!(detector.observe(Tick::new(65_530), 300), Some(65_530));
        assert_eq!(detector.observe(Tick::new(10), 100), Some(16));
    }
}
