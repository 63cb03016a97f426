// src/common/tuning.rs

//! Compile-time tuning of the optical receiver.
//!
//! The defaults are the values the link was characterised with; boards with
//! a different sensor or tick rate can override them when building a `Receiver`.

/// Adaptive level detector parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DetectorTuning {
    /// Samples per calibration block.
    pub block_size: u16,
    /// Level decisions are suppressed unless the previous block's
    /// peak-to-peak amplitude exceeds this.
    pub min_peak_to_peak: u16,
    /// Low hysteresis threshold, percent of peak-to-peak above the block minimum.
    pub low_percent: u8,
    /// High hysteresis threshold, percent of peak-to-peak above the block minimum.
    pub high_percent: u8,
}

impl DetectorTuning {
    pub const DEFAULT: DetectorTuning = DetectorTuning {
        block_size: 1000,
        min_peak_to_peak: 100,
        low_percent: 30,
        high_percent: 70,
    };
}

impl Default for DetectorTuning {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Bit-timing framer parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FramerTuning {
    /// Most recent periods used to derive the bit thresholds.
    pub window: usize,
    /// Low period threshold, percent of the window's span above its minimum.
    pub low_percent: u8,
    /// High period threshold, percent of the window's span above its minimum.
    pub high_percent: u8,
    /// Minimum gap between the thresholds for a decode to be attempted.
    pub min_separation: u16,
}

impl FramerTuning {
    pub const DEFAULT: FramerTuning = FramerTuning {
        window: 8,
        low_percent: 35,
        high_percent: 65,
        min_separation: 20,
    };
}

impl Default for FramerTuning {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// `min + span * percent / 100`, computed without intermediate overflow.
#[inline]
pub(crate) fn scaled_threshold(min: u16, span: u16, percent: u8) -> u16 {
    let offset = u32::from(span) * u32::from(percent) / 100;
    (u32::from(min) + offset).min(u32::from(u16::MAX)) as u16
}
