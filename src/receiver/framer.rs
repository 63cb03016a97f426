// src/receiver/framer.rs

use super::ring::BitTimingRing;
use crate::common::{
    crc::verify_packet_trailer,
    error::FrameReject,
    packet::{set_bit, Packet, PACKET_LEN},
    tuning::{scaled_threshold, FramerTuning},
};

/// Period thresholds separating 0 bits from 1 bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BitThresholds {
    /// Periods at or below this are 0.
    pub low: u16,
    /// Periods at or above this are 1.
    pub high: u16,
}

/// Slides a packet-sized window over the period stream, releasing only
/// windows that decode cleanly and carry a valid CRC trailer.
#[derive(Debug, Clone)]
pub struct Framer {
    ring: BitTimingRing,
    tuning: FramerTuning,
}

impl Framer {
    pub const fn new(tuning: FramerTuning) -> Self {
        Framer { ring: BitTimingRing::new(), tuning }
    }

    /// Records one period measurement and tries to decode the ring as a packet.
    pub fn push(&mut self, period: u16) -> Result<Packet, FrameReject> {
        self.ring.push(period);
        let thresholds = self.thresholds()?;
        let packet = self.decode(thresholds)?;
        verify_packet_trailer(&packet)?;
        Ok(packet)
    }

    /// Thresholds derived from the most recent `window` periods.
    ///
    /// Only the tail of the ring calibrates the split, while the decode spans
    /// the whole ring; the last byte of each packet doubles as the calibration.
    pub fn thresholds(&self) -> Result<BitThresholds, FrameReject> {
        let (min, max) = self
            .ring
            .recent(self.tuning.window.max(1))
            .fold((u16::MAX, 0u16), |(lo, hi), p| (lo.min(p), hi.max(p)));
        let span = max - min;
        let low = scaled_threshold(min, span, self.tuning.low_percent);
        let high = scaled_threshold(min, span, self.tuning.high_percent);

        if high.saturating_sub(low) < self.tuning.min_separation {
            return Err(FrameReject::ShallowModulation { low, high });
        }
        Ok(BitThresholds { low, high })
    }

    fn decode(&self, thresholds: BitThresholds) -> Result<Packet, FrameReject> {
        let mut packet = [0u8; PACKET_LEN];
        for (index, period) in self.ring.oldest_first().enumerate() {
            let bit = if period >= thresholds.high {
                true
            } else if period <= thresholds.low {
                false
            } else {
                return Err(FrameReject::AmbiguousBit { index, period });
            };
            set_bit(&mut packet, index, bit);
        }
        Ok(packet)
    }

    #[inline]
    pub fn ring(&self) -> &BitTimingRing {
        &self.ring
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new(FramerTuning::DEFAULT)
    }
}
