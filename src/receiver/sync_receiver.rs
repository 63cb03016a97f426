// src/receiver/sync_receiver.rs

use super::{detector::LevelDetector, framer::Framer, sources::{SampleSource, TickClock}};
use crate::common::{
    hal_traits::{AnalogSampler, TickTimer},
    packet::Packet,
    pd_config::PdConfig,
    tuning::{DetectorTuning, FramerTuning},
};
use log::{debug, info, trace};

/// Optical data-link receiver for SYNCHRONOUS (busy-waiting) operation.
///
/// Owns every piece of receiver state: the tick clock, the calibration window,
/// the current level and the bit-timing ring. All entry points block until
/// they have a result and never fail; bad candidates are dropped and the
/// receiver keeps listening.
#[derive(Debug)]
pub struct Receiver<T, S> {
    clock: TickClock<T>,
    source: SampleSource<S>,
    detector: LevelDetector,
    framer: Framer,
}

impl<T, S> Receiver<T, S>
where
    T: TickTimer,
    S: AnalogSampler,
{
    pub fn new(timer: T, adc: S) -> Self {
        Self::with_tuning(timer, adc, DetectorTuning::DEFAULT, FramerTuning::DEFAULT)
    }

    pub fn with_tuning(timer: T, adc: S, detector: DetectorTuning, framer: FramerTuning) -> Self {
        Receiver {
            clock: TickClock::new(timer),
            source: SampleSource::new(adc),
            detector: LevelDetector::new(detector),
            framer: Framer::new(framer),
        }
    }

    // --- Public Blocking Methods ---

    /// Waits for the next level change and returns the ticks since the previous one.
    pub fn next_edge(&mut self) -> u16 {
        loop {
            let now = self.clock.wait_for_tick();
            let sample = self.source.sample();
            if let Some(duration) = self.detector.observe(now, sample) {
                trace!("edge to {:?} after {} ticks", self.detector.level(), duration);
                return duration;
            }
        }
    }

    /// Sum of two consecutive half-periods, independent of the duty cycle.
    pub fn full_period(&mut self) -> u16 {
        let first = self.next_edge();
        let second = self.next_edge();
        first.saturating_add(second)
    }

    /// Consumes one edge so that subsequent periods pair up edge to edge.
    pub fn sync(&mut self) {
        let skipped = self.next_edge();
        debug!("synced to edge after {} ticks", skipped);
    }

    /// Blocks until a CRC-valid packet has been framed.
    pub fn read_packet(&mut self) -> Packet {
        loop {
            let period = self.full_period();
            match self.framer.push(period) {
                Ok(packet) => {
                    debug!("framed packet {:02x?}", packet);
                    return packet;
                }
                Err(reason) => trace!("candidate dropped: {}", reason),
            }
        }
    }

    /// Blocks until a packet decodes into a structurally valid configuration.
    pub fn decode_config(&mut self) -> PdConfig {
        loop {
            let packet = self.read_packet();
            match PdConfig::from_packet(&packet) {
                Ok(config) => {
                    info!("received config: {}", config);
                    return config;
                }
                Err(reason) => debug!("packet {:02x?} rejected: {}", packet, reason),
            }
        }
    }

    // --- Accessors ---

    /// The tick clock, for delays between receptions.
    pub fn clock_mut(&mut self) -> &mut TickClock<T> {
        &mut self.clock
    }

    pub fn detector(&self) -> &LevelDetector {
        &self.detector
    }

    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    pub fn release(self) -> (T, S) {
        (self.clock.release(), self.source.release())
    }
}
