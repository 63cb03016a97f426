// src/receiver/sources.rs

use crate::common::{
    hal_traits::{block_on, AnalogSampler, TickTimer},
    timing::{ticks_for, Tick, TICKS_PER_MS},
};
use core::time::Duration;

/// Free-running tick counter advanced by timer overflows.
#[derive(Debug)]
pub struct TickClock<T> {
    timer: T,
    now: Tick,
}

impl<T: TickTimer> TickClock<T> {
    pub fn new(timer: T) -> Self {
        TickClock { timer, now: Tick::ZERO }
    }

    /// Busy-waits for the next overflow and advances the counter.
    pub fn wait_for_tick(&mut self) -> Tick {
        block_on(|| self.timer.poll_overflow());
        self.now = self.now.next();
        self.now
    }

    /// The tick counted by the most recent `wait_for_tick`.
    #[inline]
    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn delay_ticks(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.wait_for_tick();
        }
    }

    pub fn delay(&mut self, duration: Duration) {
        self.delay_ticks(ticks_for(duration));
    }

    pub fn delay_ms(&mut self, ms: u32) {
        self.delay_ticks(ms.saturating_mul(TICKS_PER_MS));
    }

    pub fn release(self) -> T {
        self.timer
    }
}

impl<T: TickTimer> embedded_hal::delay::DelayNs for TickClock<T> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        TickClock::delay_ms(self, ms);
    }
}

/// The ADC channel reading the light sensor.
#[derive(Debug)]
pub struct SampleSource<S> {
    adc: S,
}

impl<S: AnalogSampler> SampleSource<S> {
    pub fn new(adc: S) -> Self {
        SampleSource { adc }
    }

    /// Runs one conversion and busy-waits for its result.
    pub fn sample(&mut self) -> u16 {
        self.adc.start_conversion();
        block_on(|| self.adc.poll_result())
    }

    pub fn release(self) -> S {
        self.adc
    }
}
