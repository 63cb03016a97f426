// src/receiver/mod.rs

// Building blocks of the optical link, leaf first
pub mod detector;
pub mod framer;
pub mod ring;
pub mod sources;

// The blocking pipeline tying them together
pub mod sync_receiver;

// Re-export the public pieces
pub use detector::{CalibrationWindow, Level, LevelDetector};
pub use framer::{BitThresholds, Framer};
pub use ring::{BitTimingRing, RingCursor};
pub use sources::{SampleSource, TickClock};
pub use sync_receiver::Receiver;
