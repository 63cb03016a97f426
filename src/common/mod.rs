// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod address;
pub mod crc;
pub mod error;
pub mod hal_traits;
pub mod packet;
pub mod pd_config;
pub mod timing;
pub mod tuning;

// --- Re-export key types/traits/functions for easier access ---

// From address.rs
pub use address::BusAddr;

// From crc.rs
pub use crc::{calculate_crc16, encode_trailer, reverse_bits, verify_packet_trailer};

// From error.rs
pub use error::{BusError, ConfigError, FrameReject};

// From hal_traits.rs
pub use hal_traits::{AnalogSampler, BusStatus, MasterCommand, TickTimer, TwiPeripheral};

// From packet.rs
pub use packet::{Packet, PACKET_LEN, RING_CAPACITY};

// From pd_config.rs
pub use pd_config::{PdConfig, VOLTAGE_TABLE};

// From timing.rs (constants stay under common::timing::*)
pub use timing::Tick;

// From tuning.rs
pub use tuning::{DetectorTuning, FramerTuning};
