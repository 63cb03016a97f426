// src/lib.rs

#![cfg_attr(not(test), no_std)] // Host test builds link std for the mocks

pub mod bus;
pub mod common;
pub mod programmer;
pub mod receiver;
pub mod stusb4500;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use bus::BusMaster;
pub use common::{BusAddr, BusError, PdConfig};
pub use programmer::{ProgramError, Programmer};
pub use receiver::Receiver;
pub use stusb4500::{Nvm, Stusb4500};
