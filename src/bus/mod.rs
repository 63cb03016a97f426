// src/bus/mod.rs

// Transaction engine over a TWI register model
pub mod master;

// embedded-hal I2c surface for the engine
mod hal_i2c;

pub use master::BusMaster;
