// src/stusb4500/mod.rs

// NVM image layout and config application
pub mod nvm;
// Flash, read-back and reset sequences
pub mod driver;

pub use driver::Stusb4500;
pub use nvm::{GpioFunction, Nvm, NvmSettings, BANK_LEN, NVM_BANKS, NVM_LEN};

// === Registers ===

/// Soft reset control.
pub const RESET_CTRL: u8 = 0x23;
/// NVM read/write buffer.
pub const FTP_RW_BUFFER: u8 = 0x53;
/// NVM access password.
pub const FTP_CUST_PASSWORD: u8 = 0x95;
/// NVM control 0: power, reset and sector select.
pub const FTP_CTRL_0: u8 = 0x96;
/// NVM control 1: sector mask and opcode.
pub const FTP_CTRL_1: u8 = 0x97;

/// Value unlocking NVM access through `FTP_CUST_PASSWORD`.
pub const FTP_PASSWORD: u8 = 0x47;
