// src/stusb4500/nvm.rs

use crate::common::pd_config::PdConfig;
use core::fmt;

/// Number of NVM banks.
pub const NVM_BANKS: usize = 5;
/// Bytes per NVM bank.
pub const BANK_LEN: usize = 8;
/// Total NVM size.
pub const NVM_LEN: usize = NVM_BANKS * BANK_LEN;

// Byte offsets of the fields this crate touches.
const GPIO_CFG: usize = 0x08;
const VBUS_DISCHARGE: usize = 0x09;
const DISCHARGE_TIMES: usize = 0x0A;
const PDO1_CURRENT: usize = 0x1A;
const PDO2_CURRENT: usize = 0x1C;
const PDO3_CURRENT: usize = 0x1D;
const PDO2_VOLTAGE_LO: usize = 0x20;
const PDO2_VOLTAGE_HI: usize = 0x21;
const PDO3_VOLTAGE_LO: usize = 0x22;
const PDO3_VOLTAGE_HI: usize = 0x23;
const POWER_ONLY_ABOVE_5V: usize = 0x26;

const REQUIRE_PD_BIT: u8 = 1 << 3;

/// In-memory copy of the 40-byte STUSB4500 NVM.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Nvm([u8; NVM_LEN]);

impl Nvm {
    /// Image the part ships with.
    pub const FACTORY: Nvm = Nvm([
        0x00, 0x00, 0xB0, 0xAA, 0x00, 0x45, 0x00, 0x00, //
        0x10, 0x40, 0x9C, 0x1C, 0xFF, 0x01, 0x3C, 0xDF, //
        0x02, 0x40, 0x0F, 0x00, 0x32, 0x00, 0xFC, 0xF1, //
        0x00, 0x19, 0x56, 0xAF, 0xF5, 0x35, 0x5F, 0x00, //
        0x00, 0x4B, 0x90, 0x21, 0x43, 0x00, 0x40, 0xFB, //
    ]);

    /// Base image the programmer writes: the factory image with the
    /// PDO2/PDO3 undervoltage lockout lowered from 20% to 15%.
    pub const DEFAULT: Nvm = Nvm([
        0x00, 0x00, 0xB0, 0xAA, 0x00, 0x45, 0x00, 0x00, //
        0x10, 0x40, 0x9C, 0x1C, 0xFF, 0x01, 0x3C, 0xDF, //
        0x02, 0x40, 0x0F, 0x00, 0x32, 0x00, 0xFC, 0xF1, //
        0x00, 0x19, 0x56, 0xAF, 0xA5, 0x35, 0x5A, 0x00, //
        0x00, 0x4B, 0x90, 0x21, 0x43, 0x00, 0x40, 0xFB, //
    ]);

    pub const fn from_bytes(bytes: [u8; NVM_LEN]) -> Self {
        Nvm(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NVM_LEN] {
        &self.0
    }

    /// Bank `index` (0..5).
    ///
    /// # Panics
    /// If `index >= NVM_BANKS`.
    pub fn bank(&self, index: usize) -> &[u8] {
        &self.0[index * BANK_LEN..(index + 1) * BANK_LEN]
    }

    /// Mutable view of bank `index` (0..5).
    ///
    /// # Panics
    /// If `index >= NVM_BANKS`.
    pub fn bank_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.0[index * BANK_LEN..(index + 1) * BANK_LEN]
    }

    /// Iterates the banks in flash order.
    pub fn banks(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.0.chunks_exact(BANK_LEN)
    }

    /// Writes the PDO2/PDO3 profile and the PD requirement of `config` into the image.
    ///
    /// `v1`/`i1` go to PDO3, `v2`/`i2` to PDO2. PDO1 (fixed 5V) is left alone.
    pub fn apply(&mut self, config: &PdConfig) {
        let nvm = &mut self.0;
        nvm[PDO3_CURRENT] = (nvm[PDO3_CURRENT] & 0x0F) | (config.i1 << 4);
        nvm[PDO2_CURRENT] = (nvm[PDO2_CURRENT] & 0xF0) | (config.i2 & 0x0F);
        nvm[PDO3_VOLTAGE_LO] = config.v1 as u8;
        nvm[PDO3_VOLTAGE_HI] = (nvm[PDO3_VOLTAGE_HI] & 0b1111_1100) | ((config.v1 >> 8) as u8 & 0b11);
        nvm[PDO2_VOLTAGE_LO] = (nvm[PDO2_VOLTAGE_LO] & 0b0011_1111) | ((config.v2 as u8 & 0b11) << 6);
        nvm[PDO2_VOLTAGE_HI] = (config.v2 >> 2) as u8;
        if config.req_pd {
            nvm[POWER_ONLY_ABOVE_5V] |= REQUIRE_PD_BIT;
        } else {
            nvm[POWER_ONLY_ABOVE_5V] &= !REQUIRE_PD_BIT;
        }
    }

    /// Copy of `self` with `config` applied.
    #[must_use]
    pub fn with_config(mut self, config: &PdConfig) -> Self {
        self.apply(config);
        self
    }

    /// Decodes the user-facing settings held in the image.
    pub fn settings(&self) -> NvmSettings {
        NvmSettings::from_nvm(self)
    }
}

impl Default for Nvm {
    fn default() -> Self {
        Nvm::DEFAULT
    }
}

/// Function assigned to the GPIO pin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GpioFunction {
    SoftwareControl,
    ErrorRecovery,
    Debug,
    SinkPower,
}

impl GpioFunction {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => GpioFunction::SoftwareControl,
            1 => GpioFunction::ErrorRecovery,
            2 => GpioFunction::Debug,
            _ => GpioFunction::SinkPower,
        }
    }
}

/// Settings decoded from an NVM image. Voltages are in 50 mV units and
/// currents are the 4-bit NVM codes, as on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NvmSettings {
    pub gpio_function: GpioFunction,
    pub vbus_discharge_enabled: bool,
    /// VBUS discharge time to 0V, in ms (84 ms steps).
    pub discharge_to_0v_ms: u16,
    /// VBUS discharge time to a lower PDO, in ms (24 ms steps).
    pub discharge_to_pdo_ms: u16,
    pub pdo1_current: u8,
    pub pdo2_current: u8,
    pub pdo3_current: u8,
    pub pdo2_voltage: u16,
    pub pdo3_voltage: u16,
    /// Whether VBUS is switched on even when no PD contract was negotiated.
    pub enable_without_pd: bool,
}

impl NvmSettings {
    pub fn from_nvm(nvm: &Nvm) -> Self {
        let b = &nvm.0;
        NvmSettings {
            gpio_function: GpioFunction::from_bits(b[GPIO_CFG] >> 4),
            vbus_discharge_enabled: (b[VBUS_DISCHARGE] >> 5) & 1 == 0,
            discharge_to_0v_ms: u16::from(b[DISCHARGE_TIMES] >> 4) * 84,
            discharge_to_pdo_ms: u16::from(b[DISCHARGE_TIMES] & 0x0F) * 24,
            pdo1_current: b[PDO1_CURRENT] >> 4,
            pdo2_current: b[PDO2_CURRENT] & 0x0F,
            pdo3_current: b[PDO3_CURRENT] >> 4,
            pdo2_voltage: u16::from(b[PDO2_VOLTAGE_LO] >> 6) | (u16::from(b[PDO2_VOLTAGE_HI]) << 2),
            pdo3_voltage: u16::from(b[PDO3_VOLTAGE_LO])
                | (u16::from(b[PDO3_VOLTAGE_HI] & 0b11) << 8),
            enable_without_pd: b[POWER_ONLY_ABOVE_5V] & REQUIRE_PD_BIT == 0,
        }
    }
}

impl fmt::Display for NvmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PDO2 {}mV code {}, PDO3 {}mV code {}, enable_without_pd={}",
            u32::from(self.pdo2_voltage) * 50,
            self.pdo2_current,
            u32::from(self.pdo3_voltage) * 50,
            self.pdo3_current,
            self.enable_without_pd
        )
    }
}
