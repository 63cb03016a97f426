// src/common/pd_config.rs

use super::error::ConfigError;
use super::packet::{frame_payload, Packet, PAYLOAD_LEN};
use core::fmt;

/// Selectable voltages in 50 mV units (volts x 20), matching the STUSB4500 PDO voltage field.
pub const VOLTAGE_TABLE: [u16; 5] = [5 * 20, 9 * 20, 12 * 20, 15 * 20, 20 * 20];

/// STUSB4500 PDO current codes in milliamps; code 0 ("flex") is not selectable over the link.
const CURRENT_TABLE_MA: [u16; 16] = [
    0, 500, 750, 1000, 1250, 1500, 1750, 2000, 2250, 2500, 2750, 3000, 3500, 4000, 4500, 5000,
];

const RESERVED_BIT: u8 = 0b1000_0000;
const REQ_PD_BIT: u8 = 0b1000_0000;

/// Sink configuration recovered from a validated packet.
///
/// Voltages are in 50 mV units and always come from [`VOLTAGE_TABLE`];
/// current codes are always in `1..=15`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PdConfig {
    /// First-preference voltage.
    pub v1: u16,
    /// First-preference current code.
    pub i1: u8,
    /// Second-preference voltage.
    pub v2: u16,
    /// Second-preference current code.
    pub i2: u8,
    /// Only enable the output once a PD source has been negotiated.
    pub req_pd: bool,
}

impl PdConfig {
    /// Interprets the payload of a checksum-valid packet.
    ///
    /// Layout: byte0 = `0 V1(3) I1(4)`, byte1 = `PD V2(3) I2(4)`.
    pub fn from_packet(packet: &Packet) -> Result<Self, ConfigError> {
        let (b0, b1) = (packet[0], packet[1]);
        if b0 & RESERVED_BIT != 0 {
            return Err(ConfigError::ReservedBitSet);
        }
        let v1 = voltage_from_index((b0 >> 4) & 0b111)?;
        let v2 = voltage_from_index((b1 >> 4) & 0b111)?;
        let i1 = current_code(b0 & 0x0F)?;
        let i2 = current_code(b1 & 0x0F)?;

        Ok(PdConfig { v1, i1, v2, i2, req_pd: b1 & REQ_PD_BIT != 0 })
    }

    /// Encodes the two payload bytes. Fails for values the link cannot carry.
    pub fn to_payload(&self) -> Result<[u8; PAYLOAD_LEN], ConfigError> {
        let v1 = index_from_voltage(self.v1)?;
        let v2 = index_from_voltage(self.v2)?;
        let i1 = current_code(self.i1)?;
        let i2 = current_code(self.i2)?;
        let pd = if self.req_pd { REQ_PD_BIT } else { 0 };

        Ok([(v1 << 4) | i1, pd | (v2 << 4) | i2])
    }

    /// Encodes a full wire packet, trailer included.
    pub fn to_packet(&self) -> Result<Packet, ConfigError> {
        self.to_payload().map(frame_payload)
    }

    pub fn v1_millivolts(&self) -> u32 {
        u32::from(self.v1) * 50
    }

    pub fn v2_millivolts(&self) -> u32 {
        u32::from(self.v2) * 50
    }

    pub fn i1_milliamps(&self) -> u16 {
        CURRENT_TABLE_MA[usize::from(self.i1 & 0x0F)]
    }

    pub fn i2_milliamps(&self) -> u16 {
        CURRENT_TABLE_MA[usize::from(self.i2 & 0x0F)]
    }
}

impl fmt::Display for PdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}mV/{}mA, {}mV/{}mA, req_pd={}",
            self.v1_millivolts(),
            self.i1_milliamps(),
            self.v2_millivolts(),
            self.i2_milliamps(),
            self.req_pd
        )
    }
}

fn voltage_from_index(index: u8) -> Result<u16, ConfigError> {
    VOLTAGE_TABLE
        .get(usize::from(index))
        .copied()
        .ok_or(ConfigError::VoltageIndexOutOfRange(index))
}

fn index_from_voltage(voltage: u16) -> Result<u8, ConfigError> {
    VOLTAGE_TABLE
        .iter()
        .position(|&v| v == voltage)
        .map(|i| i as u8)
        .ok_or(ConfigError::UnsupportedVoltage(voltage))
}

fn current_code(code: u8) -> Result<u8, ConfigError> {
    match code {
        0 => Err(ConfigError::ZeroCurrentCode),
        1..=15 => Ok(code),
        _ => Err(ConfigError::CurrentCodeOutOfRange(code)),
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::packet::frame_payload;

    #[test]
    fn test_reference_payload() {
        let config = PdConfig::from_packet(&frame_payload([0x12, 0x83])).unwrap();
        assert_eq!(config, PdConfig { v1: 180, i1: 2, v2: 100, i2: 3, req_pd: true });
        assert_eq!(config.v1_millivolts(), 9_000);
        assert_eq!(config.i1_milliamps(), 750);
        assert_eq!(config.v2_millivolts(), 5_000);
        assert_eq!(config.i2_milliamps(), 1_000);
    }

    #[test]
    fn test_reserved_bit_rejected() {
        assert_eq!(PdConfig::from_packet(&[0x92, 0x83, 0, 0]), Err(ConfigError::ReservedBitSet));
    }

    #[test]
    fn test_voltage_index_out_of_range_rejected() {
        for index in 5..=7u8 {
            let b0 = (index << 4) | 0x02;
            assert_eq!(
                PdConfig::from_packet(&[b0, 0x83, 0, 0]),
                Err(ConfigError::VoltageIndexOutOfRange(index))
            );
            let b1 = 0x80 | (index << 4) | 0x03;
            assert_eq!(
                PdConfig::from_packet(&[0x12, b1, 0, 0]),
                Err(ConfigError::VoltageIndexOutOfRange(index))
            );
        }
    }

    #[test]
    fn test_zero_current_rejected() {
        assert_eq!(PdConfig::from_packet(&[0x10, 0x83, 0, 0]), Err(ConfigError::ZeroCurrentCode));
        assert_eq!(PdConfig::from_packet(&[0x12, 0x80, 0, 0]), Err(ConfigError::ZeroCurrentCode));
    }

    #[test]
    fn test_every_valid_field_combination_decodes() {
        for v in 0..5u8 {
            for i in 1..16u8 {
                let b0 = (v << 4) | i;
                let b1 = ((4 - v) << 4) | (16 - i);
                let config = PdConfig::from_packet(&[b0, b1, 0, 0]).unwrap();
                assert_eq!(config.v1, VOLTAGE_TABLE[usize::from(v)]);
                assert_eq!(config.v2, VOLTAGE_TABLE[usize::from(4 - v)]);
                assert_eq!(config.i1, i);
                assert_eq!(config.i2, 16 - i);
                assert!(!config.req_pd);
                assert_eq!(config.to_payload().unwrap(), [b0, b1]);
            }
        }
    }

    #[test]
    fn test_to_packet() {
        let config = PdConfig { v1: 180, i1: 2, v2: 100, i2: 3, req_pd: true };
        assert_eq!(config.to_packet().unwrap(), [0x12, 0x83, 0x23, 0x5F]);
    }

    #[test]
    fn test_unencodable_values() {
        let base = PdConfig { v1: 180, i1: 2, v2: 100, i2: 3, req_pd: false };
        assert_eq!(PdConfig { v1: 181, ..base }.to_payload(), Err(ConfigError::UnsupportedVoltage(181)));
        assert_eq!(PdConfig { i2: 0, ..base }.to_payload(), Err(ConfigError::ZeroCurrentCode));
        assert_eq!(PdConfig { i1: 16, ..base }.to_payload(), Err(ConfigError::CurrentCodeOutOfRange(16)));
    }

    #[test]
    fn test_display() {
        let config = PdConfig { v1: 400, i1: 15, v2: 240, i2: 7, req_pd: false };
        assert_eq!(format!("{}", config), "20000mV/5000mA, 12000mV/2000mA, req_pd=false");
    }
}
