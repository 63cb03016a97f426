// src/common/error.rs

/// Why a candidate packet was discarded by the bit-timing framer.
///
/// None of these ever reach the caller of `decode_config`: the channel
/// retransmits indefinitely, so the framer just keeps sliding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameReject {
    /// The recent period window does not span enough range to split 0 from 1.
    #[error("modulation too shallow: low {low}, high {high}")]
    ShallowModulation { low: u16, high: u16 },

    /// A period fell strictly between the low and high thresholds.
    #[error("ambiguous period {period} at bit {index}")]
    AmbiguousBit { index: usize, period: u16 },

    /// Trailer does not match the CRC of the payload.
    #[error("CRC mismatch: expected {expected:#06x}, calculated {calculated:#06x}")]
    ChecksumMismatch { expected: u16, calculated: u16 },

    /// Buffer cannot hold a CRC trailer.
    #[error("packet too short for a CRC trailer")]
    TooShort,
}

/// Field-level rejection of a checksum-valid packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Bit 7 of the first byte is reserved and must be zero.
    #[error("reserved bit set")]
    ReservedBitSet,

    /// A voltage index outside the lookup table.
    #[error("voltage index {0} out of range")]
    VoltageIndexOutOfRange(u8),

    /// Current code 0 is reserved.
    #[error("current code 0 is reserved")]
    ZeroCurrentCode,

    /// Current code does not fit in a nibble.
    #[error("current code {0} out of range")]
    CurrentCodeOutOfRange(u8),

    /// Voltage (50 mV units) not present in the lookup table.
    #[error("unsupported voltage {0} x 50mV")]
    UnsupportedVoltage(u16),
}

/// Failure of a single bus master transaction.
///
/// The engine never retries; the first fault abandons the transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// Another master won arbitration during the address phase.
    #[error("arbitration lost")]
    ArbitrationLost,

    /// The peripheral flagged an illegal bus condition.
    #[error("bus error")]
    BusFault,

    /// No device acknowledged the address.
    #[error("address not acknowledged")]
    AddressNack,

    /// The target refused a data byte; `sent` bytes had been accepted before it.
    #[error("data byte not acknowledged after {sent} accepted")]
    DataNack { sent: usize },

    /// Address does not fit in 7 bits.
    #[error("invalid 7-bit address: {0:#04x}")]
    InvalidAddress(u8),
}
