// src/common/address.rs

use super::error::BusError;
use core::convert::TryFrom;
use core::fmt;

/// A 7-bit bus target address.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct BusAddr(u8);

impl BusAddr {
    /// STUSB4500 with ADDR0/ADDR1 strapped low.
    pub const STUSB4500: BusAddr = BusAddr(0x28);

    /// Creates a new `BusAddr` if `address` fits in 7 bits.
    pub const fn new(address: u8) -> Result<Self, BusError> {
        if address <= 0x7F {
            Ok(BusAddr(address))
        } else {
            Err(BusError::InvalidAddress(address))
        }
    }

    #[inline]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Address byte for a master-write phase (R/W bit clear).
    #[inline]
    pub const fn write_byte(&self) -> u8 {
        self.0 << 1
    }

    /// Address byte for a master-read phase (R/W bit set).
    #[inline]
    pub const fn read_byte(&self) -> u8 {
        (self.0 << 1) | 1
    }
}

impl TryFrom<u8> for BusAddr {
    type Error = BusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BusAddr> for u8 {
    fn from(value: BusAddr) -> Self {
        value.0
    }
}

impl fmt::Display for BusAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}
