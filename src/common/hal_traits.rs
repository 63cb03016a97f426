// src/common/hal_traits.rs

use core::convert::Infallible;
use core::ops::BitOr;

/// Abstraction for the periodic timer driving the tick clock.
///
/// The timer is configured and started by board bring-up; this trait only
/// observes its overflow flag.
pub trait TickTimer {
    /// Returns `Ok(())` once the timer has overflowed, clearing the pending
    /// overflow flag, or `Err(nb::Error::WouldBlock)` while the period is still running.
    fn poll_overflow(&mut self) -> nb::Result<(), Infallible>;
}

/// Abstraction for the ADC channel wired to the light sensor.
pub trait AnalogSampler {
    /// Triggers a single conversion.
    fn start_conversion(&mut self);

    /// Returns the 10-bit result (0..=1023) once the conversion completed,
    /// clearing the result-ready flag, or `Err(nb::Error::WouldBlock)` while it is in progress.
    fn poll_result(&mut self) -> nb::Result<u16, Infallible>;
}

/// Status flags of a TWI master, laid out like the MSTATUS register.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BusStatus(u8);

impl BusStatus {
    /// Read interrupt: a byte was received (or the read address phase finished).
    pub const READ_INTERRUPT: BusStatus = BusStatus(1 << 7);
    /// Write interrupt: a byte or write address was shifted out.
    pub const WRITE_INTERRUPT: BusStatus = BusStatus(1 << 6);
    /// The last byte sent was not acknowledged.
    pub const RX_NACK: BusStatus = BusStatus(1 << 4);
    /// Arbitration was lost to another master.
    pub const ARBITRATION_LOST: BusStatus = BusStatus(1 << 3);
    /// Illegal bus condition.
    pub const BUS_ERROR: BusStatus = BusStatus(1 << 2);

    pub const EMPTY: BusStatus = BusStatus(0);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        BusStatus(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: BusStatus) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is set.
    #[inline]
    pub const fn intersects(self, other: BusStatus) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for BusStatus {
    type Output = BusStatus;

    fn bitor(self, rhs: BusStatus) -> BusStatus {
        BusStatus(self.0 | rhs.0)
    }
}

/// Commands issued through the master control register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MasterCommand {
    /// Acknowledge (or not) the byte just received, then clock in the next one.
    ReceiveNext { ack: bool },
    /// Issue a STOP condition.
    Stop,
}

/// Register-level abstraction of a TWI (I2C-class) master peripheral.
///
/// The peripheral is enabled and clocked by board bring-up. Calls here never fail;
/// faults show up in [`TwiPeripheral::status`].
pub trait TwiPeripheral {
    /// Current status flags.
    fn status(&mut self) -> BusStatus;

    /// Writes the address register, issuing a (repeated) START with the given
    /// address byte (7-bit address shifted left, R/W in bit 0).
    fn start(&mut self, address_byte: u8);

    /// Writes the data register, shifting `byte` out.
    fn write_data(&mut self, byte: u8);

    /// Reads the last received byte from the data register.
    fn read_data(&mut self) -> u8;

    /// Issues a master command.
    fn command(&mut self, command: MasterCommand);

    /// Clears the arbitration-lost and bus-error flags.
    fn clear_faults(&mut self);

    /// Forces the bus state machine into the idle state.
    fn force_idle(&mut self);
}

/// Busy-waits on an infallible non-blocking operation.
#[inline]
pub(crate) fn block_on<T>(mut f: impl FnMut() -> nb::Result<T, Infallible>) -> T {
    match nb::block!(f()) {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
