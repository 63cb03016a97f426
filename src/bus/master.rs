// src/bus/master.rs

use crate::common::{
    address::BusAddr,
    error::BusError,
    hal_traits::{BusStatus, MasterCommand, TwiPeripheral},
};
use log::{debug, warn};

const FAULTS: BusStatus = BusStatus::from_bits(
    BusStatus::ARBITRATION_LOST.bits() | BusStatus::BUS_ERROR.bits(),
);
const ADDRESS_DONE: BusStatus = BusStatus::from_bits(
    BusStatus::WRITE_INTERRUPT.bits() | BusStatus::READ_INTERRUPT.bits(),
);

/// Single-master, byte-level bus transaction engine.
///
/// Holds no state between transactions beyond the peripheral itself.
/// A transaction either completes or is abandoned at its first fault;
/// retry policy belongs to the caller.
#[derive(Debug)]
pub struct BusMaster<P> {
    twi: P,
}

impl<P: TwiPeripheral> BusMaster<P> {
    pub fn new(twi: P) -> Self {
        BusMaster { twi }
    }

    // --- Public Blocking Methods ---

    /// Runs one transaction: write-only, read-only, or write-then-read
    /// with a repeated START. An empty transaction succeeds without touching the bus.
    pub fn transaction(
        &mut self,
        address: BusAddr,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), BusError> {
        if write.is_empty() && read.is_empty() {
            return Ok(());
        }
        if !write.is_empty() {
            self.begin_write(address)?;
            let mut written = 0;
            self.send_bytes(write, &mut written)?;
            self.finish_write(written)?;
        }
        if !read.is_empty() {
            self.begin_read(address)?;
            if let Err(error) = self.receive_bytes(read, true) {
                self.stop();
                return Err(error);
            }
        }
        self.stop();
        Ok(())
    }

    pub fn write(&mut self, address: BusAddr, bytes: &[u8]) -> Result<(), BusError> {
        self.transaction(address, bytes, &mut [])
    }

    pub fn read(&mut self, address: BusAddr, buffer: &mut [u8]) -> Result<(), BusError> {
        self.transaction(address, &[], buffer)
    }

    pub fn write_read(
        &mut self,
        address: BusAddr,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), BusError> {
        self.transaction(address, bytes, buffer)
    }

    /// Writes `value` into device register `register`.
    pub fn reg_write(&mut self, address: BusAddr, register: u8, value: u8) -> Result<(), BusError> {
        self.write(address, &[register, value])
    }

    /// Forces the peripheral's bus state to idle, e.g. after the target
    /// held SDA low through its own reset.
    pub fn force_idle(&mut self) {
        self.twi.force_idle();
    }

    pub fn release(self) -> P {
        self.twi
    }

    // --- Phase Helpers ---

    /// Busy-waits until any of `flags` is set. Arbitration loss and bus errors
    /// are cleared and reported as soon as they show up.
    fn wait_for(&mut self, flags: BusStatus) -> Result<BusStatus, BusError> {
        loop {
            let status = self.twi.status();
            if status.intersects(FAULTS) {
                self.twi.clear_faults();
                let error = if status.contains(BusStatus::ARBITRATION_LOST) {
                    BusError::ArbitrationLost
                } else {
                    BusError::BusFault
                };
                warn!("bus fault ({:#04x}): {}", status.bits(), error);
                return Err(error);
            }
            if status.intersects(flags) {
                return Ok(status);
            }
        }
    }

    fn address_phase(&mut self, address_byte: u8) -> Result<BusStatus, BusError> {
        self.twi.start(address_byte);
        self.wait_for(ADDRESS_DONE)
    }

    /// Address phase with the write bit. The target's ACK is checked by the
    /// first pass of [`Self::send_bytes`] or by [`Self::finish_write`].
    pub(super) fn begin_write(&mut self, address: BusAddr) -> Result<(), BusError> {
        self.address_phase(address.write_byte()).map(|_| ())
    }

    /// Address phase with the read bit.
    pub(super) fn begin_read(&mut self, address: BusAddr) -> Result<(), BusError> {
        let status = self.address_phase(address.read_byte())?;
        if status.contains(BusStatus::RX_NACK) && !status.contains(BusStatus::READ_INTERRUPT) {
            self.twi.command(MasterCommand::Stop);
            debug!("read address {} not acknowledged", address);
            return Err(BusError::AddressNack);
        }
        Ok(())
    }

    /// Waits for the previous byte (or address) to shift out and checks its ACK.
    /// A NACK sends STOP and abandons the transaction.
    fn check_ack(&mut self, written: usize) -> Result<(), BusError> {
        let status = self.wait_for(BusStatus::WRITE_INTERRUPT)?;
        if status.contains(BusStatus::RX_NACK) {
            self.twi.command(MasterCommand::Stop);
            let error = match written {
                0 => BusError::AddressNack,
                n => BusError::DataNack { sent: n - 1 },
            };
            debug!("write stopped: {}", error);
            return Err(error);
        }
        Ok(())
    }

    /// Shifts out `bytes`, each after the previous one was acknowledged.
    /// `written` counts the bytes written since the address phase.
    pub(super) fn send_bytes(&mut self, bytes: &[u8], written: &mut usize) -> Result<(), BusError> {
        for &byte in bytes {
            self.check_ack(*written)?;
            self.twi.write_data(byte);
            *written += 1;
        }
        Ok(())
    }

    /// Checks the acknowledgment of the last byte written.
    pub(super) fn finish_write(&mut self, written: usize) -> Result<(), BusError> {
        self.check_ack(written)
    }

    /// Clocks bytes into `buffer`. Every byte is acknowledged while more are
    /// expected; the final byte of the run (`ends_run`) is not.
    pub(super) fn receive_bytes(&mut self, buffer: &mut [u8], ends_run: bool) -> Result<(), BusError> {
        let len = buffer.len();
        for (i, slot) in buffer.iter_mut().enumerate() {
            self.wait_for(BusStatus::READ_INTERRUPT)?;
            *slot = self.twi.read_data();
            let remaining = len - i - 1;
            self.twi.command(MasterCommand::ReceiveNext { ack: remaining > 0 || !ends_run });
        }
        Ok(())
    }

    pub(super) fn stop(&mut self) {
        self.twi.command(MasterCommand::Stop);
    }
}
