// src/stusb4500/driver.rs

use super::nvm::{Nvm, BANK_LEN, NVM_BANKS, NVM_LEN};
use super::{FTP_CTRL_0, FTP_CTRL_1, FTP_CUST_PASSWORD, FTP_PASSWORD, FTP_RW_BUFFER, RESET_CTRL};
use crate::bus::BusMaster;
use crate::common::{
    address::BusAddr,
    error::BusError,
    hal_traits::TwiPeripheral,
    timing::{NVM_BANK_COMMIT, NVM_BANK_READ, NVM_ERASE_SETTLE, NVM_OPCODE_SETTLE, NVM_READ_UNLOCK},
};
use arrayvec::ArrayVec;
use core::time::Duration;
use embedded_hal::delay::DelayNs;
use log::{debug, info, trace};

// FTP_CTRL_0 values
const CTRL0_POWER_UP: u8 = 0x40;
const CTRL0_RESET: u8 = 0x00;
const CTRL0_REQUEST: u8 = 0x50;

// FTP_CTRL_1 opcodes and sector mask
const OP_READ: u8 = 0x00;
const OP_WRITE_PL: u8 = 0x01;
const OP_WRITE_SER: u8 = 0x02;
const OP_ERASE_SECTORS: u8 = 0x05;
const OP_PROG_SECTOR: u8 = 0x06;
const OP_SOFT_PROG_SECTORS: u8 = 0x07;
const ALL_SECTORS_MASK: u8 = 0xF8;

/// One step of a register script.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Step {
    Write(u8, u8),
    Settle(Duration),
}

use Step::{Settle, Write};

const ENTER_AND_ERASE: &[Step] = &[
    Write(FTP_CUST_PASSWORD, FTP_PASSWORD),
    Write(FTP_RW_BUFFER, 0x00),
    Write(FTP_CTRL_0, CTRL0_POWER_UP),
    Write(FTP_CTRL_0, CTRL0_RESET),
    Settle(NVM_OPCODE_SETTLE),
    Write(FTP_CTRL_0, CTRL0_POWER_UP),
    Write(FTP_CTRL_1, ALL_SECTORS_MASK | OP_WRITE_SER),
    Write(FTP_CTRL_0, CTRL0_REQUEST),
    Settle(NVM_OPCODE_SETTLE),
    Write(FTP_CTRL_1, OP_SOFT_PROG_SECTORS),
    Write(FTP_CTRL_0, CTRL0_REQUEST),
    Settle(NVM_ERASE_SETTLE),
    Write(FTP_CTRL_1, OP_ERASE_SECTORS),
    Write(FTP_CTRL_0, CTRL0_REQUEST),
    Settle(NVM_ERASE_SETTLE),
];

const ENTER_READ: &[Step] = &[
    Write(FTP_CUST_PASSWORD, FTP_PASSWORD),
    Write(FTP_CTRL_0, CTRL0_POWER_UP),
    Write(FTP_CTRL_0, CTRL0_RESET),
    Settle(NVM_READ_UNLOCK),
    Write(FTP_CTRL_0, CTRL0_POWER_UP),
    Write(FTP_CTRL_1, OP_READ),
];

/// STUSB4500 USB-PD sink controller on a [`BusMaster`].
#[derive(Debug)]
pub struct Stusb4500<P> {
    bus: BusMaster<P>,
    address: BusAddr,
}

impl<P: TwiPeripheral> Stusb4500<P> {
    /// Driver for the part at its default address.
    pub fn new(bus: BusMaster<P>) -> Self {
        Self::with_address(bus, BusAddr::STUSB4500)
    }

    pub fn with_address(bus: BusMaster<P>, address: BusAddr) -> Self {
        Stusb4500 { bus, address }
    }

    pub fn address(&self) -> BusAddr {
        self.address
    }

    pub fn bus_mut(&mut self) -> &mut BusMaster<P> {
        &mut self.bus
    }

    pub fn release(self) -> BusMaster<P> {
        self.bus
    }

    /// Erases the NVM and programs all five banks from `nvm`.
    ///
    /// The bus is forced idle first: the part pulls SDA low while it resets,
    /// which leaves the master's bus state machine out of step.
    /// Aborts at the first failed transaction; the NVM content is undefined then.
    pub fn flash(&mut self, nvm: &Nvm, delay: &mut impl DelayNs) -> Result<(), BusError> {
        self.bus.force_idle();
        self.run(ENTER_AND_ERASE, delay)?;

        for (index, bank) in nvm.banks().enumerate() {
            trace!("programming NVM bank {}", index);
            let mut frame: ArrayVec<u8, { BANK_LEN + 1 }> = ArrayVec::new();
            frame.push(FTP_RW_BUFFER);
            frame.extend(bank.iter().copied());
            self.bus.write(self.address, &frame)?;
            settle(delay, NVM_OPCODE_SETTLE);
            self.run(
                &[
                    Write(FTP_CTRL_1, OP_WRITE_PL),
                    Write(FTP_CTRL_0, CTRL0_REQUEST),
                    Settle(NVM_OPCODE_SETTLE),
                    Write(FTP_CTRL_1, OP_PROG_SECTOR),
                    Write(FTP_CTRL_0, CTRL0_REQUEST | index as u8),
                    Settle(NVM_BANK_COMMIT),
                ],
                delay,
            )?;
        }

        self.exit_nvm_mode()?;
        info!("NVM flashed at {}", self.address);
        Ok(())
    }

    /// Reads the whole NVM back.
    pub fn read_nvm(&mut self, delay: &mut impl DelayNs) -> Result<Nvm, BusError> {
        self.run(ENTER_READ, delay)?;

        let mut bytes = [0u8; NVM_LEN];
        for (index, bank) in bytes.chunks_exact_mut(BANK_LEN).enumerate() {
            self.bus.reg_write(self.address, FTP_CTRL_0, CTRL0_REQUEST | index as u8)?;
            settle(delay, NVM_BANK_READ);
            self.bus.write_read(self.address, &[FTP_RW_BUFFER], bank)?;
        }

        self.exit_nvm_mode()?;
        debug!("NVM read back from {}", self.address);
        Ok(Nvm::from_bytes(bytes))
    }

    /// Requests a soft reset, which reloads the NVM.
    ///
    /// On boards powered through the part this also power-cycles the MCU,
    /// so a successful return is not guaranteed to be observed.
    pub fn soft_reset(&mut self) -> Result<(), BusError> {
        debug!("soft reset");
        self.bus.reg_write(self.address, RESET_CTRL, 0x01)
    }

    fn exit_nvm_mode(&mut self) -> Result<(), BusError> {
        self.bus.write(self.address, &[FTP_CTRL_0, CTRL0_POWER_UP, CTRL0_RESET])?;
        self.bus.reg_write(self.address, FTP_CUST_PASSWORD, 0x00)
    }

    fn run(&mut self, steps: &[Step], delay: &mut impl DelayNs) -> Result<(), BusError> {
        for step in steps {
            match *step {
                Write(register, value) => self.bus.reg_write(self.address, register, value)?,
                Settle(duration) => settle(delay, duration),
            }
        }
        Ok(())
    }
}

// The bank index is ORed into the sector nibble of FTP_CTRL_0.
const _: () = assert!(NVM_BANKS <= 0x0F);

fn settle(delay: &mut impl DelayNs, duration: Duration) {
    delay.delay_us(u32::try_from(duration.as_micros()).unwrap_or(u32::MAX));
}
