// src/testing.rs

//! Hand-rolled peripheral mocks shared by the unit tests.

use crate::common::{
    hal_traits::{AnalogSampler, BusStatus, MasterCommand, TickTimer, TwiPeripheral},
    packet::{bits_msb_first, Packet},
};
use core::convert::Infallible;

// --- Tick Timer ---

/// Overflows on every second poll so callers have to spin.
#[derive(Debug, Default)]
pub struct MockTimer {
    pending: bool,
    pub overflows: u32,
    pub polls: u32,
}

impl TickTimer for MockTimer {
    fn poll_overflow(&mut self) -> nb::Result<(), Infallible> {
        self.polls += 1;
        if self.pending {
            self.pending = false;
            self.overflows += 1;
            Ok(())
        } else {
            self.pending = true;
            Err(nb::Error::WouldBlock)
        }
    }
}

// --- Optical Signal ---

/// Shape of a simulated optical transmission.
#[derive(Debug, Copy, Clone)]
pub struct LinkSignal {
    /// Full period (in samples) encoding a 0 bit.
    pub zero_period: usize,
    /// Full period (in samples) encoding a 1 bit.
    pub one_period: usize,
    /// ADC reading while the light is on.
    pub bright: u16,
    /// ADC reading while the light is off.
    pub dark: u16,
    /// Whether each bit starts with the bright half.
    pub bright_first: bool,
}

impl LinkSignal {
    pub const fn new() -> Self {
        LinkSignal { zero_period: 40, one_period: 120, bright: 800, dark: 200, bright_first: false }
    }

    pub const fn bright_first(mut self) -> Self {
        self.bright_first = true;
        self
    }

    /// ADC samples for `packets` sent back to back.
    pub fn samples(&self, packets: &[Packet]) -> Vec<u16> {
        let (first, second) = if self.bright_first {
            (self.bright, self.dark)
        } else {
            (self.dark, self.bright)
        };
        let mut out = Vec::new();
        for packet in packets {
            for bit in bits_msb_first(packet) {
                let half = (if bit { self.one_period } else { self.zero_period }) / 2;
                out.extend(core::iter::repeat(first).take(half));
                out.extend(core::iter::repeat(second).take(half));
            }
        }
        out
    }
}

/// ADC replaying a one-shot prefix, then looping a repeating tail forever.
#[derive(Debug)]
pub struct MockAdc {
    prefix: Vec<u16>,
    cycle: Vec<u16>,
    position: usize,
    converting: bool,
    ready: bool,
    pub conversions: usize,
}

impl MockAdc {
    pub fn new(prefix: Vec<u16>, cycle: Vec<u16>) -> Self {
        assert!(!cycle.is_empty(), "cycle must not be empty");
        MockAdc { prefix, cycle, position: 0, converting: false, ready: false, conversions: 0 }
    }

    pub fn constant(value: u16) -> Self {
        Self::new(Vec::new(), vec![value])
    }

    /// Repeats `packets` forever.
    pub fn repeating(signal: LinkSignal, packets: &[Packet]) -> Self {
        Self::new(Vec::new(), signal.samples(packets))
    }

    fn next_sample(&mut self) -> u16 {
        let index = self.position;
        self.position += 1;
        if index < self.prefix.len() {
            self.prefix[index]
        } else {
            self.cycle[(index - self.prefix.len()) % self.cycle.len()]
        }
    }
}

impl AnalogSampler for MockAdc {
    fn start_conversion(&mut self) {
        assert!(!self.converting, "conversion started twice");
        self.converting = true;
        self.ready = false;
    }

    fn poll_result(&mut self) -> nb::Result<u16, Infallible> {
        assert!(self.converting, "polled without a conversion");
        if !self.ready {
            self.ready = true;
            return Err(nb::Error::WouldBlock);
        }
        self.converting = false;
        self.conversions += 1;
        Ok(self.next_sample())
    }
}

// --- TWI Peripheral ---

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TwiOp {
    Start(u8),
    Write(u8),
    Read(u8),
    Command(MasterCommand),
    ClearFaults,
    ForceIdle,
}

/// Simulated target on a TWI master, with scripted faults.
#[derive(Debug, Default)]
pub struct MockTwi {
    pub ops: heapless::Vec<TwiOp, 1024>,
    status: BusStatus,
    pending_read: u8,
    data_in_transaction: usize,
    /// NACK the data byte with this index (0-based, counted per address phase).
    pub nack_data_at: Option<usize>,
    /// NACK every address phase.
    pub nack_address: bool,
    /// Fault flag raised by the next address phase.
    pub fault_on_start: Option<BusStatus>,
    /// Fault flag raised instead of the next received byte.
    pub fault_on_receive: Option<BusStatus>,
    /// Bytes served to master reads, in order; 0xFF once exhausted.
    pub read_queue: heapless::Deque<u8, 64>,
}

impl MockTwi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reads(bytes: &[u8]) -> Self {
        let mut twi = Self::new();
        for &b in bytes {
            twi.read_queue.push_back(b).unwrap();
        }
        twi
    }

    fn log(&mut self, op: TwiOp) {
        self.ops.push(op).expect("mock op log full");
    }

    fn load_read(&mut self) {
        self.pending_read = self.read_queue.pop_front().unwrap_or(0xFF);
    }

    pub fn data_writes(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, TwiOp::Write(_))).count()
    }

    /// Write transactions as (address byte, bytes written), in order.
    pub fn written_frames(&self) -> Vec<(u8, Vec<u8>)> {
        let mut frames: Vec<(u8, Vec<u8>)> = Vec::new();
        for op in self.ops.iter() {
            match *op {
                TwiOp::Start(addr) => frames.push((addr, Vec::new())),
                TwiOp::Write(b) => frames.last_mut().expect("write before start").1.push(b),
                _ => {}
            }
        }
        frames.retain(|(addr, _)| addr & 1 == 0);
        frames
    }
}

impl TwiPeripheral for MockTwi {
    fn status(&mut self) -> BusStatus {
        self.status
    }

    fn start(&mut self, address_byte: u8) {
        self.log(TwiOp::Start(address_byte));
        self.data_in_transaction = 0;
        if let Some(fault) = self.fault_on_start.take() {
            self.status = BusStatus::WRITE_INTERRUPT | fault;
        } else if self.nack_address {
            self.status = BusStatus::WRITE_INTERRUPT | BusStatus::RX_NACK;
        } else if address_byte & 1 == 1 {
            self.load_read();
            self.status = BusStatus::READ_INTERRUPT;
        } else {
            self.status = BusStatus::WRITE_INTERRUPT;
        }
    }

    fn write_data(&mut self, byte: u8) {
        self.log(TwiOp::Write(byte));
        let index = self.data_in_transaction;
        self.data_in_transaction += 1;
        self.status = if self.nack_data_at == Some(index) {
            BusStatus::WRITE_INTERRUPT | BusStatus::RX_NACK
        } else {
            BusStatus::WRITE_INTERRUPT
        };
    }

    fn read_data(&mut self) -> u8 {
        let byte = self.pending_read;
        self.log(TwiOp::Read(byte));
        byte
    }

    fn command(&mut self, command: MasterCommand) {
        self.log(TwiOp::Command(command));
        match command {
            MasterCommand::ReceiveNext { ack: true } => {
                if let Some(fault) = self.fault_on_receive.take() {
                    self.status = fault;
                } else {
                    self.load_read();
                    self.status = BusStatus::READ_INTERRUPT;
                }
            }
            MasterCommand::ReceiveNext { ack: false } | MasterCommand::Stop => {
                self.status = BusStatus::EMPTY;
            }
        }
    }

    fn clear_faults(&mut self) {
        self.log(TwiOp::ClearFaults);
        self.status = BusStatus::from_bits(
            self.status.bits() & !(BusStatus::ARBITRATION_LOST | BusStatus::BUS_ERROR).bits(),
        );
    }

    fn force_idle(&mut self) {
        self.log(TwiOp::ForceIdle);
    }
}

// --- Notification LED ---

#[derive(Debug, Default)]
pub struct MockLed {
    pub lit: bool,
    pub rising_edges: u32,
}

impl embedded_hal::digital::ErrorType for MockLed {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.lit = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.lit {
            self.rising_edges += 1;
        }
        self.lit = true;
        Ok(())
    }
}
