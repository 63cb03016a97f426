// src/bus/hal_i2c.rs

use super::master::BusMaster;
use crate::common::{address::BusAddr, error::BusError, hal_traits::TwiPeripheral};
use embedded_hal::i2c::{
    self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress,
};

impl i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self {
            BusError::ArbitrationLost => ErrorKind::ArbitrationLoss,
            BusError::BusFault => ErrorKind::Bus,
            BusError::AddressNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            BusError::DataNack { .. } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            BusError::InvalidAddress(_) => ErrorKind::Other,
        }
    }
}

impl<P: TwiPeripheral> ErrorType for BusMaster<P> {
    type Error = BusError;
}

impl<P: TwiPeripheral> I2c<SevenBitAddress> for BusMaster<P> {
    /// Adjacent operations of the same direction share one address phase;
    /// a direction change issues a repeated START. The last byte of each
    /// read run is NACKed and the transaction ends with a single STOP.
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let address = BusAddr::new(address)?;
        // Direction of the run in progress: Some(true) while reading.
        let mut reading: Option<bool> = None;
        let mut written = 0;

        for i in 0..operations.len() {
            let next_reads = operations
                .get(i + 1)
                .map(|op| matches!(op, Operation::Read(_)));
            match &mut operations[i] {
                Operation::Write(bytes) => {
                    if reading != Some(false) {
                        self.begin_write(address)?;
                        written = 0;
                    }
                    self.send_bytes(bytes, &mut written)?;
                    if next_reads != Some(false) {
                        self.finish_write(written)?;
                    }
                    reading = Some(false);
                }
                Operation::Read(buffer) => {
                    if reading != Some(true) {
                        self.begin_read(address)?;
                    }
                    if let Err(error) = self.receive_bytes(buffer, next_reads != Some(true)) {
                        self.stop();
                        return Err(error);
                    }
                    reading = Some(true);
                }
            }
        }

        if reading.is_some() {
            self.stop();
        }
        Ok(())
    }
}
