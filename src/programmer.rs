// src/programmer.rs

use crate::common::{
    error::BusError,
    hal_traits::{AnalogSampler, TickTimer, TwiPeripheral},
    pd_config::PdConfig,
    timing::{NOTIFY_BLINKS, NOTIFY_HALF_PERIOD},
};
use crate::receiver::Receiver;
use crate::stusb4500::{Nvm, Stusb4500, NVM_BANKS};
use embedded_hal::digital::OutputPin;
use log::{info, warn};

/// Why one programming attempt did not complete.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    #[error("NVM flash failed: {0}")]
    Flash(BusError),

    #[error("NVM read-back failed: {0}")]
    ReadBack(BusError),

    /// The read-back image differs from the flashed one.
    #[error("NVM bank {bank} did not verify")]
    Verify { bank: usize },

    #[error("soft reset failed: {0}")]
    Reset(BusError),
}

/// Receives configurations over the light link and burns them into the STUSB4500.
///
/// Each attempt flashes `base_image` with the received profile applied,
/// blinks the indicator and resets the part, which usually power-cycles the board.
pub struct Programmer<T, S, P, L> {
    receiver: Receiver<T, S>,
    chip: Stusb4500<P>,
    led: L,
    base_image: Nvm,
    verify: bool,
}

impl<T, S, P, L> Programmer<T, S, P, L>
where
    T: TickTimer,
    S: AnalogSampler,
    P: TwiPeripheral,
    L: OutputPin,
{
    pub fn new(receiver: Receiver<T, S>, chip: Stusb4500<P>, led: L) -> Self {
        Programmer { receiver, chip, led, base_image: Nvm::DEFAULT, verify: false }
    }

    /// Replaces the image the received profile is applied to.
    pub fn with_base_image(mut self, image: Nvm) -> Self {
        self.base_image = image;
        self
    }

    /// Reads the NVM back after flashing and compares it before notifying.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Aligns the receiver to the link by skipping one level change.
    pub fn sync(&mut self) {
        self.receiver.sync();
    }

    /// Blocks until a valid configuration arrives, then flashes it,
    /// blinks the indicator and requests a soft reset.
    ///
    /// The indicator only blinks once the flash (and the optional verify) succeeded.
    pub fn program_once(&mut self) -> Result<PdConfig, ProgramError> {
        let config = self.receiver.decode_config();
        let image = self.base_image.with_config(&config);

        self.chip
            .flash(&image, self.receiver.clock_mut())
            .map_err(ProgramError::Flash)?;

        if self.verify {
            let stored = self
                .chip
                .read_nvm(self.receiver.clock_mut())
                .map_err(ProgramError::ReadBack)?;
            if let Some(bank) = (0..NVM_BANKS).find(|&i| stored.bank(i) != image.bank(i)) {
                return Err(ProgramError::Verify { bank });
            }
        }

        info!("programmed {}", config);
        self.notify();
        self.chip.soft_reset().map_err(ProgramError::Reset)?;
        Ok(config)
    }

    /// Syncs once, then programs forever. Failed attempts are logged and
    /// the next retransmission is awaited.
    pub fn run(&mut self) -> ! {
        self.sync();
        loop {
            if let Err(e) = self.program_once() {
                warn!("{}", e);
            }
        }
    }

    fn notify(&mut self) {
        // Indicator errors are ignored.
        for _ in 0..NOTIFY_BLINKS {
            let _ = self.led.set_high();
            self.receiver.clock_mut().delay(NOTIFY_HALF_PERIOD);
            let _ = self.led.set_low();
            self.receiver.clock_mut().delay(NOTIFY_HALF_PERIOD);
        }
    }

    pub fn release(self) -> (Receiver<T, S>, Stusb4500<P>, L) {
        (self.receiver, self.chip, self.led)
    }
}
