// src/common/timing.rs

use core::time::Duration;

// The tick source is a timer overflowing 10 000 times per second (20 MHz / 2000).
// Everything in the receiver counts in these ticks.

// === Tick Source ===

/// Nominal duration of one tick.
pub const TICK_PERIOD: Duration = Duration::from_micros(100);
/// Ticks elapsing per millisecond at the nominal tick period.
pub const TICKS_PER_MS: u32 = 10;

/// Converts a duration into the number of whole ticks covering it, rounding up.
pub const fn ticks_for(duration: Duration) -> u32 {
    let tick_ns = TICK_PERIOD.as_nanos();
    let ns = duration.as_nanos();
    let ticks = (ns + tick_ns - 1) / tick_ns;
    if ticks > u32::MAX as u128 {
        u32::MAX
    } else {
        ticks as u32
    }
}

// === STUSB4500 NVM Programming ===

/// Settle time after sector/erase commands and bank writes.
pub const NVM_OPCODE_SETTLE: Duration = Duration::from_millis(4);
/// Settle time after the erase and soft-program sector commands.
pub const NVM_ERASE_SETTLE: Duration = Duration::from_millis(20);
/// Settle time after committing one bank.
pub const NVM_BANK_COMMIT: Duration = Duration::from_millis(8);
/// Settle time after unlocking NVM for reading.
pub const NVM_READ_UNLOCK: Duration = Duration::from_millis(2);
/// Settle time after requesting one bank for reading.
pub const NVM_BANK_READ: Duration = Duration::from_millis(1);

// === Notification ===

/// On (and off) time of each success blink.
pub const NOTIFY_HALF_PERIOD: Duration = Duration::from_millis(100);
/// Number of success blinks.
pub const NOTIFY_BLINKS: u8 = 10;

/// A point on the free-running 16-bit tick counter.
///
/// The counter wraps modulo 65536. Compare points only through
/// [`Tick::ticks_since`], which accounts for the wrap.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tick(u16);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    #[inline]
    pub const fn new(raw: u16) -> Self {
        Tick(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// The tick after this one, wrapping at 65536.
    #[inline]
    pub const fn next(self) -> Self {
        Tick(self.0.wrapping_add(1))
    }

    /// Ticks elapsed from `earlier` to `self`, modulo 65536.
    #[inline]
    pub const fn ticks_since(self, earlier: Tick) -> u16 {
        self.0.wrapping_sub(earlier.0)
    }
}
