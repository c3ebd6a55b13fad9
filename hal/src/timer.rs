//! Timer abstraction

use crate::callback::TickCallback;
use crate::error::{HalError, HalResult};

/// Timer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Reload forever, raising the timer exception on every expiry
    Periodic,
    /// Count one period with the exception disabled, then stop
    OneShot,
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerMode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Periodic => defmt::write!(fmt, "Periodic"),
            Self::OneShot => defmt::write!(fmt, "OneShot"),
        }
    }
}

/// Millisecond-period hardware timer
pub trait Timer {
    /// Program the period and start counting.
    ///
    /// `OneShot` timers do not raise the exception; poll [`Timer::wait`].
    fn start(&mut self, period_ms: u32, mode: TimerMode) -> HalResult<()>;

    /// Stop counting, keeping reload and current values
    fn stop(&mut self) -> HalResult<()>;

    /// Resume counting from the current value
    fn resume(&mut self) -> HalResult<()>;

    /// Get current counter value
    fn counter(&mut self) -> u32;

    /// Non-blocking check for expiry since the last call
    fn wait(&mut self) -> nb::Result<(), HalError>;

    /// Register the callback run on each periodic expiry
    fn set_callback(&mut self, callback: TickCallback);
}
