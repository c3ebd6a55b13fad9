//! Common error types for HAL operations

use core::fmt;

/// HAL operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Interrupt line number outside the device's vector table
    InvalidIrq(u8),
    /// Priority value wider than the implemented priority bits
    InvalidPriority(u8),
    /// Exception category has no software enable or configurable priority
    UnsupportedException,
    /// Timer period that does not fit the reload register (or is zero)
    InvalidPeriod(u32),
    /// Timer polled while its counter is disabled
    TimerStopped,
    /// Operation not supported by this implementation
    NotSupported,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIrq(irq) => write!(f, "invalid interrupt line: {}", irq),
            Self::InvalidPriority(priority) => write!(f, "invalid priority: {}", priority),
            Self::UnsupportedException => write!(f, "exception is not configurable"),
            Self::InvalidPeriod(ms) => write!(f, "invalid timer period: {}ms", ms),
            Self::TimerStopped => write!(f, "timer is not counting"),
            Self::NotSupported => write!(f, "operation not supported"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

#[cfg(feature = "defmt")]
impl defmt::Format for HalError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidIrq(irq) => defmt::write!(fmt, "InvalidIrq({})", irq),
            Self::InvalidPriority(priority) => defmt::write!(fmt, "InvalidPriority({})", priority),
            Self::UnsupportedException => defmt::write!(fmt, "UnsupportedException"),
            Self::InvalidPeriod(ms) => defmt::write!(fmt, "InvalidPeriod({}ms)", ms),
            Self::TimerStopped => defmt::write!(fmt, "TimerStopped"),
            Self::NotSupported => defmt::write!(fmt, "NotSupported"),
        }
    }
}

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;
