//! Interrupt priority levels

use core::fmt;
use crate::{HalError, HalResult};

/// Number of implemented priority bits
pub const PRIORITY_BITS: u8 = 3;

/// Type-safe interrupt priority level (0 = highest urgency)
///
/// Only the top [`PRIORITY_BITS`] of each 8-bit priority field are
/// implemented, so valid levels are `0..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IrqPriority(u8);

impl IrqPriority {
    /// Most urgent level
    pub const HIGHEST: IrqPriority = IrqPriority(0);

    /// Least urgent level
    pub const LOWEST: IrqPriority = IrqPriority((1 << PRIORITY_BITS) - 1);

    /// Largest raw value accepted by [`IrqPriority::new`]
    pub const MAX: u8 = Self::LOWEST.0;

    /// Create a priority level, rejecting values wider than the field
    pub const fn new(priority: u8) -> HalResult<Self> {
        if priority > Self::MAX {
            Err(HalError::InvalidPriority(priority))
        } else {
            Ok(IrqPriority(priority))
        }
    }

    /// Get the raw priority value
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns true if `self` preempts `other`
    pub const fn preempts(self, other: IrqPriority) -> bool {
        self.0 < other.0
    }

    /// Encode into a field whose significant bits start at `shift`
    pub const fn encode(self, shift: u32) -> u32 {
        (self.0 as u32) << shift
    }

    /// Decode from a register value holding the field at `shift`
    pub const fn decode(value: u32, shift: u32) -> Self {
        IrqPriority(((value >> shift) & Self::MAX as u32) as u8)
    }
}

impl TryFrom<u8> for IrqPriority {
    type Error = HalError;

    fn try_from(value: u8) -> HalResult<Self> {
        Self::new(value)
    }
}

impl From<IrqPriority> for u8 {
    fn from(priority: IrqPriority) -> u8 {
        priority.0
    }
}

impl fmt::Display for IrqPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Priority({})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IrqPriority {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Priority({})", self.0);
    }
}

/// Create a compile-time checked priority constant
///
/// ```
/// use hal::{irq_priority, IrqPriority};
///
/// const TICK: IrqPriority = irq_priority!(3);
/// assert_eq!(TICK.raw(), 3);
/// ```
#[macro_export]
macro_rules! irq_priority {
    ($value:expr) => {
        match $crate::IrqPriority::new($value) {
            Ok(priority) => priority,
            Err(_) => panic!("interrupt priority out of range"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_creation() {
        for raw in 0..=7 {
            assert_eq!(IrqPriority::new(raw).map(IrqPriority::raw), Ok(raw));
        }
        assert_eq!(IrqPriority::new(8), Err(HalError::InvalidPriority(8)));
        assert_eq!(IrqPriority::new(255), Err(HalError::InvalidPriority(255)));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(IrqPriority::HIGHEST.preempts(IrqPriority::LOWEST));
        assert!(!IrqPriority::LOWEST.preempts(IrqPriority::LOWEST));
        assert_eq!(IrqPriority::MAX, 7);
    }

    #[test]
    fn test_encode_decode() {
        let p = irq_priority!(5);
        assert_eq!(p.encode(5), 0b101 << 5);
        assert_eq!(p.encode(29), 0xA000_0000);
        assert_eq!(IrqPriority::decode(0xFFFF_FFFF, 13), IrqPriority::LOWEST);
        assert_eq!(IrqPriority::decode(0b101 << 21, 21), p);
    }

    #[test]
    fn test_try_from() {
        assert!(IrqPriority::try_from(7).is_ok());
        assert!(IrqPriority::try_from(8).is_err());
        assert_eq!(u8::from(IrqPriority::LOWEST), 7);
    }
}
