//! Cortex-M system exceptions and where their controls live

use hal::{HalError, HalResult, Reg};

use crate::nvic::PriorityField;
use crate::regs;

/// System exceptions of the Cortex-M4 core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exception {
    Reset,
    Nmi,
    HardFault,
    MemoryFault,
    BusFault,
    UsageFault,
    SvCall,
    DebugMonitor,
    PendSv,
    SysTick,
}

impl Exception {
    /// All exceptions in vector table order
    pub const ALL: [Exception; 10] = [
        Exception::Reset,
        Exception::Nmi,
        Exception::HardFault,
        Exception::MemoryFault,
        Exception::BusFault,
        Exception::UsageFault,
        Exception::SvCall,
        Exception::DebugMonitor,
        Exception::PendSv,
        Exception::SysTick,
    ];

    /// Exception number (vector table index)
    pub const fn number(self) -> u8 {
        match self {
            Self::Reset => 1,
            Self::Nmi => 2,
            Self::HardFault => 3,
            Self::MemoryFault => 4,
            Self::BusFault => 5,
            Self::UsageFault => 6,
            Self::SvCall => 11,
            Self::DebugMonitor => 12,
            Self::PendSv => 14,
            Self::SysTick => 15,
        }
    }

    /// Reset, NMI and HardFault are always enabled at fixed priority
    pub const fn is_fixed(self) -> bool {
        matches!(self, Self::Reset | Self::Nmi | Self::HardFault)
    }

    /// Enable bit in SYSHNDCTRL, for the three configurable faults only
    pub const fn enable_mask(self) -> Option<u32> {
        match self {
            Self::MemoryFault => Some(regs::SYSHNDCTRL_MEM),
            Self::BusFault => Some(regs::SYSHNDCTRL_BUS),
            Self::UsageFault => Some(regs::SYSHNDCTRL_USAGE),
            _ => None,
        }
    }

    /// Priority field in SYSPRI1..3, `None` for fixed-priority exceptions
    pub const fn priority_field(self) -> Option<PriorityField> {
        let (reg, shift): (Reg, u32) = match self {
            Self::MemoryFault => (regs::SYSPRI1, 5),
            Self::BusFault => (regs::SYSPRI1, 13),
            Self::UsageFault => (regs::SYSPRI1, 21),
            Self::SvCall => (regs::SYSPRI2, 29),
            Self::DebugMonitor => (regs::SYSPRI3, 5),
            Self::PendSv => (regs::SYSPRI3, 21),
            Self::SysTick => (regs::SYSPRI3, 29),
            Self::Reset | Self::Nmi | Self::HardFault => return None,
        };
        Some(PriorityField::new(reg, shift))
    }

    pub(crate) fn require_enable_mask(self) -> HalResult<u32> {
        self.enable_mask().ok_or(HalError::UnsupportedException)
    }

    pub(crate) fn require_priority_field(self) -> HalResult<PriorityField> {
        self.priority_field().ok_or(HalError::UnsupportedException)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Exception {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Reset => defmt::write!(fmt, "Reset"),
            Self::Nmi => defmt::write!(fmt, "Nmi"),
            Self::HardFault => defmt::write!(fmt, "HardFault"),
            Self::MemoryFault => defmt::write!(fmt, "MemoryFault"),
            Self::BusFault => defmt::write!(fmt, "BusFault"),
            Self::UsageFault => defmt::write!(fmt, "UsageFault"),
            Self::SvCall => defmt::write!(fmt, "SvCall"),
            Self::DebugMonitor => defmt::write!(fmt, "DebugMonitor"),
            Self::PendSv => defmt::write!(fmt, "PendSv"),
            Self::SysTick => defmt::write!(fmt, "SysTick"),
        }
    }
}
