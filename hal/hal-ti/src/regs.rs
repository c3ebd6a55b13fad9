//! TM4C123GH6PM System Control Space register map
//!
//! Addresses and bit masks from the TM4C123GH6PM datasheet, section 3.5
//! (Cortex-M4 peripherals). Banked registers are the first of five
//! consecutive words; use [`Reg::offset`] with the bank index.

use hal::Reg;

// SysTick

/// SysTick control and status
pub const STCTRL: Reg = Reg::at(0xE000_E010);
/// SysTick reload value
pub const STRELOAD: Reg = Reg::at(0xE000_E014);
/// SysTick current value
pub const STCURRENT: Reg = Reg::at(0xE000_E018);

/// Counter enable
pub const STCTRL_ENABLE: u32 = 1 << 0;
/// Raise the SysTick exception on expiry
pub const STCTRL_INTEN: u32 = 1 << 1;
/// 1 = system clock, 0 = PIOSC / 4
pub const STCTRL_CLK_SRC: u32 = 1 << 2;
/// Counted to zero since last read (read-only, clear on read)
pub const STCTRL_COUNT: u32 = 1 << 16;
/// ENABLE | INTEN | CLK_SRC
pub const STCTRL_CONFIG_MASK: u32 = STCTRL_ENABLE | STCTRL_INTEN | STCTRL_CLK_SRC;

/// Width mask of the reload and current value fields
pub const ST_COUNTER_MASK: u32 = 0x00FF_FFFF;

// NVIC

/// Interrupt set-enable, lines 0-31 (EN0..EN4)
pub const EN0: Reg = Reg::at(0xE000_E100);
/// Interrupt clear-enable, lines 0-31 (DIS0..DIS4)
pub const DIS0: Reg = Reg::at(0xE000_E180);
/// Interrupt set-pending, lines 0-31 (PEND0..PEND4)
pub const PEND0: Reg = Reg::at(0xE000_E200);
/// Interrupt clear-pending, lines 0-31 (UNPEND0..UNPEND4)
pub const UNPEND0: Reg = Reg::at(0xE000_E280);
/// Interrupt active bits, lines 0-31 (ACTIVE0..ACTIVE4)
pub const ACTIVE0: Reg = Reg::at(0xE000_E300);
/// Interrupt priority, lines 0-3 (PRI0..PRI34)
pub const PRI0: Reg = Reg::at(0xE000_E400);

/// Number of enable/disable/pending/active banks
pub const NVIC_BANKS: u32 = 5;
/// Number of interrupt priority registers
pub const NVIC_PRI_REGS: u32 = 35;

// System Control Block

/// System handler priority 1 (MEM, BUS, USAGE)
pub const SYSPRI1: Reg = Reg::at(0xE000_ED18);
/// System handler priority 2 (SVC)
pub const SYSPRI2: Reg = Reg::at(0xE000_ED1C);
/// System handler priority 3 (DEBUG, PENDSV, TICK)
pub const SYSPRI3: Reg = Reg::at(0xE000_ED20);
/// System handler control and state
pub const SYSHNDCTRL: Reg = Reg::at(0xE000_ED24);

/// Memory management fault enable
pub const SYSHNDCTRL_MEM: u32 = 1 << 16;
/// Bus fault enable
pub const SYSHNDCTRL_BUS: u32 = 1 << 17;
/// Usage fault enable
pub const SYSHNDCTRL_USAGE: u32 = 1 << 18;

/// Shift of the significant priority bits within each 8-bit field
pub const PRIORITY_FIELD_SHIFT: u32 = 5;
/// Distance between consecutive priority fields
pub const PRIORITY_FIELD_STRIDE: u32 = 8;
/// Priority fields per register
pub const PRIORITY_FIELDS_PER_REG: u32 = 4;
