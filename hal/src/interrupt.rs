//! Interrupt controller abstraction

use crate::error::HalResult;
use crate::priority::IrqPriority;

/// Interrupt line number from the device vector table (0 = first IRQ)
pub type IrqNumber = u8;

/// Interrupt controller abstraction
///
/// Every method validates the line number against the device's vector table
/// and fails with [`HalError::InvalidIrq`](crate::HalError::InvalidIrq) without
/// touching hardware when it is out of range.
pub trait InterruptController {
    /// System exception identifier used by this controller
    type Exception: Copy;

    /// Enable interrupt
    fn enable_interrupt(&mut self, irq: IrqNumber) -> HalResult<()>;

    /// Disable interrupt
    fn disable_interrupt(&mut self, irq: IrqNumber) -> HalResult<()>;

    /// Set interrupt priority
    fn set_priority(&mut self, irq: IrqNumber, priority: IrqPriority) -> HalResult<()>;

    /// Check if interrupt is enabled
    fn is_enabled(&mut self, irq: IrqNumber) -> HalResult<bool>;

    /// Check if interrupt is pending
    fn is_pending(&mut self, irq: IrqNumber) -> HalResult<bool>;

    /// Clear pending interrupt
    fn clear_pending(&mut self, irq: IrqNumber) -> HalResult<()>;

    /// Enable a system exception that has a software enable
    fn enable_exception(&mut self, exception: Self::Exception) -> HalResult<()>;

    /// Disable a system exception that has a software enable
    fn disable_exception(&mut self, exception: Self::Exception) -> HalResult<()>;

    /// Set the priority of a configurable system exception
    fn set_exception_priority(
        &mut self,
        exception: Self::Exception,
        priority: IrqPriority,
    ) -> HalResult<()>;
}
