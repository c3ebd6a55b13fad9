//! Nested Vectored Interrupt Controller driver
//!
//! Interrupt lines are grouped 32 to a bank. Enabling and disabling are
//! write-one-to-set/clear operations on separate EN and DIS registers, so they
//! are single writes and never disturb other lines. Priorities are packed four
//! to a register, one 8-bit field each, of which only the top three bits are
//! implemented.
//!
//! Every operation comes in two forms. The plain form (`enable_irq`) silently
//! ignores invalid input; the `try_` form reports it as a [`HalError`].

use hal::bus::sync_barrier;
use hal::interrupt::{InterruptController, IrqNumber};
use hal::{HalError, HalResult, IrqPriority, Reg, RegisterBus};

use crate::exception::Exception;
use crate::regs;

/// Number of interrupt lines in the TM4C123 vector table
pub const IRQ_COUNT: u16 = 139;

/// A validated interrupt line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Irq(u8);

impl Irq {
    /// Highest valid line number
    pub const MAX: u8 = (IRQ_COUNT - 1) as u8;

    /// Validate a line number
    pub const fn new(irq: IrqNumber) -> HalResult<Self> {
        if irq > Self::MAX {
            Err(HalError::InvalidIrq(irq))
        } else {
            Ok(Irq(irq))
        }
    }

    /// Line number
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Index of the 32-line bank holding this line
    pub const fn bank(self) -> u32 {
        self.0 as u32 / 32
    }

    /// Single-bit mask of this line within its bank
    pub const fn bit(self) -> u32 {
        1 << (self.0 as u32 % 32)
    }

    /// Priority field of this line in PRI0..PRI34
    pub const fn priority_field(self) -> PriorityField {
        let n = self.0 as u32;
        PriorityField::new(
            regs::PRI0.offset(n / regs::PRIORITY_FIELDS_PER_REG),
            regs::PRIORITY_FIELD_SHIFT
                + (n % regs::PRIORITY_FIELDS_PER_REG) * regs::PRIORITY_FIELD_STRIDE,
        )
    }
}

impl TryFrom<u8> for Irq {
    type Error = HalError;

    fn try_from(irq: u8) -> HalResult<Self> {
        Self::new(irq)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Irq {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "IRQ{}", self.0);
    }
}

/// Location of a 3-bit priority field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityField {
    reg: Reg,
    shift: u32,
}

impl PriorityField {
    pub const fn new(reg: Reg, shift: u32) -> Self {
        Self { reg, shift }
    }

    pub const fn reg(&self) -> Reg {
        self.reg
    }

    pub const fn shift(&self) -> u32 {
        self.shift
    }

    /// Bits occupied by the field
    pub const fn mask(&self) -> u32 {
        (IrqPriority::MAX as u32) << self.shift
    }

    /// Replace the field, leaving every other bit of the register untouched
    pub fn write<B: RegisterBus>(&self, bus: &mut B, priority: IrqPriority) {
        let mask = self.mask();
        let bits = priority.encode(self.shift);
        bus.modify(self.reg, |value| (value & !mask) | bits);
    }

    pub fn read<B: RegisterBus>(&self, bus: &mut B) -> IrqPriority {
        IrqPriority::decode(bus.read(self.reg), self.shift)
    }
}

/// NVIC and system handler control driver
#[derive(Debug)]
pub struct Nvic<B> {
    bus: B,
}

impl<B: RegisterBus> Nvic<B> {
    /// Wrap a register bus
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Release the bus
    pub fn free(self) -> B {
        self.bus
    }

    /// Access the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    // ---------------------------------------------------------------------
    // Interrupt lines
    // ---------------------------------------------------------------------

    /// Enable an interrupt line; out-of-range lines are ignored
    pub fn enable_irq(&mut self, irq: IrqNumber) {
        ignore("enable_irq", self.try_enable_irq(irq));
    }

    pub fn try_enable_irq(&mut self, irq: IrqNumber) -> HalResult<()> {
        let irq = Irq::new(irq)?;
        self.bus.write(regs::EN0.offset(irq.bank()), irq.bit());
        Ok(())
    }

    /// Disable an interrupt line; out-of-range lines are ignored
    pub fn disable_irq(&mut self, irq: IrqNumber) {
        ignore("disable_irq", self.try_disable_irq(irq));
    }

    pub fn try_disable_irq(&mut self, irq: IrqNumber) -> HalResult<()> {
        let irq = Irq::new(irq)?;
        self.bus.write(regs::DIS0.offset(irq.bank()), irq.bit());
        sync_barrier();
        Ok(())
    }

    /// Set the priority of an interrupt line.
    ///
    /// Ignored unless `irq <= 138` and `priority <= 7`.
    pub fn set_priority(&mut self, irq: IrqNumber, priority: u8) {
        ignore("set_priority", self.try_set_priority(irq, priority));
    }

    pub fn try_set_priority(&mut self, irq: IrqNumber, priority: u8) -> HalResult<()> {
        let irq = Irq::new(irq)?;
        let priority = IrqPriority::new(priority)?;
        irq.priority_field().write(&mut self.bus, priority);
        Ok(())
    }

    /// Current priority of an interrupt line
    pub fn priority(&mut self, irq: IrqNumber) -> HalResult<IrqPriority> {
        let irq = Irq::new(irq)?;
        Ok(irq.priority_field().read(&mut self.bus))
    }

    pub fn is_enabled(&mut self, irq: IrqNumber) -> HalResult<bool> {
        self.test_bit(regs::EN0, irq)
    }

    pub fn is_pending(&mut self, irq: IrqNumber) -> HalResult<bool> {
        self.test_bit(regs::PEND0, irq)
    }

    pub fn is_active(&mut self, irq: IrqNumber) -> HalResult<bool> {
        self.test_bit(regs::ACTIVE0, irq)
    }

    /// Force a line pending, as if its peripheral had raised it
    pub fn set_pending(&mut self, irq: IrqNumber) -> HalResult<()> {
        let irq = Irq::new(irq)?;
        self.bus.write(regs::PEND0.offset(irq.bank()), irq.bit());
        Ok(())
    }

    pub fn clear_pending(&mut self, irq: IrqNumber) -> HalResult<()> {
        let irq = Irq::new(irq)?;
        self.bus.write(regs::UNPEND0.offset(irq.bank()), irq.bit());
        Ok(())
    }

    fn test_bit(&mut self, bank0: Reg, irq: IrqNumber) -> HalResult<bool> {
        let irq = Irq::new(irq)?;
        Ok(self.bus.read(bank0.offset(irq.bank())) & irq.bit() != 0)
    }

    // ---------------------------------------------------------------------
    // System exceptions
    // ---------------------------------------------------------------------

    /// Enable MemManage, BusFault or UsageFault; other exceptions are ignored
    pub fn enable_exception(&mut self, exception: Exception) {
        ignore("enable_exception", self.try_enable_exception(exception));
    }

    pub fn try_enable_exception(&mut self, exception: Exception) -> HalResult<()> {
        let mask = exception.require_enable_mask()?;
        self.bus.set_bits(regs::SYSHNDCTRL, mask);
        Ok(())
    }

    /// Disable MemManage, BusFault or UsageFault; other exceptions are ignored
    pub fn disable_exception(&mut self, exception: Exception) {
        ignore("disable_exception", self.try_disable_exception(exception));
    }

    pub fn try_disable_exception(&mut self, exception: Exception) -> HalResult<()> {
        let mask = exception.require_enable_mask()?;
        self.bus.clear_bits(regs::SYSHNDCTRL, mask);
        sync_barrier();
        Ok(())
    }

    /// Whether an exception is enabled. Fixed exceptions always are; system
    /// exceptions without a software enable report `NotSupported`.
    pub fn is_exception_enabled(&mut self, exception: Exception) -> HalResult<bool> {
        if exception.is_fixed() {
            return Ok(true);
        }
        let mask = exception.enable_mask().ok_or(HalError::NotSupported)?;
        Ok(self.bus.read(regs::SYSHNDCTRL) & mask != 0)
    }

    /// Set the priority of a configurable exception.
    ///
    /// Ignored for `priority > 7` and for Reset, NMI and HardFault.
    pub fn set_exception_priority(&mut self, exception: Exception, priority: u8) {
        ignore(
            "set_exception_priority",
            self.try_set_exception_priority(exception, priority),
        );
    }

    pub fn try_set_exception_priority(
        &mut self,
        exception: Exception,
        priority: u8,
    ) -> HalResult<()> {
        let priority = IrqPriority::new(priority)?;
        let field = exception.require_priority_field()?;
        field.write(&mut self.bus, priority);
        Ok(())
    }

    pub fn exception_priority(&mut self, exception: Exception) -> HalResult<IrqPriority> {
        let field = exception.require_priority_field()?;
        Ok(field.read(&mut self.bus))
    }
}

fn ignore(op: &'static str, result: HalResult<()>) {
    if let Err(err) = result {
        debug!("nvic: {} ignored: {:?}", op, err);
    }
}

impl<B: RegisterBus> InterruptController for Nvic<B> {
    type Exception = Exception;

    fn enable_interrupt(&mut self, irq: IrqNumber) -> HalResult<()> {
        self.try_enable_irq(irq)
    }

    fn disable_interrupt(&mut self, irq: IrqNumber) -> HalResult<()> {
        self.try_disable_irq(irq)
    }

    fn set_priority(&mut self, irq: IrqNumber, priority: IrqPriority) -> HalResult<()> {
        self.try_set_priority(irq, priority.raw())
    }

    fn is_enabled(&mut self, irq: IrqNumber) -> HalResult<bool> {
        Nvic::is_enabled(self, irq)
    }

    fn is_pending(&mut self, irq: IrqNumber) -> HalResult<bool> {
        Nvic::is_pending(self, irq)
    }

    fn clear_pending(&mut self, irq: IrqNumber) -> HalResult<()> {
        Nvic::clear_pending(self, irq)
    }

    fn enable_exception(&mut self, exception: Exception) -> HalResult<()> {
        self.try_enable_exception(exception)
    }

    fn disable_exception(&mut self, exception: Exception) -> HalResult<()> {
        self.try_disable_exception(exception)
    }

    fn set_exception_priority(
        &mut self,
        exception: Exception,
        priority: IrqPriority,
    ) -> HalResult<()> {
        self.try_set_exception_priority(exception, priority.raw())
    }
}
