//! Register bus abstraction
//!
//! Drivers never dereference peripheral addresses directly. They issue reads
//! and writes through a [`RegisterBus`], which is either the real memory-mapped
//! bus ([`Mmio`]) or a simulated register file used on the host.

use core::cell::RefCell;
use core::fmt;

/// Address of a 32-bit memory-mapped register
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg(u32);

impl Reg {
    /// Register at an absolute address
    pub const fn at(addr: u32) -> Self {
        Self(addr)
    }

    /// Raw address
    pub const fn addr(self) -> u32 {
        self.0
    }

    /// Register `words` 32-bit words past this one
    pub const fn offset(self, words: u32) -> Self {
        Self(self.0 + words * 4)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Reg {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=u32:#x}", self.0);
    }
}

/// Access to 32-bit peripheral registers.
///
/// `read` takes `&mut self` because some registers change on read (the
/// SysTick COUNT flag clears when the control register is read).
pub trait RegisterBus {
    /// Read a register
    fn read(&mut self, reg: Reg) -> u32;

    /// Write a register
    fn write(&mut self, reg: Reg, value: u32);

    /// Read-modify-write a register
    fn modify<F>(&mut self, reg: Reg, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Set the bits in `mask`, leaving the others untouched
    fn set_bits(&mut self, reg: Reg, mask: u32) {
        self.modify(reg, |value| value | mask);
    }

    /// Clear the bits in `mask`, leaving the others untouched
    fn clear_bits(&mut self, reg: Reg, mask: u32) {
        self.modify(reg, |value| value & !mask);
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read(&mut self, reg: Reg) -> u32 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Reg, value: u32) {
        (**self).write(reg, value)
    }
}

/// Lets several drivers share one bus from a single execution context.
impl<B: RegisterBus> RegisterBus for &RefCell<B> {
    fn read(&mut self, reg: Reg) -> u32 {
        self.borrow_mut().read(reg)
    }

    fn write(&mut self, reg: Reg, value: u32) {
        self.borrow_mut().write(reg, value)
    }
}

/// The processor's memory-mapped register bus.
///
/// Accesses are volatile and never reordered with respect to each other.
/// Copies all address the same device registers.
#[derive(Debug, Clone, Copy)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Creates a handle to the memory-mapped bus.
    ///
    /// # Safety
    ///
    /// Every [`Reg`] passed through the returned bus must be a valid, aligned
    /// peripheral register on the running device. Only use on the target.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Mmio {
    #[inline]
    fn read(&mut self, reg: Reg) -> u32 {
        // SAFETY: the constructor contract guarantees `reg` is a device register.
        unsafe { core::ptr::read_volatile(reg.addr() as usize as *const u32) }
    }

    #[inline]
    fn write(&mut self, reg: Reg, value: u32) {
        // SAFETY: as above.
        unsafe { core::ptr::write_volatile(reg.addr() as usize as *mut u32, value) }
    }
}

/// Completes outstanding register writes before the next instruction.
///
/// Needed after masking an interrupt line so the change is visible before
/// code that relies on the line being quiet.
#[inline]
pub fn sync_barrier() {
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    {
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }
}
