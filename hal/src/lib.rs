//! Hardware Abstraction Layer (HAL) for Cortex-M microcontrollers
//!
//! This crate provides vendor-agnostic traits and register primitives for the
//! core peripherals every Cortex-M part shares: the interrupt controller and a
//! periodic tick timer. Vendor crates (such as `hal-ti`) implement the traits
//! against a concrete memory map.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(test)]
extern crate std;

pub mod bus;
pub mod callback;
pub mod error;
pub mod interrupt;
pub mod mask;
pub mod priority;
pub mod timer;

// Re-export commonly used types
pub use bus::{Mmio, Reg, RegisterBus};
pub use callback::{CallbackSlot, TickCallback, TickSink};
pub use error::{HalError, HalResult};
pub use priority::IrqPriority;
