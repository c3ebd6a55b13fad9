//! TM4C123 core peripheral drivers
//!
//! Implements the [`hal`] interrupt controller and timer traits for the
//! TM4C123GH6PM: the NVIC with its 139 interrupt lines, the System Control
//! Block fault/system handler registers, and the SysTick periodic timer.
//!
//! Drivers are generic over a [`RegisterBus`](hal::RegisterBus). On the target
//! use [`hal::Mmio`]; on the host use [`sim::SimBus`].

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod exception;
pub mod nvic;
pub mod regs;
pub mod sim;
pub mod systick;

pub use exception::Exception;
pub use nvic::{Irq, Nvic};
pub use systick::{ClockSource, SysTick, SysTickConfig, TimerState};
