#![cfg_attr(not(feature = "std"), no_std)]

//! TM4C123 board port.
//!
//! Owns the NVIC and SysTick drivers over one shared register bus handle and
//! runs the start-up sequences that need both: the system tick (priority,
//! callback, then timer, all under a single interrupt-masked scope) and the
//! configurable fault handlers.
//!
//! With the `rt` feature the SysTick vector is bound to
//! [`hal_ti::systick::on_systick`], so a callback registered through
//! [`Tm4c123Port::init_system_tick`] runs on every tick.

#[macro_use]
mod fmt;

#[cfg(all(feature = "rt", target_arch = "arm", target_os = "none"))]
mod runtime;

use hal::timer::Timer;
use hal::{CallbackSlot, HalResult, IrqPriority, Mmio, RegisterBus, TickCallback};
use hal_ti::{Exception, Nvic, SysTick, SysTickConfig};

/// Faults enabled by [`Tm4c123Port::init_fault_handlers`]
pub const CONFIGURABLE_FAULTS: [Exception; 3] = [
    Exception::MemoryFault,
    Exception::BusFault,
    Exception::UsageFault,
];

/// Start-up configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    /// System tick period in milliseconds
    pub tick_period_ms: u32,
    /// SysTick exception priority, `0..=7`
    pub tick_priority: u8,
    /// SysTick clock frequency in hertz
    pub clock_hz: u32,
    /// Enable MemManage, BusFault and UsageFault instead of escalating to HardFault
    pub enable_faults: bool,
}

impl PortConfig {
    /// 1 ms tick at priority 3 from the 16 MHz system clock, faults enabled
    pub const fn new() -> Self {
        Self {
            tick_period_ms: 1,
            tick_priority: 3,
            clock_hz: hal_ti::systick::SYS_CLOCK_HZ,
            enable_faults: true,
        }
    }

    pub const fn with_tick_period_ms(self, tick_period_ms: u32) -> Self {
        Self {
            tick_period_ms,
            ..self
        }
    }

    pub const fn with_tick_priority(self, tick_priority: u8) -> Self {
        Self {
            tick_priority,
            ..self
        }
    }

    pub const fn with_clock_hz(self, clock_hz: u32) -> Self {
        Self { clock_hz, ..self }
    }

    pub const fn with_faults(self, enable_faults: bool) -> Self {
        Self {
            enable_faults,
            ..self
        }
    }

    /// SysTick clocking derived from this configuration
    pub const fn systick_config(&self) -> SysTickConfig {
        SysTickConfig::new().with_clock_hz(self.clock_hz)
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregates the core peripherals managed by the TM4C123 port.
#[derive(Debug)]
pub struct Tm4c123Port<B> {
    nvic: Nvic<B>,
    systick: SysTick<B>,
    config: PortConfig,
}

/// Both drivers get a copy of `bus`, so `B` must be a handle whose copies
/// reach the same registers: [`Mmio`] on the device, `&RefCell<_>` on the host.
///
/// Owned register files are rejected:
///
/// ```compile_fail
/// use hal_ti::sim::SimBus;
/// use port_tm4c123::{PortConfig, Tm4c123Port};
///
/// let _ = Tm4c123Port::new(SimBus::new(), PortConfig::new());
/// ```
impl<B: RegisterBus + Copy> Tm4c123Port<B> {
    /// Port whose SysTick dispatches through the global callback slot
    pub fn new(bus: B, config: PortConfig) -> Self {
        Self {
            nvic: Nvic::new(bus),
            systick: SysTick::new(bus, config.systick_config()),
            config,
        }
    }

    /// Port whose SysTick dispatches through `slot`
    pub fn with_slot(bus: B, config: PortConfig, slot: &'static CallbackSlot) -> Self {
        Self {
            nvic: Nvic::new(bus),
            systick: SysTick::with_slot(bus, config.systick_config(), slot),
            config,
        }
    }
}

impl Tm4c123Port<Mmio> {
    /// Port driving the device registers directly.
    ///
    /// # Safety
    ///
    /// Must run on a TM4C123, and no other code may configure the NVIC or
    /// SysTick while the port exists.
    pub unsafe fn steal(config: PortConfig) -> Self {
        Self::new(Mmio::new(), config)
    }
}

impl<B: RegisterBus> Tm4c123Port<B> {
    pub const fn config(&self) -> &PortConfig {
        &self.config
    }

    pub const fn nvic(&self) -> &Nvic<B> {
        &self.nvic
    }

    pub fn nvic_mut(&mut self) -> &mut Nvic<B> {
        &mut self.nvic
    }

    pub const fn systick(&self) -> &SysTick<B> {
        &self.systick
    }

    pub fn systick_mut(&mut self) -> &mut SysTick<B> {
        &mut self.systick
    }

    /// Start the system tick and route its expiries to `callback`.
    ///
    /// The priority is written before the timer is enabled so the first tick
    /// never fires at the reset priority. Nothing is written if the configured
    /// priority or period is invalid.
    pub fn init_system_tick(&mut self, callback: impl Into<TickCallback>) -> HalResult<()> {
        let config = self.config;
        let priority = IrqPriority::new(config.tick_priority)?;
        let reload = config.systick_config().reload_for(config.tick_period_ms)?;

        let nvic = &mut self.nvic;
        let systick = &mut self.systick;
        hal::mask::free(|_| {
            nvic.try_set_exception_priority(Exception::SysTick, priority.raw())?;
            Timer::set_callback(&mut *systick, callback.into());
            systick.try_initialize(config.tick_period_ms)
        })?;

        info!(
            "port: system tick every {} ms (reload {}), priority {}",
            config.tick_period_ms,
            reload,
            config.tick_priority
        );
        Ok(())
    }

    /// Enable the configurable faults, if the configuration asks for them
    pub fn init_fault_handlers(&mut self) -> HalResult<()> {
        if !self.config.enable_faults {
            debug!("port: configurable faults left disabled");
            return Ok(());
        }

        let nvic = &mut self.nvic;
        hal::mask::free(|_| {
            CONFIGURABLE_FAULTS
                .iter()
                .try_for_each(|&fault| nvic.try_enable_exception(fault))
        })?;

        debug!("port: MemManage, BusFault and UsageFault enabled");
        Ok(())
    }

    /// Stop the system tick and return SysTick to its reset state
    pub fn shutdown_system_tick(&mut self) {
        hal::mask::free(|_| self.systick.deinit());
    }

    /// Release the drivers
    pub fn into_parts(self) -> (Nvic<B>, SysTick<B>) {
        (self.nvic, self.systick)
    }
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PortConfig::default();
        assert_eq!(config.tick_period_ms, 1);
        assert_eq!(config.tick_priority, 3);
        assert_eq!(config.systick_config().reload_for(1), Ok(15_999));
        assert!(config.enable_faults);
    }

    #[test]
    fn builders_replace_single_fields() {
        let config = PortConfig::new()
            .with_tick_period_ms(10)
            .with_tick_priority(7)
            .with_clock_hz(8_000_000)
            .with_faults(false);

        assert_eq!(
            config,
            PortConfig {
                tick_period_ms: 10,
                tick_priority: 7,
                clock_hz: 8_000_000,
                enable_faults: false,
            }
        );
        assert_eq!(config.systick_config().reload_for(10), Ok(79_999));
    }
}
