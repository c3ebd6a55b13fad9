//! SysTick periodic timer driver
//!
//! SysTick is a 24-bit down-counter. It is loaded from STRELOAD one cycle
//! after reaching zero, sets STCTRL.COUNT on every expiry and, with INTEN
//! set, raises the SysTick exception. The exception handler calls
//! [`on_systick`], which runs the single registered callback.
//!
//! ```text
//! Uninitialized --initialize--> Running <--stop/start--> Stopped
//!       ^                          |                        |
//!       +---------- deinit --------+------------------------+
//! ```
//!
//! `start_busy_wait` is a blocking one-shot: it counts one period with the
//! exception disabled and leaves the timer `Stopped`.

use embedded_hal::delay::DelayNs;
use hal::timer::{Timer, TimerMode};
use hal::{CallbackSlot, HalError, HalResult, RegisterBus, TickCallback, TickSink};

use crate::regs::{
    STCTRL, STCTRL_CLK_SRC, STCTRL_CONFIG_MASK, STCTRL_COUNT, STCTRL_ENABLE, STCTRL_INTEN,
    STCURRENT, STRELOAD, ST_COUNTER_MASK,
};

/// Default system clock (16 MHz PIOSC, no PLL)
pub const SYS_CLOCK_HZ: u32 = 16_000_000;

/// SysTick's alternate clock, PIOSC divided by four
pub const PIOSC_DIV4_HZ: u32 = 4_000_000;

/// Callback slot dispatched by [`on_systick`]
pub static SYSTICK_CALLBACK: CallbackSlot = CallbackSlot::new();

/// Entry point for the SysTick exception.
///
/// Runs the callback registered through [`SysTick::set_callback`] on any
/// driver built with [`SysTick::new`]. Returns `false` if none is registered.
pub fn on_systick() -> bool {
    SYSTICK_CALLBACK.invoke()
}

/// SysTick clock input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// Core system clock
    System,
    /// Precision internal oscillator divided by four
    Precision,
}

impl ClockSource {
    /// Nominal frequency of this source at reset
    pub const fn default_hz(self) -> u32 {
        match self {
            Self::System => SYS_CLOCK_HZ,
            Self::Precision => PIOSC_DIV4_HZ,
        }
    }

    const fn ctrl_bits(self) -> u32 {
        match self {
            Self::System => STCTRL_CLK_SRC,
            Self::Precision => 0,
        }
    }
}

/// Timer clock configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysTickConfig {
    /// Frequency of the selected clock source in hertz
    pub clock_hz: u32,
    pub clock_source: ClockSource,
}

impl SysTickConfig {
    /// 16 MHz system clock
    pub const fn new() -> Self {
        Self {
            clock_hz: SYS_CLOCK_HZ,
            clock_source: ClockSource::System,
        }
    }

    pub const fn with_clock_hz(self, clock_hz: u32) -> Self {
        Self { clock_hz, ..self }
    }

    /// Select the clock input and reset `clock_hz` to its nominal frequency.
    ///
    /// Call [`with_clock_hz`](Self::with_clock_hz) afterwards if the system
    /// clock runs from the PLL.
    pub const fn with_clock_source(self, clock_source: ClockSource) -> Self {
        Self {
            clock_hz: clock_source.default_hz(),
            clock_source,
        }
    }

    /// Reload value producing one expiry every `period_ms` milliseconds.
    ///
    /// `(clock_hz / 1000) * period_ms - 1`, truncating. Zero periods and
    /// values that overflow the 24-bit counter are rejected.
    pub const fn reload_for(&self, period_ms: u32) -> HalResult<u32> {
        let ticks_per_ms = self.clock_hz / 1000;
        if period_ms == 0 || ticks_per_ms == 0 {
            return Err(HalError::InvalidPeriod(period_ms));
        }
        match ticks_per_ms.checked_mul(period_ms) {
            Some(ticks) if ticks - 1 <= ST_COUNTER_MASK => Ok(ticks - 1),
            _ => Err(HalError::InvalidPeriod(period_ms)),
        }
    }

    /// Longest period representable at this clock, in milliseconds
    pub const fn max_period_ms(&self) -> u32 {
        match self.clock_hz / 1000 {
            0 => 0,
            ticks_per_ms => (ST_COUNTER_MASK + 1) / ticks_per_ms,
        }
    }
}

impl Default for SysTickConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Driver-side view of the timer's run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Uninitialized,
    Running,
    Stopped,
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Uninitialized => defmt::write!(fmt, "Uninitialized"),
            Self::Running => defmt::write!(fmt, "Running"),
            Self::Stopped => defmt::write!(fmt, "Stopped"),
        }
    }
}

/// SysTick driver
///
/// Register sequences are not atomic. Mask interrupts around
/// [`initialize`](SysTick::initialize) if an earlier configuration may still
/// be firing.
#[derive(Debug)]
pub struct SysTick<B> {
    bus: B,
    config: SysTickConfig,
    state: TimerState,
    slot: &'static CallbackSlot,
}

impl<B: RegisterBus> SysTick<B> {
    /// Driver dispatching through the global [`SYSTICK_CALLBACK`] slot
    pub fn new(bus: B, config: SysTickConfig) -> Self {
        Self::with_slot(bus, config, &SYSTICK_CALLBACK)
    }

    /// Driver dispatching through a caller-provided slot
    pub const fn with_slot(bus: B, config: SysTickConfig, slot: &'static CallbackSlot) -> Self {
        Self {
            bus,
            config,
            state: TimerState::Uninitialized,
            slot,
        }
    }

    pub fn free(self) -> B {
        self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn config(&self) -> &SysTickConfig {
        &self.config
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Start periodic expiries every `period_ms`, raising the exception.
    ///
    /// Invalid periods leave the timer untouched.
    pub fn initialize(&mut self, period_ms: u32) {
        if let Err(err) = self.try_initialize(period_ms) {
            debug!("systick: initialize ignored: {:?}", err);
        }
    }

    pub fn try_initialize(&mut self, period_ms: u32) -> HalResult<()> {
        let reload = self.config.reload_for(period_ms)?;
        self.program(reload, STCTRL_ENABLE | STCTRL_INTEN);
        self.transition(TimerState::Running);
        Ok(())
    }

    /// Block for one `period_ms` period by polling COUNT, then stop.
    ///
    /// Does not use the callback. Spins forever if the clock is not running.
    pub fn start_busy_wait(&mut self, period_ms: u32) {
        if let Err(err) = self.try_start_busy_wait(period_ms) {
            debug!("systick: busy wait ignored: {:?}", err);
        }
    }

    pub fn try_start_busy_wait(&mut self, period_ms: u32) -> HalResult<()> {
        let reload = self.config.reload_for(period_ms)?;
        self.busy_wait_reload(reload)
    }

    fn busy_wait_reload(&mut self, reload: u32) -> HalResult<()> {
        self.program(reload, STCTRL_ENABLE);
        self.transition(TimerState::Running);

        nb::block!(self.wait())?;

        self.bus.clear_bits(STCTRL, STCTRL_ENABLE);
        self.transition(TimerState::Stopped);
        trace!("systick: busy wait of {} cycles done", reload + 1);
        Ok(())
    }

    /// Reload, clear, then enable. Other STCTRL bits are preserved.
    fn program(&mut self, reload: u32, enable_bits: u32) {
        let ctrl = enable_bits | self.config.clock_source.ctrl_bits();
        self.bus.write(STRELOAD, reload);
        self.bus.write(STCURRENT, 0);
        self.bus
            .modify(STCTRL, |value| (value & !STCTRL_CONFIG_MASK) | ctrl);
    }

    /// Register `callback`, replacing any previous callback or sink
    pub fn set_callback(&mut self, callback: fn()) {
        self.slot.replace(TickCallback::Function(callback));
    }

    /// Register a sink object, replacing any previous callback or sink
    pub fn set_sink(&mut self, sink: &'static dyn TickSink) {
        self.slot.replace(TickCallback::Sink(sink));
    }

    /// Run the registered callback once. An empty slot is a no-op.
    pub fn handler(&self) -> bool {
        let fired = self.slot.invoke();
        if !fired {
            trace!("systick: expiry with no callback registered");
        }
        fired
    }

    /// Clear ENABLE only; reload, current value and callback are kept
    pub fn stop(&mut self) {
        self.bus.clear_bits(STCTRL, STCTRL_ENABLE);
        if self.state == TimerState::Running {
            self.transition(TimerState::Stopped);
        }
    }

    /// Set ENABLE only, resuming from the current value
    pub fn start(&mut self) {
        self.bus.set_bits(STCTRL, STCTRL_ENABLE);
        self.transition(TimerState::Running);
    }

    /// Return to the reset state: STCTRL and STCURRENT zeroed, COUNT cleared
    pub fn deinit(&mut self) {
        self.bus.write(STCTRL, 0);
        self.bus.write(STCURRENT, 0);
        let _ = self.bus.read(STCTRL);
        self.transition(TimerState::Uninitialized);
    }

    /// Programmed reload value
    pub fn reload(&mut self) -> u32 {
        self.bus.read(STRELOAD) & ST_COUNTER_MASK
    }

    /// Live counter value
    pub fn current(&mut self) -> u32 {
        self.bus.read(STCURRENT) & ST_COUNTER_MASK
    }

    /// Whether the counter reached zero since STCTRL was last read.
    ///
    /// Reading clears the flag.
    pub fn has_wrapped(&mut self) -> bool {
        self.bus.read(STCTRL) & STCTRL_COUNT != 0
    }

    /// One poll of COUNT: a single STCTRL read
    pub fn wait(&mut self) -> nb::Result<(), HalError> {
        let ctrl = self.bus.read(STCTRL);
        if ctrl & STCTRL_COUNT != 0 {
            Ok(())
        } else if ctrl & STCTRL_ENABLE == 0 {
            Err(nb::Error::Other(HalError::TimerStopped))
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn transition(&mut self, next: TimerState) {
        if self.state != next {
            trace!("systick: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

impl<B: RegisterBus> Timer for SysTick<B> {
    /// `Periodic` is [`SysTick::try_initialize`]. `OneShot` programs the same
    /// period without the exception and returns at once; poll
    /// [`Timer::wait`] and then [`Timer::stop`].
    fn start(&mut self, period_ms: u32, mode: TimerMode) -> HalResult<()> {
        match mode {
            TimerMode::Periodic => self.try_initialize(period_ms),
            TimerMode::OneShot => {
                let reload = self.config.reload_for(period_ms)?;
                self.program(reload, STCTRL_ENABLE);
                self.transition(TimerState::Running);
                Ok(())
            }
        }
    }

    fn stop(&mut self) -> HalResult<()> {
        SysTick::stop(self);
        Ok(())
    }

    fn resume(&mut self) -> HalResult<()> {
        SysTick::start(self);
        Ok(())
    }

    fn counter(&mut self) -> u32 {
        self.current()
    }

    fn wait(&mut self) -> nb::Result<(), HalError> {
        SysTick::wait(self)
    }

    fn set_callback(&mut self, callback: TickCallback) {
        self.slot.replace(callback);
    }
}

/// Busy-wait delays. Each call reprograms the timer and leaves it `Stopped`,
/// so do not mix with periodic operation.
impl<B: RegisterBus> DelayNs for SysTick<B> {
    fn delay_ns(&mut self, ns: u32) {
        let mut cycles = u64::from(ns) * u64::from(self.config.clock_hz) / 1_000_000_000;
        while cycles > 0 {
            let chunk = cycles.min(u64::from(ST_COUNTER_MASK) + 1) as u32;
            // A reload of zero never expires.
            let reload = chunk.saturating_sub(1).max(1);
            if let Err(err) = self.busy_wait_reload(reload) {
                warn!("systick: delay aborted: {:?}", err);
                return;
            }
            cycles -= u64::from(chunk);
        }
    }
}
