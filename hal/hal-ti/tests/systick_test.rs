use std::sync::atomic::{AtomicUsize, Ordering};

use embedded_hal::delay::DelayNs;
use hal::timer::{Timer, TimerMode};
use hal::{CallbackSlot, HalError, TickSink};
use hal_ti::regs::{
    STCTRL, STCTRL_CLK_SRC, STCTRL_COUNT, STCTRL_ENABLE, STCTRL_INTEN, STCURRENT, STRELOAD,
};
use hal_ti::sim::SimBus;
use hal_ti::systick::{on_systick, SYSTICK_CALLBACK};
use hal_ti::{SysTick, SysTickConfig, TimerState};

fn systick(slot: &'static CallbackSlot) -> SysTick<SimBus> {
    SysTick::with_slot(SimBus::new(), SysTickConfig::new(), slot)
}

#[test]
fn initialize_one_millisecond() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = systick(&SLOT);
    timer.bus_mut().poke(STCURRENT, 1234);

    timer.initialize(1);

    let bus = timer.bus_mut();
    assert_eq!(bus.peek(STRELOAD), 15_999);
    assert_eq!(bus.peek(STCURRENT), 0);
    assert_eq!(
        bus.peek(STCTRL),
        STCTRL_ENABLE | STCTRL_INTEN | STCTRL_CLK_SRC
    );
    assert_eq!(
        bus.journal().map(|(reg, _)| *reg).collect::<Vec<_>>(),
        vec![STRELOAD, STCURRENT, STCTRL]
    );
    assert_eq!(timer.state(), TimerState::Running);
}

#[test]
fn initialize_rejects_unrepresentable_periods() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = systick(&SLOT);

    timer.initialize(0);
    timer.initialize(1049);

    assert_eq!(timer.bus_mut().journal().count(), 0);
    assert_eq!(timer.state(), TimerState::Uninitialized);
    assert_eq!(timer.try_initialize(0), Err(HalError::InvalidPeriod(0)));
    assert_eq!(timer.try_initialize(5000), Err(HalError::InvalidPeriod(5000)));
}

#[test]
fn reinitialize_overwrites_previous_period() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = systick(&SLOT);

    timer.initialize(1);
    timer.initialize(10);

    assert_eq!(timer.reload(), 159_999);
    assert_eq!(timer.state(), TimerState::Running);
}

#[test]
fn periodic_expiries_queue_exceptions() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = systick(&SLOT);
    timer.initialize(1);

    timer.bus_mut().advance(16_000 * 5);

    assert_eq!(timer.bus_mut().pending_ticks(), 5);
    assert!(timer.has_wrapped());
    assert!(!timer.has_wrapped());
}

#[test]
fn busy_wait_returns_after_count_and_stops() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = SysTick::with_slot(
        SimBus::new().with_poll_step(4_000),
        SysTickConfig::new(),
        &SLOT,
    );

    timer.start_busy_wait(1);

    let bus = timer.bus_mut();
    assert!(bus.elapsed_cycles() >= 16_000);
    assert_eq!(bus.peek(STCTRL) & STCTRL_ENABLE, 0);
    assert_eq!(bus.peek(STCTRL) & STCTRL_INTEN, 0);
    assert_eq!(bus.peek(STRELOAD), 15_999);
    assert_eq!(bus.pending_ticks(), 0);
    assert_eq!(timer.state(), TimerState::Stopped);
}

#[test]
fn busy_wait_reads_the_flag_once_per_poll() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = SysTick::with_slot(
        SimBus::new().with_poll_step(4_000),
        SysTickConfig::new(),
        &SLOT,
    );

    timer.start_busy_wait(1);

    // One read to program STCTRL, four polls, one read to clear ENABLE.
    assert_eq!(timer.bus_mut().ctrl_reads(), 6);
}

#[test]
fn busy_wait_does_not_use_the_callback() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    fn count() {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    let mut timer = SysTick::with_slot(
        SimBus::new().with_poll_step(1_000),
        SysTickConfig::new(),
        &SLOT,
    );
    timer.set_callback(count);
    timer.start_busy_wait(2);

    assert_eq!(CALLS.load(Ordering::SeqCst), 0);
}

#[test]
fn invalid_busy_wait_returns_immediately() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = systick(&SLOT);

    timer.start_busy_wait(0);

    assert_eq!(timer.bus_mut().journal().count(), 0);
    assert_eq!(
        timer.try_start_busy_wait(2000),
        Err(HalError::InvalidPeriod(2000))
    );
}

#[test]
fn handler_invokes_only_the_latest_callback() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    static FIRST: AtomicUsize = AtomicUsize::new(0);
    static SECOND: AtomicUsize = AtomicUsize::new(0);
    fn first() {
        FIRST.fetch_add(1, Ordering::SeqCst);
    }
    fn second() {
        SECOND.fetch_add(1, Ordering::SeqCst);
    }

    let mut timer = systick(&SLOT);
    timer.set_callback(first);
    timer.set_callback(second);

    assert!(timer.handler());
    assert_eq!(FIRST.load(Ordering::SeqCst), 0);
    assert_eq!(SECOND.load(Ordering::SeqCst), 1);
}

#[test]
fn set_callback_does_not_touch_registers() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = systick(&SLOT);
    timer.initialize(1);
    let before = timer.bus_mut().registers().clone();

    timer.set_callback(|| {});

    assert_eq!(timer.bus_mut().registers(), &before);
    assert_eq!(timer.state(), TimerState::Running);
}

#[test]
fn handler_without_callback_is_a_no_op() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let timer = systick(&SLOT);

    assert!(!timer.handler());
}

#[test]
fn sink_receives_each_tick() {
    struct Counter(AtomicUsize);

    impl TickSink for Counter {
        fn on_tick(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    static SLOT: CallbackSlot = CallbackSlot::new();
    static COUNTER: Counter = Counter(AtomicUsize::new(0));

    let mut timer = systick(&SLOT);
    timer.set_sink(&COUNTER);
    timer.initialize(1);
    timer.bus_mut().advance(16_000 * 3);

    while timer.bus_mut().take_pending_tick() {
        timer.handler();
    }

    assert_eq!(COUNTER.0.load(Ordering::SeqCst), 3);
}

#[test]
fn stop_and_start_toggle_enable_only() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = systick(&SLOT);
    timer.initialize(1);
    timer.bus_mut().advance(6_000);

    timer.stop();
    assert_eq!(timer.state(), TimerState::Stopped);
    assert_eq!(timer.bus_mut().peek(STCTRL), STCTRL_INTEN | STCTRL_CLK_SRC);
    assert_eq!(timer.reload(), 15_999);
    let paused_at = timer.current();
    assert_eq!(paused_at, 10_000);

    timer.bus_mut().advance(100_000);
    assert_eq!(timer.current(), paused_at);

    timer.start();
    assert_eq!(timer.state(), TimerState::Running);
    assert_eq!(
        timer.bus_mut().peek(STCTRL),
        STCTRL_ENABLE | STCTRL_INTEN | STCTRL_CLK_SRC
    );
    timer.bus_mut().advance(1_000);
    assert_eq!(timer.current(), paused_at - 1_000);
}

#[test]
fn stop_keeps_the_callback() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    fn count() {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    let mut timer = systick(&SLOT);
    timer.set_callback(count);
    timer.initialize(1);
    timer.stop();
    timer.start();

    assert!(timer.handler());
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn deinit_returns_to_quiescent_state() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = systick(&SLOT);
    timer.initialize(1);
    timer.bus_mut().advance(20_000);
    assert_ne!(timer.bus_mut().peek(STCTRL) & STCTRL_COUNT, 0);

    timer.deinit();

    assert_eq!(timer.state(), TimerState::Uninitialized);
    assert_eq!(timer.bus_mut().peek(STCTRL), 0);
    assert_eq!(timer.current(), 0);
    assert!(!timer.has_wrapped());

    timer.bus_mut().advance(100_000);
    assert_eq!(timer.bus_mut().peek(STCTRL), 0);
    assert_eq!(timer.current(), 0);
}

#[test]
fn one_shot_is_polled_through_wait() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = systick(&SLOT);

    Timer::start(&mut timer, 1, TimerMode::OneShot).unwrap();
    assert_eq!(timer.bus_mut().peek(STCTRL) & STCTRL_INTEN, 0);
    assert_eq!(Timer::wait(&mut timer), Err(nb::Error::WouldBlock));

    timer.bus_mut().advance(16_000);
    assert_eq!(Timer::wait(&mut timer), Ok(()));

    Timer::stop(&mut timer).unwrap();
    assert_eq!(
        Timer::wait(&mut timer),
        Err(nb::Error::Other(HalError::TimerStopped))
    );
    assert_eq!(timer.bus_mut().pending_ticks(), 0);
}

#[test]
fn periodic_mode_through_trait() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    fn count() {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    let mut timer = systick(&SLOT);
    Timer::set_callback(&mut timer, hal::TickCallback::from(count as fn()));
    Timer::start(&mut timer, 2, TimerMode::Periodic).unwrap();
    assert_eq!(timer.reload(), 31_999);

    timer.bus_mut().advance(10_000);
    assert_eq!(Timer::counter(&mut timer), 22_000);

    Timer::stop(&mut timer).unwrap();
    Timer::resume(&mut timer).unwrap();
    assert_eq!(timer.state(), TimerState::Running);

    assert!(timer.handler());
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn delay_spans_multiple_counter_periods() {
    static SLOT: CallbackSlot = CallbackSlot::new();
    let mut timer = SysTick::with_slot(
        SimBus::new().with_poll_step(100_000),
        SysTickConfig::new(),
        &SLOT,
    );

    // 2 s at 16 MHz needs two full 24-bit periods.
    timer.delay_ms(2_000);

    assert!(timer.bus_mut().elapsed_cycles() >= 32_000_000);
    assert_eq!(timer.bus_mut().peek(STCTRL) & STCTRL_ENABLE, 0);
    assert_eq!(timer.state(), TimerState::Stopped);
}

#[test]
fn global_slot_dispatches_from_the_exception_entry() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    fn count() {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    let mut timer = SysTick::new(SimBus::new(), SysTickConfig::new());
    timer.set_callback(count);

    assert!(SYSTICK_CALLBACK.is_set());
    assert!(on_systick());
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}
