//! Single-slot timer callbacks
//!
//! A periodic timer dispatches exactly one registered callback per expiry.
//! The slot lives in a `static` so the exception handler can reach it, and is
//! guarded by a critical section so registration from thread mode cannot tear
//! against a concurrent expiry.

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

/// Receiver of timer expiries
pub trait TickSink: Sync {
    /// Called once per expiry, from the timer's exception handler
    fn on_tick(&self);
}

/// A registered expiry callback
#[derive(Clone, Copy)]
pub enum TickCallback {
    /// Plain function
    Function(fn()),
    /// Shared object implementing [`TickSink`]
    Sink(&'static dyn TickSink),
}

impl TickCallback {
    /// Run the callback
    #[inline]
    pub fn invoke(&self) {
        match self {
            Self::Function(f) => f(),
            Self::Sink(sink) => sink.on_tick(),
        }
    }
}

impl From<fn()> for TickCallback {
    fn from(f: fn()) -> Self {
        Self::Function(f)
    }
}

impl<T: TickSink + 'static> From<&'static T> for TickCallback {
    fn from(sink: &'static T) -> Self {
        Self::Sink(sink)
    }
}

impl fmt::Debug for TickCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(func) => f.debug_tuple("Function").field(func).finish(),
            Self::Sink(_) => f.write_str("Sink(..)"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TickCallback {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Function(_) => defmt::write!(fmt, "Function"),
            Self::Sink(_) => defmt::write!(fmt, "Sink"),
        }
    }
}

/// Process-wide storage for one [`TickCallback`]
pub struct CallbackSlot {
    callback: Mutex<Cell<Option<TickCallback>>>,
}

impl CallbackSlot {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            callback: Mutex::new(Cell::new(None)),
        }
    }

    /// Store `callback`, returning the one it replaces
    pub fn replace(&self, callback: TickCallback) -> Option<TickCallback> {
        critical_section::with(|cs| self.callback.borrow(cs).replace(Some(callback)))
    }

    /// Currently registered callback
    pub fn get(&self) -> Option<TickCallback> {
        critical_section::with(|cs| self.callback.borrow(cs).get())
    }

    /// Returns true once a callback has been registered
    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    /// Invoke the registered callback.
    ///
    /// The callback runs outside the critical section so it may itself
    /// register a replacement. Returns `false` if the slot is empty.
    pub fn invoke(&self) -> bool {
        match self.get() {
            Some(callback) => {
                callback.invoke();
                true
            }
            None => false,
        }
    }
}

impl Default for CallbackSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("callback", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    static FIRST: AtomicUsize = AtomicUsize::new(0);
    static SECOND: AtomicUsize = AtomicUsize::new(0);

    fn first() {
        FIRST.fetch_add(1, Ordering::SeqCst);
    }

    fn second() {
        SECOND.fetch_add(1, Ordering::SeqCst);
    }

    struct Counter(AtomicUsize);

    impl TickSink for Counter {
        fn on_tick(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn empty_slot_does_nothing() {
        let slot = CallbackSlot::new();
        assert!(!slot.is_set());
        assert!(!slot.invoke());
    }

    #[test]
    fn replacement_drops_previous_callback() {
        static SLOT: CallbackSlot = CallbackSlot::new();

        assert!(SLOT.replace(TickCallback::from(first as fn())).is_none());
        let previous = SLOT.replace(TickCallback::Function(second));
        assert!(matches!(previous, Some(TickCallback::Function(_))));

        assert!(SLOT.invoke());
        assert_eq!(FIRST.load(Ordering::SeqCst), 0);
        assert_eq!(SECOND.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sink_receives_ticks() {
        static COUNTER: Counter = Counter(AtomicUsize::new(0));
        let slot = CallbackSlot::new();

        slot.replace(TickCallback::from(&COUNTER));
        for _ in 0..3 {
            slot.invoke();
        }

        assert_eq!(COUNTER.0.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn trait_object_sink_is_shareable() {
        static COUNTER: Counter = Counter(AtomicUsize::new(0));
        static SLOT: CallbackSlot = CallbackSlot::new();

        let sink: &'static dyn TickSink = &COUNTER;
        SLOT.replace(TickCallback::Sink(sink));

        let copy = SLOT.get();
        assert!(matches!(copy, Some(TickCallback::Sink(_))));
        assert!(SLOT.invoke());
        assert_eq!(COUNTER.0.load(Ordering::SeqCst), 1);
    }
}
