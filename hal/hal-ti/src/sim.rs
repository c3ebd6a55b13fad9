//! Simulated TM4C123 System Control Space
//!
//! An in-memory register file that behaves like the hardware where the
//! drivers depend on it:
//!
//! * EN/DIS, PEND/UNPEND are write-one-to-set/clear pairs over one state word
//!   per bank; ACTIVE is read-only.
//! * STCTRL.COUNT is read-only and clears when STCTRL is read.
//! * Writing STCURRENT clears it and COUNT.
//! * SysTick counts down while enabled when [`SimBus::advance`] is called,
//!   reloading one cycle after reaching zero. Each expiry with INTEN set
//!   queues a pending tick.
//!
//! Every other address is plain memory, up to [`MEMORY_CAPACITY`] distinct
//! words; storing one more panics. A bounded journal records the most
//! recent writes so tests can check *how* a register was written, not just
//! its final value.

use heapless::{Deque, FnvIndexMap};

use hal::{Reg, RegisterBus};

use crate::regs::{self, STCTRL_COUNT, STCTRL_ENABLE, STCTRL_INTEN, ST_COUNTER_MASK};

/// Number of most recent writes kept in the journal
pub const JOURNAL_DEPTH: usize = 32;

/// Distinct plain-memory addresses a [`SimBus`] can hold
pub const MEMORY_CAPACITY: usize = 64;

/// Observable register state, comparable before and after an operation
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterFile {
    memory: FnvIndexMap<u32, u32, MEMORY_CAPACITY>,
    enabled: [u32; regs::NVIC_BANKS as usize],
    pending: [u32; regs::NVIC_BANKS as usize],
    active: [u32; regs::NVIC_BANKS as usize],
    st_ctrl: u32,
    st_reload: u32,
    st_current: u32,
    st_count: bool,
}

impl RegisterFile {
    fn new() -> Self {
        Self {
            memory: FnvIndexMap::new(),
            enabled: [0; regs::NVIC_BANKS as usize],
            pending: [0; regs::NVIC_BANKS as usize],
            active: [0; regs::NVIC_BANKS as usize],
            st_ctrl: 0,
            st_reload: 0,
            st_current: 0,
            st_count: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bank {
    Enable,
    Disable,
    SetPending,
    ClearPending,
    Active,
}

fn decode_bank(reg: Reg) -> Option<(Bank, usize)> {
    const BANKS: [(Reg, Bank); 5] = [
        (regs::EN0, Bank::Enable),
        (regs::DIS0, Bank::Disable),
        (regs::PEND0, Bank::SetPending),
        (regs::UNPEND0, Bank::ClearPending),
        (regs::ACTIVE0, Bank::Active),
    ];

    BANKS.iter().find_map(|&(base, kind)| {
        let offset = reg.addr().checked_sub(base.addr())?;
        (offset % 4 == 0 && offset / 4 < regs::NVIC_BANKS).then(|| (kind, (offset / 4) as usize))
    })
}

/// In-memory register bus.
///
/// Not `Clone`; drivers share one bus through `&RefCell<SimBus>`.
#[derive(Debug)]
pub struct SimBus {
    regs: RegisterFile,
    journal: Deque<(Reg, u32), JOURNAL_DEPTH>,
    pending_ticks: u32,
    poll_step: u32,
    ctrl_reads: u32,
    elapsed: u64,
}

impl SimBus {
    /// All registers at their reset value of zero
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            journal: Deque::new(),
            pending_ticks: 0,
            poll_step: 0,
            ctrl_reads: 0,
            elapsed: 0,
        }
    }

    /// Advance SysTick by `cycles` on every read of STCTRL.
    ///
    /// Lets code that polls COUNT make progress without another thread.
    pub fn with_poll_step(mut self, cycles: u32) -> Self {
        self.poll_step = cycles;
        self
    }

    pub fn set_poll_step(&mut self, cycles: u32) {
        self.poll_step = cycles;
    }

    /// Snapshot of every register
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Read without side effects (COUNT is not cleared, time does not pass)
    pub fn peek(&self, reg: Reg) -> u32 {
        let r = &self.regs;
        match reg {
            regs::STCTRL => r.st_ctrl | (if r.st_count { STCTRL_COUNT } else { 0 }),
            regs::STRELOAD => r.st_reload,
            regs::STCURRENT => r.st_current,
            _ => match decode_bank(reg) {
                Some((Bank::Enable | Bank::Disable, i)) => r.enabled[i],
                Some((Bank::SetPending | Bank::ClearPending, i)) => r.pending[i],
                Some((Bank::Active, i)) => r.active[i],
                None => r.memory.get(&reg.addr()).copied().unwrap_or(0),
            },
        }
    }

    /// Overwrite raw state, bypassing write semantics and the journal.
    ///
    /// For STCTRL the COUNT bit of `value` sets the flag directly.
    pub fn poke(&mut self, reg: Reg, value: u32) {
        let r = &mut self.regs;
        match reg {
            regs::STCTRL => {
                r.st_ctrl = value & !STCTRL_COUNT;
                r.st_count = value & STCTRL_COUNT != 0;
            }
            regs::STRELOAD => r.st_reload = value & ST_COUNTER_MASK,
            regs::STCURRENT => r.st_current = value & ST_COUNTER_MASK,
            _ => match decode_bank(reg) {
                Some((Bank::Enable | Bank::Disable, i)) => r.enabled[i] = value,
                Some((Bank::SetPending | Bank::ClearPending, i)) => r.pending[i] = value,
                Some((Bank::Active, i)) => r.active[i] = value,
                None => store(&mut r.memory, reg, value),
            },
        }
    }

    /// Let `cycles` SysTick clock cycles elapse
    pub fn advance(&mut self, cycles: u32) {
        self.elapsed += u64::from(cycles);

        let r = &mut self.regs;
        if r.st_ctrl & STCTRL_ENABLE == 0 {
            return;
        }

        let mut remaining = cycles;
        while remaining > 0 {
            if r.st_current == 0 {
                // A zero reload halts the counter at the next wrap.
                if r.st_reload == 0 {
                    break;
                }
                r.st_current = r.st_reload;
                remaining -= 1;
                continue;
            }

            let step = remaining.min(r.st_current);
            r.st_current -= step;
            remaining -= step;

            if r.st_current == 0 {
                r.st_count = true;
                if r.st_ctrl & STCTRL_INTEN != 0 {
                    self.pending_ticks += 1;
                }
            }
        }
    }

    /// Consume one queued SysTick exception
    pub fn take_pending_tick(&mut self) -> bool {
        if self.pending_ticks > 0 {
            self.pending_ticks -= 1;
            true
        } else {
            false
        }
    }

    pub fn pending_ticks(&self) -> u32 {
        self.pending_ticks
    }

    /// Total cycles passed to [`SimBus::advance`], including poll steps
    pub fn elapsed_cycles(&self) -> u64 {
        self.elapsed
    }

    /// Number of STCTRL reads so far
    pub fn ctrl_reads(&self) -> u32 {
        self.ctrl_reads
    }

    /// Most recent writes, oldest first
    pub fn journal(&self) -> impl Iterator<Item = &(Reg, u32)> + '_ {
        self.journal.iter()
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Number of journalled writes to `reg`
    pub fn writes_to(&self, reg: Reg) -> usize {
        self.journal.iter().filter(|(r, _)| *r == reg).count()
    }

    fn record(&mut self, reg: Reg, value: u32) {
        if self.journal.is_full() {
            self.journal.pop_front();
        }
        // Cannot fail: a slot was freed above.
        let _ = self.journal.push_back((reg, value));
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

fn store(memory: &mut FnvIndexMap<u32, u32, MEMORY_CAPACITY>, reg: Reg, value: u32) {
    if memory.insert(reg.addr(), value).is_err() {
        panic!(
            "simulated register file full: cannot store {} ({} addresses in use)",
            reg, MEMORY_CAPACITY
        );
    }
}

impl RegisterBus for SimBus {
    fn read(&mut self, reg: Reg) -> u32 {
        if reg == regs::STCTRL {
            self.ctrl_reads += 1;
            if self.poll_step > 0 {
                self.advance(self.poll_step);
            }
            let value = self.peek(reg);
            self.regs.st_count = false;
            return value;
        }
        self.peek(reg)
    }

    fn write(&mut self, reg: Reg, value: u32) {
        self.record(reg, value);

        let r = &mut self.regs;
        match reg {
            regs::STCTRL => r.st_ctrl = value & !STCTRL_COUNT,
            regs::STRELOAD => r.st_reload = value & ST_COUNTER_MASK,
            regs::STCURRENT => {
                r.st_current = 0;
                r.st_count = false;
            }
            _ => match decode_bank(reg) {
                Some((Bank::Enable, i)) => r.enabled[i] |= value,
                Some((Bank::Disable, i)) => r.enabled[i] &= !value,
                Some((Bank::SetPending, i)) => r.pending[i] |= value,
                Some((Bank::ClearPending, i)) => r.pending[i] &= !value,
                Some((Bank::Active, _)) => {}
                None => store(&mut r.memory, reg, value),
            },
        }
    }
}
