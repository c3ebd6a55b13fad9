//! Scoped interrupt and fault masking
//!
//! Multi-step configuration sequences (reload + current + control, or
//! priority before enable) must not be interrupted halfway. The drivers never
//! mask on their own; callers wrap such sequences in one of these scopes.
//! Each scope restores the mask state it found, on every exit path.

pub use critical_section::CriticalSection;

/// Run `f` with PRIMASK set (all configurable-priority exceptions masked).
///
/// Nested calls are allowed; the outermost scope restores the original state.
#[inline]
pub fn free<R>(f: impl FnOnce(CriticalSection<'_>) -> R) -> R {
    critical_section::with(f)
}

/// Run `f` with FAULTMASK set (everything except NMI masked).
///
/// ARMv6-M has no FAULTMASK; there the scope sets PRIMASK, which leaves
/// HardFault as well as NMI unmasked.
#[inline]
pub fn with_faults_masked<R>(f: impl FnOnce() -> R) -> R {
    let _guard = FaultMaskGuard::acquire();
    f()
}

/// Returns true while FAULTMASK is set
pub fn faults_masked() -> bool {
    arch::faults_masked()
}

/// Holds FAULTMASK set until dropped
#[derive(Debug)]
#[must_use = "FAULTMASK is released as soon as the guard is dropped"]
pub struct FaultMaskGuard {
    was_masked: bool,
}

impl FaultMaskGuard {
    /// Set FAULTMASK, remembering whether it was already set
    pub fn acquire() -> Self {
        let was_masked = arch::faults_masked();
        arch::mask_faults();
        Self { was_masked }
    }
}

impl Drop for FaultMaskGuard {
    fn drop(&mut self) {
        if !self.was_masked {
            // SAFETY: restoring the state observed in `acquire`.
            unsafe { arch::unmask_faults() }
        }
    }
}

#[cfg(all(target_arch = "arm", target_os = "none", armv7m))]
mod arch {
    // CPSID/CPSIE F require ARMv7-M or later.

    #[inline]
    pub fn faults_masked() -> bool {
        cortex_m::register::faultmask::read().is_inactive()
    }

    #[inline]
    pub fn mask_faults() {
        // SAFETY: masking cannot break memory safety.
        unsafe { core::arch::asm!("cpsid f", options(nomem, nostack, preserves_flags)) }
        cortex_m::asm::isb();
    }

    #[inline]
    pub unsafe fn unmask_faults() {
        core::arch::asm!("cpsie f", options(nomem, nostack, preserves_flags));
    }
}

#[cfg(all(target_arch = "arm", target_os = "none", not(armv7m)))]
mod arch {
    #[inline]
    pub fn faults_masked() -> bool {
        cortex_m::register::primask::read().is_inactive()
    }

    #[inline]
    pub fn mask_faults() {
        cortex_m::interrupt::disable();
    }

    #[inline]
    pub unsafe fn unmask_faults() {
        cortex_m::interrupt::enable();
    }
}

/// Host stand-in: a flag with the same save/restore discipline
#[cfg(not(all(target_arch = "arm", target_os = "none")))]
mod arch {
    use core::sync::atomic::{AtomicBool, Ordering};

    static FAULTMASK: AtomicBool = AtomicBool::new(false);

    pub fn faults_masked() -> bool {
        FAULTMASK.load(Ordering::Acquire)
    }

    pub fn mask_faults() {
        FAULTMASK.store(true, Ordering::Release);
    }

    pub unsafe fn unmask_faults() {
        FAULTMASK.store(false, Ordering::Release);
    }
}
