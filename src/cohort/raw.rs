/*!
 * Raw Exclusive Locks
 *
 * Building blocks for the cohort hierarchy. Two flavors:
 * - [`SpinLock`]: test-and-test-and-set with a hardware stall hint; waiters
 *   burn CPU but wake with minimal latency
 * - [`OsLock`]: `parking_lot`'s raw mutex; waiters park in the OS, for
 *   hierarchies whose critical sections may outlast a spin budget
 */

use crate::traits::{Exclusive, RawLock};
use std::sync::atomic::{AtomicBool, Ordering};

/// `parking_lot` raw mutex as a cohort building block.
pub type OsLock = parking_lot::RawMutex;

/// Test-and-test-and-set spinlock.
///
/// Waiters poll a local cache-line copy and only retry the atomic swap once
/// the lock reads free, keeping contention off the interconnect.
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
pub struct SpinLock {
    state: AtomicBool,
}

impl SpinLock {
    /// New unlocked instance.
    #[inline]
    pub const fn new() -> Self {
        Self {
            state: AtomicBool::new(false),
        }
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for SpinLock {
    const INIT: Self = Self::new();

    #[inline]
    fn lock(&self) {
        loop {
            if self
                .state
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
            while self.state.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
    }

    #[inline]
    fn unlock(&self) {
        self.state.store(false, Ordering::Release);
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.state.load(Ordering::Acquire)
    }
}

/// A flat spinlock is a degenerate cohort: exclusive access with no
/// hierarchy and no per-thread context. Useful for single-node machines and
/// as a drop-in collaborator in tests.
impl Exclusive for SpinLock {
    type Token = ();

    #[inline]
    fn acquire(&self, _token: &()) {
        self.lock();
    }

    #[inline]
    fn release(&self, _token: &()) {
        self.unlock();
    }

    #[inline]
    fn is_locked(&self) -> bool {
        RawLock::is_locked(self)
    }
}

impl RawLock for OsLock {
    const INIT: Self = <OsLock as parking_lot::lock_api::RawMutex>::INIT;

    #[inline]
    fn lock(&self) {
        parking_lot::lock_api::RawMutex::lock(self);
    }

    #[inline]
    fn unlock(&self) {
        // Contract: only the holder calls unlock.
        unsafe { parking_lot::lock_api::RawMutex::unlock(self) };
    }

    #[inline]
    fn is_locked(&self) -> bool {
        parking_lot::lock_api::RawMutex::is_locked(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::thread;

    #[test]
    fn test_lifecycle() {
        let lock = SpinLock::new();
        assert!(!RawLock::is_locked(&lock));

        lock.lock();
        assert!(RawLock::is_locked(&lock));

        lock.unlock();
        assert!(!RawLock::is_locked(&lock));
    }

    #[test]
    fn test_concurrent_counter() {
        let lock = SpinLock::new();
        let counter = AtomicU64::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        lock.lock();
                        // Relaxed is enough: the lock orders the increments
                        let v = counter.load(Ordering::Relaxed);
                        counter.store(v + 1, Ordering::Relaxed);
                        lock.unlock();
                    }
                });
            }
        });

        assert_eq!(counter.load(Ordering::Relaxed), 8_000);
    }

    #[test]
    fn test_os_lock_lifecycle() {
        let lock = <OsLock as RawLock>::INIT;
        assert!(!RawLock::is_locked(&lock));

        RawLock::lock(&lock);
        assert!(RawLock::is_locked(&lock));

        RawLock::unlock(&lock);
        assert!(!RawLock::is_locked(&lock));
    }
}
