/*!
 * NUMA-Aware Reader-Writer Lock
 *
 * Reader-writer fairness layer over an [`Exclusive`] cohort lock, after
 * Calciu et al., "NUMA-Aware Reader-Writer Locks" (PPoPP 2013).
 *
 * # Design: Readers Never Take the Cohort Lock
 *
 * Writers serialize through the underlying cohort lock and then drain
 * active readers. Readers are admitted by an optimistic counter increment
 * plus a non-blocking query of the cohort lock's state: one shared atomic
 * and one load, no cohort acquisition, so read admission stays cheap and
 * NUMA-local.
 *
 * A second counter, the write barrier, exists purely for fairness: a reader
 * stalled past its wait limit raises it, which pauses new writer
 * acquisitions long enough for the reader to slip in. Exclusion never
 * depends on the barrier; it only bounds reader latency under a continuous
 * writer stream.
 *
 * # Memory Ordering
 *
 * The admission race is the store-buffer pattern: a reader increments the
 * read counter and then queries the cohort lock, while a writer acquires
 * the cohort lock and then reads the counter. Both sides issue a
 * sequentially consistent fence between their two accesses, so at least one
 * of them observes the other regardless of how weakly the cohort
 * implementation orders its own atomics. Spin-loop re-polls are acquire
 * loads; barrier traffic is relaxed (it is a hint, not a gate).
 */

use crate::backoff::Backoff;
use crate::config::RwConfig;
use crate::traits::Exclusive;
use std::sync::atomic::{fence, AtomicU32, Ordering};

/// NUMA-aware reader-writer lock over a cohort exclusive lock.
///
/// The cohort instance is borrowed, not owned: several thread groups can
/// point reader-writer locks at cohorts sized for their topology, and a
/// `static` cohort yields a `static` lock (construction is `const`).
///
/// Lock and unlock calls must be paired, with the same token on the write
/// side, and are not reentrant; violations are not detected.
///
/// # Examples
///
/// ```
/// use cohort_sync::{CohortLock, CohortRwLock, SpinLock};
///
/// let cohort: CohortLock<SpinLock> = CohortLock::new();
/// let token = cohort.assign_token();
/// let rw = CohortRwLock::with_defaults(&cohort);
///
/// {
///     let _write = rw.write(&token);
///     // exclusive access
/// }
/// let _read = rw.read(&token);
/// // shared access
/// ```
///
/// Compile-time construction with a flat spinlock standing in for the
/// cohort:
///
/// ```
/// use cohort_sync::{CohortRwLock, SpinLock};
///
/// static COHORT: SpinLock = SpinLock::new();
/// static LOCK: CohortRwLock<'static, SpinLock> = CohortRwLock::with_defaults(&COHORT);
///
/// LOCK.read_lock(&());
/// LOCK.read_unlock();
/// ```
#[repr(C, align(64))] // Keep the two counters off unrelated cache lines
pub struct CohortRwLock<'c, C: Exclusive> {
    cohort: &'c C,
    /// Threads between a successful `read_lock` admission and their
    /// `read_unlock`. Only ever moves in matched +1/-1 pairs per reader.
    read_counter: AtomicU32,
    /// Reader fairness episodes in progress. Raised at most once per
    /// `read_lock` call and always lowered by the same call.
    write_barrier: AtomicU32,
    config: RwConfig,
}

impl<'c, C: Exclusive> CohortRwLock<'c, C> {
    /// New lock over a borrowed cohort instance.
    #[inline]
    pub const fn new(cohort: &'c C, config: RwConfig) -> Self {
        Self {
            cohort,
            read_counter: AtomicU32::new(0),
            write_barrier: AtomicU32::new(0),
            config,
        }
    }

    /// New lock with the default configuration.
    #[inline]
    pub const fn with_defaults(cohort: &'c C) -> Self {
        Self::new(cohort, RwConfig::DEFAULT)
    }

    /// The underlying cohort instance.
    #[inline]
    pub const fn cohort(&self) -> &'c C {
        self.cohort
    }

    /// Configured wait limit.
    #[inline]
    pub const fn wait_limit(&self) -> u32 {
        self.config.wait_limit
    }

    /// Readers currently admitted (diagnostic snapshot).
    #[inline]
    pub fn active_readers(&self) -> u32 {
        self.read_counter.load(Ordering::Acquire)
    }

    /// Reader fairness episodes currently holding back writers (diagnostic
    /// snapshot).
    #[inline]
    pub fn barrier_count(&self) -> u32 {
        self.write_barrier.load(Ordering::Acquire)
    }

    /// Acquire exclusive access.
    ///
    /// Serializes against other writers through the cohort lock, then
    /// drains readers admitted before the acquisition became visible.
    pub fn write_lock(&self, token: &C::Token) {
        let mut backoff = Backoff::new(self.config.backoff);

        // Defer to any in-progress reader fairness episode. A writer that
        // slips past just as the barrier goes up is still excluded by the
        // acquisition and drain below; this check only yields throughput to
        // stalled readers.
        while self.write_barrier.load(Ordering::Relaxed) > 0 {
            backoff.snooze();
        }

        self.cohort.acquire(token);

        // Pairs with the fence in `read_lock`: either the drain below sees
        // the reader's increment, or the reader's query sees our
        // acquisition and it backs out.
        fence(Ordering::SeqCst);

        backoff.reset();
        while self.read_counter.load(Ordering::Acquire) > 0 {
            backoff.snooze();
        }
    }

    /// Release exclusive access. The counters are reader-owned; releasing
    /// the cohort lock is the entire unlock.
    #[inline]
    pub fn write_unlock(&self, token: &C::Token) {
        self.cohort.release(token);
    }

    /// Acquire shared access.
    ///
    /// Optimistically increments the read counter, then queries the cohort
    /// lock: free means the increment stands as the admission token. If a
    /// writer holds it, the increment is undone and the reader retries once
    /// the writer is gone. A reader stalled past the wait limit raises the
    /// write barrier so a continuous writer stream cannot starve it.
    pub fn read_lock(&self, _token: &C::Token) {
        let mut wait_count: u32 = 0;
        let mut raised = false;
        let mut backoff = Backoff::new(self.config.backoff);

        loop {
            self.read_counter.fetch_add(1, Ordering::SeqCst);
            // Pairs with the fence in `write_lock`; see module docs.
            fence(Ordering::SeqCst);

            if !self.cohort.is_locked() {
                break;
            }

            // A writer holds the cohort lock. Back out so its drain loop is
            // not counting us, then wait out the writer.
            self.read_counter.fetch_sub(1, Ordering::Release);
            while self.cohort.is_locked() {
                backoff.snooze();
                wait_count += 1;
                if wait_count > self.config.wait_limit && !raised {
                    self.write_barrier.fetch_add(1, Ordering::Relaxed);
                    raised = true;
                }
            }
        }

        if raised {
            self.write_barrier.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Release shared access. Readers never hold the cohort lock, so this
    /// is a single decrement.
    #[inline]
    pub fn read_unlock(&self) {
        self.read_counter.fetch_sub(1, Ordering::Release);
    }

    /// Shared access as an RAII guard.
    #[inline]
    pub fn read<'a>(&'a self, token: &C::Token) -> ReadGuard<'a, 'c, C> {
        self.read_lock(token);
        ReadGuard { rw: self }
    }

    /// Exclusive access as an RAII guard. The token is held for the release
    /// on drop.
    #[inline]
    pub fn write<'a>(&'a self, token: &'a C::Token) -> WriteGuard<'a, 'c, C> {
        self.write_lock(token);
        WriteGuard { rw: self, token }
    }
}

/// Shared access held until drop.
#[must_use = "the read lock is released immediately if the guard is dropped"]
pub struct ReadGuard<'a, 'c, C: Exclusive> {
    rw: &'a CohortRwLock<'c, C>,
}

impl<C: Exclusive> Drop for ReadGuard<'_, '_, C> {
    #[inline]
    fn drop(&mut self) {
        self.rw.read_unlock();
    }
}

/// Exclusive access held until drop.
#[must_use = "the write lock is released immediately if the guard is dropped"]
pub struct WriteGuard<'a, 'c, C: Exclusive> {
    rw: &'a CohortRwLock<'c, C>,
    token: &'a C::Token,
}

impl<C: Exclusive> Drop for WriteGuard<'_, '_, C> {
    #[inline]
    fn drop(&mut self) {
        self.rw.write_unlock(self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::{CohortLock, SpinLock};
    use crate::config::DEFAULT_WAIT_LIMIT;

    #[test]
    fn test_construction_round_trip() {
        let cohort = SpinLock::new();
        let rw = CohortRwLock::new(
            &cohort,
            RwConfig {
                wait_limit: 7,
                ..RwConfig::DEFAULT
            },
        );

        assert_eq!(rw.wait_limit(), 7);
        assert_eq!(rw.active_readers(), 0);
        assert_eq!(rw.barrier_count(), 0);
    }

    #[test]
    fn test_defaults() {
        let cohort = SpinLock::new();
        let rw = CohortRwLock::with_defaults(&cohort);
        assert_eq!(rw.wait_limit(), DEFAULT_WAIT_LIMIT);
    }

    #[test]
    fn test_uncontended_write() {
        let cohort = SpinLock::new();
        let rw = CohortRwLock::with_defaults(&cohort);

        rw.write_lock(&());
        assert!(rw.cohort().is_locked());
        rw.write_unlock(&());

        assert!(!rw.cohort().is_locked());
        assert_eq!(rw.active_readers(), 0);
    }

    #[test]
    fn test_uncontended_read() {
        let cohort = SpinLock::new();
        let rw = CohortRwLock::with_defaults(&cohort);

        rw.read_lock(&());
        assert_eq!(rw.active_readers(), 1);
        assert!(!rw.cohort().is_locked());
        rw.read_unlock();
        assert_eq!(rw.active_readers(), 0);
    }

    #[test]
    fn test_guards() {
        let cohort = SpinLock::new();
        let rw = CohortRwLock::with_defaults(&cohort);
        let token = ();

        {
            let _read = rw.read(&token);
            assert_eq!(rw.active_readers(), 1);
        }
        assert_eq!(rw.active_readers(), 0);

        {
            let _write = rw.write(&token);
            assert!(rw.cohort().is_locked());
        }
        assert!(!rw.cohort().is_locked());
    }

    #[test]
    fn test_over_cohort() {
        let cohort: CohortLock<SpinLock> = CohortLock::with_nodes(2, 4);
        let token = cohort.assign_token();
        let rw = CohortRwLock::with_defaults(&cohort);

        rw.write_lock(&token);
        rw.write_unlock(&token);

        rw.read_lock(&token);
        rw.read_unlock();
        assert_eq!(rw.active_readers(), 0);
    }

    #[test]
    fn test_static_construction() {
        static COHORT: SpinLock = SpinLock::new();
        static LOCK: CohortRwLock<'static, SpinLock> = CohortRwLock::with_defaults(&COHORT);

        LOCK.read_lock(&());
        assert_eq!(LOCK.active_readers(), 1);
        LOCK.read_unlock();
        assert_eq!(LOCK.active_readers(), 0);
    }
}
