/*!
 * Busy-Wait Backoff Strategies
 *
 * Stall primitives for the spin loops in the cohort and reader-writer
 * layers. Waiting is always active; the policy controls how aggressively
 * CPU is traded for wake-up latency.
 *
 * # Design: Exponential Backoff Over Linear Spinning
 *
 * The adaptive policy uses the three-phase scheme from modern spinlocks:
 *
 * 1. **Tight spin phase** (0-10 iterations): just `spin_loop()` hint
 * 2. **Yield phase** (10-50 iterations): `yield_now()` every iteration
 * 3. **Park phase** (50+ iterations): exponentially increasing sleep
 *
 * The pure-spin policy is the default: it preserves the hardware-stall-only
 * waiting the lock protocols were designed around, and is the right choice
 * for the short critical sections these locks target.
 */

use std::thread;
use std::time::Duration;

/// Iterations of tight spinning before the yield phase.
const SPIN_PHASE: u32 = 10;
/// Iterations before the park phase.
const YIELD_PHASE: u32 = 50;
/// Park-phase sleep cap.
const MAX_SLEEP_NS: u64 = 1_000_000;

/// How a spin loop stalls between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffPolicy {
    /// Hardware spin hint every iteration. Lowest latency, full CPU burn.
    #[default]
    Spin,
    /// Spin briefly, then yield to the scheduler every iteration. For
    /// oversubscribed cores where a waiting thread may be occupying the
    /// holder's CPU.
    Yield,
    /// Three-phase: tight spin, yield, then exponentially growing sleep
    /// capped at 1ms. For waits that are occasionally long.
    Adaptive,
}

/// Per-wait backoff state.
///
/// Create one per waiting episode; call [`snooze`](Backoff::snooze) once per
/// failed poll. Not shared between threads.
#[derive(Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    step: u32,
    sleep_ns: u64,
}

impl Backoff {
    /// Fresh backoff state for one waiting episode.
    #[inline]
    pub const fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            step: 0,
            sleep_ns: 1,
        }
    }

    /// Stall once. Escalates through the policy's phases on repeated calls.
    #[inline]
    pub fn snooze(&mut self) {
        match self.policy {
            BackoffPolicy::Spin => std::hint::spin_loop(),
            BackoffPolicy::Yield => {
                if self.step < SPIN_PHASE {
                    std::hint::spin_loop();
                } else {
                    thread::yield_now();
                }
            }
            BackoffPolicy::Adaptive => {
                if self.step < SPIN_PHASE {
                    std::hint::spin_loop();
                } else if self.step < YIELD_PHASE {
                    thread::yield_now();
                } else {
                    thread::sleep(Duration::from_nanos(self.sleep_ns));
                    self.sleep_ns = (self.sleep_ns * 2).min(MAX_SLEEP_NS);
                }
            }
        }
        self.step = self.step.saturating_add(1);
    }

    /// Restart from the tight-spin phase (the wait condition changed).
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
        self.sleep_ns = 1;
    }

    /// Policy this state was created with.
    #[inline]
    pub const fn policy(&self) -> BackoffPolicy {
        self.policy
    }

    /// Completed stall iterations since creation or the last reset.
    #[inline]
    pub const fn steps(&self) -> u32 {
        self.step
    }
}
