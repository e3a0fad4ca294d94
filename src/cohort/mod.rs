/*!
 * Cohort Mutual Exclusion
 *
 * NUMA-hierarchical exclusive locking: a global lock fronted by per-node
 * local locks, so consecutive same-node holders hand exclusive access off
 * without a global release. Remote cache-line traffic is paid once per
 * hand-off chain instead of once per acquisition.
 *
 * The building blocks are pluggable [`RawLock`] implementations: a
 * test-and-test-and-set [`SpinLock`] and an OS-blocking [`OsLock`] adapter.
 *
 * [`RawLock`]: crate::traits::RawLock
 */

mod lock;
mod raw;

pub use lock::{CohortLock, NodeToken, DEFAULT_PASS_LIMIT};
pub use raw::{OsLock, SpinLock};
