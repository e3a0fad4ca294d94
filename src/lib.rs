/*!
 * Cohort Synchronization Primitives
 * NUMA-aware hierarchical exclusive locks and a reader-writer fairness layer
 */

pub mod backoff;
pub mod cohort;
pub mod config;
pub mod rwlock;
pub mod topology;
pub mod traits;

// Re-exports
pub use backoff::{Backoff, BackoffPolicy};
pub use cohort::{CohortLock, NodeToken, OsLock, SpinLock, DEFAULT_PASS_LIMIT};
pub use config::{RwConfig, DEFAULT_WAIT_LIMIT};
pub use rwlock::{CohortRwLock, ReadGuard, WriteGuard};
pub use topology::Topology;
pub use traits::{Exclusive, RawLock};
