/*!
 * Lock Traits
 *
 * Core abstractions for the exclusive locks the reader-writer layer is
 * built on, with zero-cost design.
 *
 * # Design: Generics Over Dynamic Dispatch
 *
 * The reader-writer coordinator is monomorphized over the concrete
 * exclusive-lock type. No vtable sits on the admission hot path; every
 * `acquire`/`is_locked` call inlines into the caller.
 */

/// Minimal exclusive lock used as a cohort building block.
///
/// Implementations must be:
/// - **Thread-safe**: safe to call from multiple threads
/// - **Const-constructible**: `INIT` allows composition into `static` items
///   and bulk allocation of per-node slots
///
/// `unlock` must only be called by the thread that holds the lock; the
/// contract is not checked.
pub trait RawLock: Send + Sync {
    /// Unlocked initial state.
    const INIT: Self;

    /// Block until the lock is held.
    fn lock(&self);

    /// Release the lock. Caller must hold it.
    fn unlock(&self);

    /// Non-blocking query: is the lock currently held by any thread?
    fn is_locked(&self) -> bool;
}

/// Exclusive-access primitive consumed by [`CohortRwLock`].
///
/// This is the seam between the reader-writer coordination layer and the
/// underlying mutual-exclusion machinery. The crate ships a NUMA-aware
/// [`CohortLock`], but any implementation can be substituted; the
/// coordinator only ever calls these three operations.
///
/// The lock instance itself carries all shared state; `Token` is the
/// per-thread acquisition context (a NUMA node assignment for the cohort
/// lock, `()` for flat locks). The same token must be passed to the
/// `release` matching an `acquire`; the contract is not checked.
///
/// # Implementation Notes
///
/// `acquire` may block under the implementation's own waiting policy.
/// `is_locked` must never block and must report true for the entire span
/// during which any thread holds exclusive access, including internal
/// hand-offs that never pass through an unlocked state.
///
/// [`CohortRwLock`]: crate::rwlock::CohortRwLock
/// [`CohortLock`]: crate::cohort::CohortLock
pub trait Exclusive: Send + Sync {
    /// Per-thread acquisition context.
    type Token;

    /// Block until exclusive access is held.
    fn acquire(&self, token: &Self::Token);

    /// Release exclusive access. Caller must hold it, with the same token.
    fn release(&self, token: &Self::Token);

    /// Non-blocking query: is exclusive access currently held?
    fn is_locked(&self) -> bool;
}
