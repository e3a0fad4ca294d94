/*!
 * Cohort Lock
 *
 * NUMA-hierarchical exclusive lock. A global raw lock is fronted by one
 * local raw lock per node; a holder releasing while same-node threads are
 * queued keeps the global lock and hands exclusive access off through the
 * local lock alone. The lock and its protected data stay in the node's
 * cache across the whole chain.
 *
 * A hand-off chain is bounded by `pass_limit` so remote nodes cannot be
 * starved: after that many consecutive local passes the global lock is
 * released and the next acquisition goes through global arbitration.
 */

use crate::topology::Topology;
use crate::traits::{Exclusive, RawLock};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Maximum consecutive local hand-offs before a forced global release.
pub const DEFAULT_PASS_LIMIT: u32 = 10;

/// The global lock was released; the next local holder must reacquire it.
const RELEASE_GLOBAL: u32 = 0;
/// The global lock was retained for a queued same-node thread.
const RELEASE_LOCAL: u32 = 1;

/// A thread's node assignment; the per-thread context for every
/// acquire/release on one [`CohortLock`].
///
/// Tokens are only meaningful for the lock that issued them; the pairing is
/// not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeToken(usize);

impl NodeToken {
    /// Index of the node this token binds to.
    #[inline]
    pub const fn node(&self) -> usize {
        self.0
    }
}

/// Per-node slot.
#[repr(C, align(64))] // One cache line per node; slots never share
struct NodeState<L> {
    local: L,
    /// Threads queued on `local`. Incremented before the local acquisition
    /// attempt, decremented once it succeeds.
    waiting: AtomicU32,
    /// `RELEASE_GLOBAL` or `RELEASE_LOCAL`; written by the releasing holder,
    /// read by the next local holder.
    release_state: AtomicU32,
    /// Consecutive local hand-offs; only ever touched by the current holder.
    pass_count: AtomicU32,
}

impl<L: RawLock> NodeState<L> {
    fn new() -> Self {
        Self {
            local: L::INIT,
            waiting: AtomicU32::new(0),
            release_state: AtomicU32::new(RELEASE_GLOBAL),
            pass_count: AtomicU32::new(0),
        }
    }
}

/// NUMA-hierarchical exclusive lock over pluggable raw locks.
///
/// Implements [`Exclusive`], the interface the reader-writer layer
/// consumes; it can equally be used on its own wherever a scalable mutex is
/// needed.
///
/// # Examples
///
/// ```
/// use cohort_sync::{CohortLock, Exclusive, SpinLock};
///
/// let lock: CohortLock<SpinLock> = CohortLock::new();
/// let token = lock.assign_token();
///
/// lock.acquire(&token);
/// assert!(lock.is_locked());
/// lock.release(&token);
/// ```
pub struct CohortLock<L> {
    global: L,
    nodes: Box<[NodeState<L>]>,
    pass_limit: u32,
    next_token: AtomicUsize,
}

impl<L: RawLock> CohortLock<L> {
    /// Cohort sized for this machine's topology with the default pass
    /// limit.
    pub fn new() -> Self {
        Self::with_nodes(Topology::node_count(), DEFAULT_PASS_LIMIT)
    }

    /// Cohort with an explicit node count and hand-off bound.
    ///
    /// The node count is rounded up to a power of two so token assignment
    /// reduces to a mask.
    pub fn with_nodes(nodes: usize, pass_limit: u32) -> Self {
        let count = nodes.max(1).next_power_of_two();
        Self {
            global: L::INIT,
            nodes: (0..count).map(|_| NodeState::new()).collect(),
            pass_limit,
            next_token: AtomicUsize::new(0),
        }
    }

    /// Number of node slots.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Configured hand-off bound.
    #[inline]
    pub const fn pass_limit(&self) -> u32 {
        self.pass_limit
    }

    /// Token for a caller that knows its node; out-of-range ids wrap.
    #[inline]
    pub fn token(&self, node: usize) -> NodeToken {
        NodeToken(node & (self.nodes.len() - 1))
    }

    /// Round-robin token for callers without placement information.
    ///
    /// Threads pinned to a NUMA node should use [`token`](Self::token) with
    /// their real node id instead; round-robin only balances slot load.
    #[inline]
    pub fn assign_token(&self) -> NodeToken {
        self.token(self.next_token.fetch_add(1, Ordering::Relaxed))
    }
}

impl<L: RawLock> Default for CohortLock<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: RawLock> Exclusive for CohortLock<L> {
    type Token = NodeToken;

    fn acquire(&self, token: &NodeToken) {
        let node = &self.nodes[token.0];

        node.waiting.fetch_add(1, Ordering::Relaxed);
        node.local.lock();
        node.waiting.fetch_sub(1, Ordering::Relaxed);

        if node.release_state.load(Ordering::Acquire) == RELEASE_GLOBAL {
            self.global.lock();
        }
        // RELEASE_LOCAL: the previous holder on this node kept the global
        // lock; ownership transferred with the local lock.
    }

    fn release(&self, token: &NodeToken) {
        let node = &self.nodes[token.0];

        // A thread counted in `waiting` is committed to acquiring the local
        // lock, so handing off locally cannot strand the global lock.
        if node.waiting.load(Ordering::Acquire) > 0
            && node.pass_count.load(Ordering::Relaxed) < self.pass_limit
        {
            node.pass_count.fetch_add(1, Ordering::Relaxed);
            node.release_state.store(RELEASE_LOCAL, Ordering::Release);
        } else {
            node.pass_count.store(0, Ordering::Relaxed);
            node.release_state.store(RELEASE_GLOBAL, Ordering::Release);
            self.global.unlock();
        }

        node.local.unlock();
    }

    /// Held for the entire span of a hand-off chain: the global lock is
    /// only released when the chain ends.
    #[inline]
    fn is_locked(&self) -> bool {
        self.global.is_locked()
    }
}
