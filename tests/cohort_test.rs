/*!
 * Cohort Lock Integration Tests
 *
 * Hierarchical exclusion across nodes and raw-lock flavors
 */

use cohort_sync::{CohortLock, Exclusive, OsLock, SpinLock, Topology};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

#[test]
fn test_exclusion_across_nodes() {
    let lock: CohortLock<SpinLock> = CohortLock::with_nodes(4, 4);
    let in_section = AtomicBool::new(false);
    let counter = AtomicU64::new(0);

    thread::scope(|s| {
        for node in 0..4usize {
            for _ in 0..2 {
                let (lock, in_section, counter) = (&lock, &in_section, &counter);
                s.spawn(move || {
                    let token = lock.token(node);
                    for _ in 0..500 {
                        lock.acquire(&token);
                        assert!(
                            !in_section.swap(true, Ordering::SeqCst),
                            "two holders inside the critical section"
                        );
                        let v = counter.load(Ordering::Relaxed);
                        counter.store(v + 1, Ordering::Relaxed);
                        in_section.store(false, Ordering::SeqCst);
                        lock.release(&token);
                    }
                });
            }
        }
    });

    assert_eq!(counter.load(Ordering::Relaxed), 4 * 2 * 500);
    assert!(!lock.is_locked());
}

#[test]
fn test_os_lock_flavor() {
    let lock: CohortLock<OsLock> = CohortLock::with_nodes(2, 4);
    let counter = AtomicU64::new(0);

    thread::scope(|s| {
        for i in 0..4usize {
            let (lock, counter) = (&lock, &counter);
            s.spawn(move || {
                let token = lock.token(i);
                for _ in 0..500 {
                    lock.acquire(&token);
                    let v = counter.load(Ordering::Relaxed);
                    counter.store(v + 1, Ordering::Relaxed);
                    lock.release(&token);
                }
            });
        }
    });

    assert_eq!(counter.load(Ordering::Relaxed), 2_000);
}

#[test]
fn test_topology_sized_default() {
    let lock: CohortLock<SpinLock> = CohortLock::new();
    assert_eq!(lock.node_count(), Topology::node_count());
    assert_eq!(lock.pass_limit(), cohort_sync::DEFAULT_PASS_LIMIT);
}
