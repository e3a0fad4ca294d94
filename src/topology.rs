/*!
 * Hardware Topology Probe
 *
 * CPU-topology-aware sizing for the cohort lock's per-node slot array.
 * Scales from embedded devices (1-4 cores) to multi-socket servers without
 * OS-specific NUMA queries.
 *
 * # Design: Pure Functions Over Singleton
 *
 * `available_parallelism` is already cached by the standard library, so
 * plain `#[inline]` functions beat a singleton: calls constant-fold and
 * inline into call sites with no synchronization of their own.
 */

/// Hardware-aware cohort sizing (pure functions).
pub struct Topology;

/// Cores covered by one cohort node slot. Approximates socket granularity
/// without OS topology queries.
const CORES_PER_NODE: usize = 8;

impl Topology {
    /// Get CPU count.
    ///
    /// Repeated calls are O(1); the stdlib caches the probe.
    #[inline]
    pub fn cpu_count() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or_else(|_| {
                // Fallback: reasonable default for unknown systems
                log::warn!("Failed to detect CPU count, defaulting to 8");
                8
            })
    }

    /// Get cache line size for padding calculations.
    ///
    /// Most modern architectures use 64-byte cache lines (x86-64, ARM64,
    /// RISC-V).
    #[inline(always)]
    pub const fn cache_line_size() -> usize {
        64
    }

    /// Default cohort node count for this machine.
    ///
    /// One slot per [`CORES_PER_NODE`] cores, rounded up to a power of two
    /// so thread-to-node assignment is a bitwise AND. Clamped: a single
    /// slot degenerates gracefully to a flat lock on small machines, and
    /// slot counts past 64 stop paying for themselves.
    #[inline]
    pub fn node_count() -> usize {
        let nodes = (Self::cpu_count() + CORES_PER_NODE - 1) / CORES_PER_NODE;
        nodes.next_power_of_two().clamp(1, 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_count_bounds() {
        let nodes = Topology::node_count();
        assert!(nodes.is_power_of_two(), "Node count must be power of 2");
        assert!((1..=64).contains(&nodes));
    }

    #[test]
    fn test_probe_consistency() {
        // Repeated probes must agree; lock sizing depends on it
        assert_eq!(Topology::cpu_count(), Topology::cpu_count());
        assert_eq!(Topology::node_count(), Topology::node_count());
    }

    #[test]
    fn test_cache_line_size() {
        assert_eq!(Topology::cache_line_size(), 64);
    }
}
