//! Statistics of collection cycles.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::snapshot::{GcStats, last_pause_index};

/// Shared record of the collection cycles performed by the host program.
///
/// Rust has no garbage collector, but many programs run their own collection cycles:
/// arena compaction, epoch-based reclamation, cache eviction sweeps...
/// Such code reports each cycle with [`record_cycle`](Self::record_cycle), and the
/// sampler emits the result as `mem.gc.*` gauges.
///
/// `CollectorStats` is a cheap handle: clones refer to the same statistics.
///
/// ```
/// use std::time::Duration;
/// use runstats::CollectorStats;
///
/// let stats = CollectorStats::new();
/// stats.record_cycle(Duration::from_micros(350), 64 * 1024 * 1024);
/// assert_eq!(stats.snapshot().count, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CollectorStats {
    inner: Arc<Mutex<GcStats>>,
}

impl CollectorStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the end of a collection cycle that paused the program for `pause`.
    ///
    /// `next_threshold` is the size (in bytes) that will trigger the next cycle.
    pub fn record_cycle(&self, pause: Duration, next_threshold: u64) {
        let pause_ns = u64::try_from(pause.as_nanos()).unwrap_or(u64::MAX);
        let now_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        let mut stats = self.lock();
        stats.count = stats.count.wrapping_add(1);
        let i = last_pause_index(stats.count);
        stats.pause_ns[i] = pause_ns;
        stats.pause_total_ns = stats.pause_total_ns.saturating_add(pause_ns);
        stats.last_ns = now_ns;
        stats.next_threshold = next_threshold;
    }

    /// Sets the number of bytes used by the collector's own bookkeeping.
    pub fn set_sys_bytes(&self, bytes: u64) {
        self.lock().sys = bytes;
    }

    /// Returns a copy of the current statistics.
    pub fn snapshot(&self) -> GcStats {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, GcStats> {
        // The statistics are always left in a valid state, a panic elsewhere does not corrupt them.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::CollectorStats;
    use crate::snapshot::PAUSE_HISTORY_LEN;

    #[test]
    fn record_cycles() {
        let stats = CollectorStats::new();
        let shared = stats.clone();
        stats.record_cycle(Duration::from_nanos(100), 1000);
        shared.record_cycle(Duration::from_nanos(250), 2000);
        stats.set_sys_bytes(42);

        let gc = stats.snapshot();
        assert_eq!(gc.count, 2);
        assert_eq!(gc.pause_ns[0], 100);
        assert_eq!(gc.pause_ns[1], 250);
        assert_eq!(gc.last_pause_ns(), 250);
        assert_eq!(gc.pause_total_ns, 350);
        assert_eq!(gc.next_threshold, 2000);
        assert_eq!(gc.sys, 42);
        assert!(gc.last_ns > 0);
    }

    #[test]
    fn history_wraps_around() {
        let stats = CollectorStats::new();
        for i in 1..=(PAUSE_HISTORY_LEN as u64 + 3) {
            stats.record_cycle(Duration::from_nanos(i), 0);
        }
        let gc = stats.snapshot();
        assert_eq!(gc.count, PAUSE_HISTORY_LEN as u32 + 3);
        // cycles 257, 258 and 259 overwrote the first slots
        assert_eq!(&gc.pause_ns[..3], &[257, 258, 259]);
        assert_eq!(gc.pause_ns[3], 4);
        assert_eq!(gc.last_pause_ns(), 259);
    }
}
