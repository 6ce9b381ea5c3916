//! Snapshots of the process counters.
//!
//! A snapshot is captured at once by a [`CounterSource`](crate::source::CounterSource)
//! and is never modified afterwards. The [`Default`] value of each snapshot is
//! all zeros, which is what the sampler emits when it stops.

/// Capacity of the ring buffer of recent collection pauses.
pub const PAUSE_HISTORY_LEN: usize = 256;

/// Concurrency counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Concurrency {
    /// Number of live async tasks.
    pub tasks: u64,
    /// Cumulative number of calls that crossed a foreign-function boundary.
    pub foreign_calls: u64,
}

/// Memory counters, captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemStats {
    pub general: AllocStats,
    pub heap: HeapStats,
    pub stack: StackStats,
    pub gc: GcStats,
}

/// General allocator statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Bytes of allocated objects that have not been freed.
    pub alloc: u64,
    /// Cumulative bytes allocated, including freed objects.
    pub total_alloc: u64,
    /// Bytes obtained from the OS.
    pub sys: u64,
    /// Number of pointer lookups.
    pub lookups: u64,
    /// Cumulative number of allocations.
    pub mallocs: u64,
    /// Cumulative number of deallocations.
    pub frees: u64,
}

/// Heap statistics, in bytes unless specified otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub alloc: u64,
    pub sys: u64,
    pub idle: u64,
    pub inuse: u64,
    pub released: u64,
    /// Number of live objects.
    pub objects: u64,
}

/// Stack and allocator metadata, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackStats {
    pub inuse: u64,
    pub sys: u64,
    /// Span descriptors.
    pub span_inuse: u64,
    pub span_sys: u64,
    /// Per-thread caches.
    pub cache_inuse: u64,
    pub cache_sys: u64,
    /// Everything that is obtained from the OS but does not fit in another field.
    pub other_sys: u64,
}

/// Collection statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcStats {
    /// Bytes used by the collector itself.
    pub sys: u64,
    /// Size that triggers the next collection.
    pub next_threshold: u64,
    /// End of the last collection, in nanoseconds since the Unix epoch.
    pub last_ns: u64,
    /// Cumulative pause time, in nanoseconds.
    pub pause_total_ns: u64,
    /// Recent pause durations, in nanoseconds.
    ///
    /// The pause of collection number `n` (starting at 1) is stored
    /// at index `(n - 1) % PAUSE_HISTORY_LEN`.
    pub pause_ns: [u64; PAUSE_HISTORY_LEN],
    /// Number of completed collections.
    pub count: u32,
}

impl GcStats {
    /// Returns the duration of the most recent pause, in nanoseconds.
    pub fn last_pause_ns(&self) -> u64 {
        self.pause_ns[last_pause_index(self.count)]
    }
}

impl Default for GcStats {
    fn default() -> Self {
        Self {
            sys: 0,
            next_threshold: 0,
            last_ns: 0,
            pause_total_ns: 0,
            pause_ns: [0; PAUSE_HISTORY_LEN],
            count: 0,
        }
    }
}

/// Index of the most recent pause in the ring buffer, given the number of collections.
///
/// Computes `(count + PAUSE_HISTORY_LEN - 1) % PAUSE_HISTORY_LEN` in 64 bits,
/// which stays correct when `count` is a multiple of the capacity and when it is
/// close to `u32::MAX`.
pub fn last_pause_index(count: u32) -> usize {
    let len = PAUSE_HISTORY_LEN as u64;
    ((u64::from(count) + len - 1) % len) as usize
}
