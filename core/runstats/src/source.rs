//! Sources of counters.
//!
//! The [`Sampler`](crate::Sampler) reads the counters through the [`CounterSource`] trait.
//! [`ProcessCounters`] is the default implementation, it combines:
//! - the task count of the current tokio runtime;
//! - the [foreign calls](foreign) recorded by the host program;
//! - the [allocation counters](alloc), if the [`CountingAllocator`](alloc::CountingAllocator) is installed;
//! - the [memory mappings](os) reported by the OS (Linux only, zeros elsewhere);
//! - the [collection cycles](collector) recorded by the host program, if any.

use crate::snapshot::{AllocStats, Concurrency, GcStats, HeapStats, MemStats, StackStats};

pub mod alloc;
pub mod collector;
pub mod foreign;
pub mod os;

/// Provides snapshots of the process counters.
pub trait CounterSource: Send {
    /// Reads the concurrency counters. This cannot fail.
    fn concurrency(&mut self) -> Concurrency;

    /// Captures the memory counters, at once.
    ///
    /// An error means that no snapshot could be captured this time.
    /// The sampler skips the memory gauges for the current pass and tries again at the next one.
    fn memory(&mut self) -> anyhow::Result<MemStats>;
}

impl<S: CounterSource + ?Sized> CounterSource for Box<S> {
    fn concurrency(&mut self) -> Concurrency {
        (**self).concurrency()
    }

    fn memory(&mut self) -> anyhow::Result<MemStats> {
        (**self).memory()
    }
}

/// Reads the counters of the current process.
#[derive(Default)]
pub struct ProcessCounters {
    os: os::OsMemoryReader,
    collector: Option<collector::CollectorStats>,
}

impl ProcessCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports the collection cycles recorded in `stats` as `mem.gc.*` gauges.
    pub fn with_collector(mut self, stats: collector::CollectorStats) -> Self {
        self.collector = Some(stats);
        self
    }
}

impl CounterSource for ProcessCounters {
    fn concurrency(&mut self) -> Concurrency {
        let tasks = tokio::runtime::Handle::try_current()
            .map(|rt| rt.metrics().num_alive_tasks() as u64)
            .unwrap_or(0);
        Concurrency {
            tasks,
            foreign_calls: foreign::foreign_calls(),
        }
    }

    fn memory(&mut self) -> anyhow::Result<MemStats> {
        let os = self.os.read()?;
        let allocs = alloc::counters();
        let gc = match &self.collector {
            Some(stats) => stats.snapshot(),
            None => GcStats::default(),
        };
        Ok(combine(os, allocs, gc))
    }
}

/// Maps the raw counters to the fields of the snapshot.
///
/// The system allocator does not expose its internal structures: lookups,
/// released pages, spans and per-thread caches are reported as zero.
fn combine(os: os::OsMemory, allocs: alloc::AllocCounters, gc: GcStats) -> MemStats {
    let heap_sys = os.data.max(allocs.allocated);
    let stack_sys = os.stack;
    let sys = os.virt.max(heap_sys.saturating_add(stack_sys));
    MemStats {
        general: AllocStats {
            alloc: allocs.allocated,
            total_alloc: allocs.total_allocated,
            sys,
            lookups: 0,
            mallocs: allocs.mallocs,
            frees: allocs.frees,
        },
        heap: HeapStats {
            alloc: allocs.allocated,
            sys: heap_sys,
            idle: heap_sys - allocs.allocated,
            inuse: allocs.allocated,
            released: 0,
            objects: allocs.mallocs.saturating_sub(allocs.frees),
        },
        stack: StackStats {
            inuse: stack_sys,
            sys: stack_sys,
            span_inuse: 0,
            span_sys: 0,
            cache_inuse: 0,
            cache_sys: 0,
            other_sys: sys.saturating_sub(heap_sys).saturating_sub(stack_sys),
        },
        gc,
    }
}
