//! Testing utilities.
//!
//! # Feature Flag
//!
//! To use this module, you need to enable the `test` feature of runstats.
//! Since you only need it for testing, the feature should only be enabled in `dev-dependencies`.
//!
//! Extract of `Cargo.toml`:
//! ```toml
//! [dependencies]
//! runstats = "version"
//!
//! [dev-dependencies]
//! runstats = {version = "version", features = ["test"]}
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;

use crate::emit::Emit;
use crate::snapshot::{AllocStats, Concurrency, GcStats, HeapStats, MemStats, PAUSE_HISTORY_LEN, StackStats};
use crate::source::CounterSource;

/// An emitter that keeps every gauge in memory, in order.
///
/// Clones share the same records: give a clone to the sampler and inspect the original.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    gauges: Arc<Mutex<Vec<(&'static str, u64)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(key, value)` emitted so far.
    pub fn gauges(&self) -> Vec<(&'static str, u64)> {
        self.lock().clone()
    }

    /// Returns the keys emitted so far, with repetitions.
    pub fn keys(&self) -> Vec<&'static str> {
        self.lock().iter().map(|(k, _)| *k).collect()
    }

    /// Returns the successive values of `key`.
    pub fn values(&self, key: &str) -> Vec<u64> {
        self.lock().iter().filter(|(k, _)| *k == key).map(|(_, v)| *v).collect()
    }

    /// Returns the number of times that `key` has been emitted.
    pub fn count(&self, key: &str) -> usize {
        self.lock().iter().filter(|(k, _)| *k == key).count()
    }

    /// Returns the total number of gauges emitted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(&'static str, u64)>> {
        self.gauges.lock().unwrap()
    }
}

impl Emit for Recorder {
    fn emit(&self, key: &'static str, value: u64) {
        self.lock().push((key, value));
    }
}

/// A source that always returns the same counters.
#[derive(Debug, Clone, Default)]
pub struct FixedSource {
    pub concurrency: Concurrency,
    /// The memory counters, or `None` to make [`CounterSource::memory`] fail.
    pub memory: Option<MemStats>,
}

impl FixedSource {
    pub fn new(concurrency: Concurrency, memory: MemStats) -> Self {
        Self {
            concurrency,
            memory: Some(memory),
        }
    }

    /// A source in which every counter is different from zero.
    pub fn nonzero() -> Self {
        let mut pause_ns = [0; PAUSE_HISTORY_LEN];
        for (i, p) in pause_ns.iter_mut().enumerate() {
            *p = 1_000 + i as u64;
        }
        let memory = MemStats {
            general: AllocStats {
                alloc: 1 << 20,
                total_alloc: 1 << 24,
                sys: 1 << 26,
                lookups: 3,
                mallocs: 5_000,
                frees: 4_000,
            },
            heap: HeapStats {
                alloc: 1 << 20,
                sys: 1 << 22,
                idle: 3 << 20,
                inuse: 1 << 20,
                released: 4096,
                objects: 1_000,
            },
            stack: StackStats {
                inuse: 1 << 16,
                sys: 1 << 17,
                span_inuse: 640,
                span_sys: 16384,
                cache_inuse: 320,
                cache_sys: 16384,
                other_sys: 1 << 21,
            },
            gc: GcStats {
                sys: 1 << 18,
                next_threshold: 1 << 23,
                last_ns: 1_700_000_000_000_000_000,
                pause_total_ns: 9_000_000,
                pause_ns,
                // last pause at index (300 - 1) % 256 = 43
                count: 300,
            },
        };
        let concurrency = Concurrency {
            tasks: 7,
            foreign_calls: 42,
        };
        Self::new(concurrency, memory)
    }

    /// A source whose memory counters cannot be read.
    pub fn failing_memory() -> Self {
        Self {
            concurrency: Concurrency {
                tasks: 1,
                foreign_calls: 0,
            },
            memory: None,
        }
    }
}

impl CounterSource for FixedSource {
    fn concurrency(&mut self) -> Concurrency {
        self.concurrency
    }

    fn memory(&mut self) -> anyhow::Result<MemStats> {
        self.memory.clone().ok_or_else(|| anyhow!("memory counters are not available"))
    }
}
