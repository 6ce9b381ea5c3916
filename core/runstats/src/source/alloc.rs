//! Allocation counters.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static ALLOCATED: AtomicU64 = AtomicU64::new(0);
static TOTAL_ALLOCATED: AtomicU64 = AtomicU64::new(0);
static MALLOCS: AtomicU64 = AtomicU64::new(0);
static FREES: AtomicU64 = AtomicU64::new(0);
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// A global allocator that counts allocations, then forwards them to another allocator.
///
/// Install it with `#[global_allocator]` to get meaningful `mem.alloc`, `mem.total`,
/// `mem.malloc`, `mem.frees`, `mem.heap.*` gauges:
/// ```
/// use runstats::CountingAllocator;
///
/// #[global_allocator]
/// static ALLOC: CountingAllocator = CountingAllocator::system();
///
/// fn main() {
///     let v = vec![0u8; 64];
///     assert!(runstats::source::alloc::counters().allocated >= v.len() as u64);
/// }
/// ```
///
/// Without it, these gauges are always zero.
/// The counters are process-wide, there is one global allocator per process anyway.
#[derive(Debug, Default)]
pub struct CountingAllocator<A = System> {
    inner: A,
}

/// Values of the allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocCounters {
    /// Bytes currently allocated.
    pub allocated: u64,
    /// Bytes allocated since the start of the process.
    pub total_allocated: u64,
    pub mallocs: u64,
    pub frees: u64,
}

impl CountingAllocator<System> {
    /// Counts the allocations made with the system allocator.
    pub const fn system() -> Self {
        Self { inner: System }
    }
}

impl<A> CountingAllocator<A> {
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

/// Returns `true` if a [`CountingAllocator`] has served at least one allocation.
pub fn is_active() -> bool {
    ACTIVE.load(Ordering::Relaxed)
}

/// Reads the allocation counters.
///
/// The counters are read one after the other while other threads may allocate:
/// they are consistent with each other only up to the allocations that happen during the read.
pub fn counters() -> AllocCounters {
    AllocCounters {
        allocated: ALLOCATED.load(Ordering::Relaxed),
        total_allocated: TOTAL_ALLOCATED.load(Ordering::Relaxed),
        mallocs: MALLOCS.load(Ordering::Relaxed),
        frees: FREES.load(Ordering::Relaxed),
    }
}

fn on_alloc(size: usize) {
    let size = size as u64;
    ALLOCATED.fetch_add(size, Ordering::Relaxed);
    TOTAL_ALLOCATED.fetch_add(size, Ordering::Relaxed);
    MALLOCS.fetch_add(1, Ordering::Relaxed);
    if !ACTIVE.load(Ordering::Relaxed) {
        ACTIVE.store(true, Ordering::Relaxed);
    }
}

fn on_dealloc(size: usize) {
    ALLOCATED.fetch_sub(size as u64, Ordering::Relaxed);
    FREES.fetch_add(1, Ordering::Relaxed);
}

fn on_realloc(old_size: usize, new_size: usize) {
    if new_size >= old_size {
        let grown = (new_size - old_size) as u64;
        ALLOCATED.fetch_add(grown, Ordering::Relaxed);
        TOTAL_ALLOCATED.fetch_add(grown, Ordering::Relaxed);
    } else {
        ALLOCATED.fetch_sub((old_size - new_size) as u64, Ordering::Relaxed);
    }
}

// SAFETY: every call is forwarded to the inner allocator with the same arguments,
// the counters have no influence on the returned memory.
unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            on_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            on_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { self.inner.dealloc(ptr, layout) };
        on_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            on_realloc(layout.size(), new_size);
        }
        new_ptr
    }
}
