//! Names of the gauges.
//!
//! These names are part of the public interface: dashboards refer to them,
//! they must not change between versions. The emitter adds its own prefix.

// concurrency
pub const CPU_GOROUTINES: &str = "cpu.goroutines";
pub const CPU_CGO_CALLS: &str = "cpu.cgo_calls";

// allocator, general
pub const MEM_ALLOC: &str = "mem.alloc";
pub const MEM_TOTAL: &str = "mem.total";
pub const MEM_SYS: &str = "mem.sys";
pub const MEM_LOOKUPS: &str = "mem.lookups";
pub const MEM_MALLOC: &str = "mem.malloc";
pub const MEM_FREES: &str = "mem.frees";

// heap
pub const MEM_HEAP_ALLOC: &str = "mem.heap.alloc";
pub const MEM_HEAP_SYS: &str = "mem.heap.sys";
pub const MEM_HEAP_IDLE: &str = "mem.heap.idle";
pub const MEM_HEAP_INUSE: &str = "mem.heap.inuse";
pub const MEM_HEAP_RELEASED: &str = "mem.heap.released";
pub const MEM_HEAP_OBJECTS: &str = "mem.heap.objects";

// stack and allocator metadata
pub const MEM_STACK_INUSE: &str = "mem.stack.inuse";
pub const MEM_STACK_SYS: &str = "mem.stack.sys";
pub const MEM_STACK_MSPAN_INUSE: &str = "mem.stack.mspan_inuse";
pub const MEM_STACK_MSPAN_SYS: &str = "mem.stack.mspan_sys";
pub const MEM_STACK_MCACHE_INUSE: &str = "mem.stack.mcache_inuse";
pub const MEM_STACK_MCACHE_SYS: &str = "mem.stack.mcache_sys";
pub const MEM_OTHERSYS: &str = "mem.othersys";

// collector
pub const MEM_GC_SYS: &str = "mem.gc.sys";
pub const MEM_GC_NEXT: &str = "mem.gc.next";
pub const MEM_GC_LAST: &str = "mem.gc.last";
pub const MEM_GC_PAUSE_TOTAL: &str = "mem.gc.pause_total";
pub const MEM_GC_PAUSE: &str = "mem.gc.pause";
pub const MEM_GC_COUNT: &str = "mem.gc.count";

/// Gauges of the `cpu` group, in emission order.
pub const CPU_KEYS: [&str; 2] = [CPU_GOROUTINES, CPU_CGO_CALLS];

/// Gauges of the `mem` group (without the collector), in emission order.
pub const MEM_KEYS: [&str; 19] = [
    MEM_ALLOC,
    MEM_TOTAL,
    MEM_SYS,
    MEM_LOOKUPS,
    MEM_MALLOC,
    MEM_FREES,
    MEM_HEAP_ALLOC,
    MEM_HEAP_SYS,
    MEM_HEAP_IDLE,
    MEM_HEAP_INUSE,
    MEM_HEAP_RELEASED,
    MEM_HEAP_OBJECTS,
    MEM_STACK_INUSE,
    MEM_STACK_SYS,
    MEM_STACK_MSPAN_INUSE,
    MEM_STACK_MSPAN_SYS,
    MEM_STACK_MCACHE_INUSE,
    MEM_STACK_MCACHE_SYS,
    MEM_OTHERSYS,
];

/// Gauges of the `gc` group, in emission order.
pub const GC_KEYS: [&str; 6] = [
    MEM_GC_SYS,
    MEM_GC_NEXT,
    MEM_GC_LAST,
    MEM_GC_PAUSE_TOTAL,
    MEM_GC_PAUSE,
    MEM_GC_COUNT,
];
