//! Counter of foreign-function calls.
//!
//! Rust does not count the calls that cross an FFI boundary, the host program does it
//! by wrapping its foreign calls with [`foreign_call`] (or by calling [`record_foreign_call`]).

use std::sync::atomic::{AtomicU64, Ordering};

static FOREIGN_CALLS: AtomicU64 = AtomicU64::new(0);

/// Counts one call to a foreign function.
pub fn record_foreign_call() {
    FOREIGN_CALLS.fetch_add(1, Ordering::Relaxed);
}

/// Calls `f`, counting it as a foreign call.
///
/// ```
/// let pid = runstats::foreign_call(|| std::process::id());
/// ```
pub fn foreign_call<R>(f: impl FnOnce() -> R) -> R {
    record_foreign_call();
    f()
}

/// Number of foreign calls recorded since the start of the process.
pub fn foreign_calls() -> u64 {
    FOREIGN_CALLS.load(Ordering::Relaxed)
}
