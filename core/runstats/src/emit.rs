//! Delivery of gauges.

use std::fmt;
use std::sync::Arc;

/// Delivers gauges to a metrics sink, on a best-effort basis.
///
/// `emit` is called by the sampler for every gauge of every pass.
/// It must not block: implementations that do I/O should send without waiting,
/// and drop the value if the sink is not ready.
/// Errors are never reported to the caller, a lost value is superseded by the next pass.
pub trait Emit: Send + Sync {
    /// Sets the gauge `key` to `value`.
    fn emit(&self, key: &'static str, value: u64);
}

/// Turns a function into an emitter.
///
/// ```
/// use runstats::{Emit, emit};
///
/// let print = emit::from_fn(|key, value| println!("{key}:{value}|g"));
/// print.emit("mem.alloc", 1024);
/// ```
pub fn from_fn<F>(f: F) -> FnEmitter<F>
where
    F: Fn(&'static str, u64) + Send + Sync,
{
    FnEmitter(f)
}

/// An emitter that calls a function, see [`from_fn`].
pub struct FnEmitter<F>(F);

impl<F> Emit for FnEmitter<F>
where
    F: Fn(&'static str, u64) + Send + Sync,
{
    fn emit(&self, key: &'static str, value: u64) {
        (self.0)(key, value)
    }
}

impl<F> fmt::Debug for FnEmitter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnEmitter")
    }
}

impl<E: Emit + ?Sized> Emit for Arc<E> {
    fn emit(&self, key: &'static str, value: u64) {
        (**self).emit(key, value)
    }
}

impl<E: Emit + ?Sized> Emit for Box<E> {
    fn emit(&self, key: &'static str, value: u64) {
        (**self).emit(key, value)
    }
}

impl<E: Emit + ?Sized> Emit for &E {
    fn emit(&self, key: &'static str, value: u64) {
        (**self).emit(key, value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{Emit, from_fn};

    #[test]
    fn function_emitter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let emitter: Box<dyn Emit> = Box::new(from_fn(move |k, v| seen2.lock().unwrap().push((k, v))));
        emitter.emit("cpu.goroutines", 3);
        (&emitter).emit("cpu.cgo_calls", 0);
        assert_eq!(*seen.lock().unwrap(), vec![("cpu.goroutines", 3), ("cpu.cgo_calls", 0)]);
    }
}
