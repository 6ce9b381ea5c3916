//! RUNSTATS: the running process, reported as gauges.
//!
//! This crate samples the resource counters of the current process
//! (async tasks, allocator statistics, memory mappings, collection pauses)
//! and emits each of them as a gauge, at regular intervals.
//!
//! # Overview
//! The work is split between three pieces:
//! 1. A [`CounterSource`](source::CounterSource) reads the counters and returns immutable snapshots.
//! 2. The [`Sampler`] decides when to sample and which groups of gauges to produce.
//! 3. An [`Emit`] implementation delivers each `(key, value)` pair, on a best-effort basis.
//!
//! The emitter used in production is a statsd client (see the `runstats-statsd` crate),
//! but any function `Fn(&'static str, u64)` can be turned into one with [`emit::from_fn`].
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use runstats::{Sampler, emit};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let sampler = Sampler::builder()
//!     .interval(Duration::from_secs(5))
//!     .emitter(emit::from_fn(|key, value| println!("{key} = {value}")))
//!     .build()?;
//!
//! // Stop the sampler after one minute.
//! let shutdown = sampler.shutdown_token();
//! let task = tokio::spawn(sampler.run());
//! tokio::time::sleep(Duration::from_secs(60)).await;
//! shutdown.cancel();
//!
//! // Wait for the final pass, which resets every gauge to zero.
//! task.await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod emit;
pub mod keys;
pub mod sampler;
pub mod snapshot;
pub mod source;

#[cfg(any(test, feature = "test"))]
pub mod test;

pub use config::{MetricGroups, SamplerConfig};
pub use emit::Emit;
pub use sampler::{BuildError, Sampler, SamplerBuilder};
pub use source::alloc::CountingAllocator;
pub use source::collector::CollectorStats;
pub use source::foreign::{foreign_call, record_foreign_call};
pub use source::{CounterSource, ProcessCounters};
