//! The sampling loop.
//!
//! A [`Sampler`] runs passes: one immediately, then one per interval, until its
//! shutdown token is cancelled. Each pass reads the counters of the enabled groups
//! and emits them as gauges. When it stops, the sampler runs a last pass in which
//! every gauge is set to zero, so that dashboards showing the last known value of
//! a gauge do not display a stale number forever.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{DEFAULT_INTERVAL, MetricGroups, SamplerConfig};
use crate::emit::Emit;
use crate::keys;
use crate::snapshot::{Concurrency, GcStats, MemStats};
use crate::source::{CounterSource, ProcessCounters};

/// Periodically samples the process counters and emits them as gauges.
///
/// Build it with [`Sampler::builder`], then `await` [`Sampler::run`] (usually in a dedicated task).
pub struct Sampler {
    config: SamplerConfig,
    source: Box<dyn CounterSource>,
    emitter: Box<dyn Emit>,
    shutdown: CancellationToken,
}

/// Builder for [`Sampler`].
pub struct SamplerBuilder {
    config: SamplerConfig,
    source: Option<Box<dyn CounterSource>>,
    emitter: Option<Box<dyn Emit>>,
    shutdown: Option<CancellationToken>,
}

/// Error which can occur in [`SamplerBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("the sampler has no emitter, call SamplerBuilder::emitter before building it")]
    MissingEmitter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// Emits the current value of the counters.
    Live,
    /// Emits zero for every gauge, without reading the counters.
    Zeroed,
}

impl Sampler {
    /// Creates a new builder with the default configuration and no emitter.
    pub fn builder() -> SamplerBuilder {
        SamplerBuilder {
            config: SamplerConfig::default(),
            source: None,
            emitter: None,
            shutdown: None,
        }
    }

    /// Returns the token that stops the sampler when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Runs the sampler until the shutdown token is cancelled.
    ///
    /// The first pass happens immediately, the next ones at every interval.
    /// A pass is never interrupted: cancellation is observed between two passes,
    /// after which the zeroing pass runs and this function returns.
    pub async fn run(mut self) {
        let interval = self.config.interval;
        let shutdown = self.shutdown.clone();
        log::info!(
            "Sampler started with interval {interval:?} and groups {}",
            describe_groups(&self.config.groups)
        );

        self.pass(Pass::Live);
        let mut passes = 1u64;

        // The first pass has already been done, the next one is in one interval.
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.pass(Pass::Live);
                    passes += 1;
                }
            }
        }

        log::debug!("Sampler cancelled after {passes} passes, resetting the gauges to zero.");
        self.pass(Pass::Zeroed);
        log::info!("Sampler stopped.");
    }

    fn pass(&mut self, pass: Pass) {
        log::trace!("sampler pass: {pass:?}");
        let groups = self.config.groups;
        let emitter = &*self.emitter;

        if groups.cpu {
            let concurrency = match pass {
                Pass::Live => self.source.concurrency(),
                Pass::Zeroed => Concurrency::default(),
            };
            emit_concurrency(emitter, &concurrency);
        }

        if groups.mem {
            let mem = match pass {
                Pass::Live => match self.source.memory() {
                    Ok(mem) => mem,
                    Err(e) => {
                        log::warn!("Could not read the memory counters, skipping the mem.* gauges for this pass: {e:#}");
                        return;
                    }
                },
                Pass::Zeroed => MemStats::default(),
            };
            emit_memory(emitter, &mem);
            if groups.gc {
                emit_gc(emitter, &mem.gc);
            }
        }
    }
}

impl SamplerBuilder {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: SamplerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the time between two passes.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Sets the groups of gauges to emit.
    pub fn groups(mut self, groups: MetricGroups) -> Self {
        self.config.groups = groups;
        self
    }

    /// Sets the source of the counters. Defaults to [`ProcessCounters`].
    pub fn source(mut self, source: impl CounterSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Sets the destination of the gauges. Required.
    pub fn emitter(mut self, emitter: impl Emit + 'static) -> Self {
        self.emitter = Some(Box::new(emitter));
        self
    }

    /// Sets the token that stops the sampler. Defaults to a new token,
    /// which can be obtained with [`Sampler::shutdown_token`].
    pub fn shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub fn build(self) -> Result<Sampler, BuildError> {
        let emitter = self.emitter.ok_or(BuildError::MissingEmitter)?;
        let mut config = self.config;
        if config.interval.is_zero() {
            log::warn!("The sampling interval cannot be zero, using the default interval {DEFAULT_INTERVAL:?} instead.");
            config.interval = DEFAULT_INTERVAL;
        }
        if config.groups.is_empty() {
            log::warn!("Every group of gauges is disabled, the sampler will not emit anything.");
        } else if config.groups.gc && !config.groups.mem {
            log::debug!("The gc group requires the mem group, mem.gc.* gauges will not be emitted.");
        }
        Ok(Sampler {
            config,
            source: self.source.unwrap_or_else(|| Box::new(ProcessCounters::new())),
            emitter,
            shutdown: self.shutdown.unwrap_or_default(),
        })
    }
}

fn emit_concurrency(e: &dyn Emit, c: &Concurrency) {
    e.emit(keys::CPU_GOROUTINES, c.tasks);
    e.emit(keys::CPU_CGO_CALLS, c.foreign_calls);
}

fn emit_memory(e: &dyn Emit, m: &MemStats) {
    // General
    e.emit(keys::MEM_ALLOC, m.general.alloc);
    e.emit(keys::MEM_TOTAL, m.general.total_alloc);
    e.emit(keys::MEM_SYS, m.general.sys);
    e.emit(keys::MEM_LOOKUPS, m.general.lookups);
    e.emit(keys::MEM_MALLOC, m.general.mallocs);
    e.emit(keys::MEM_FREES, m.general.frees);

    // Heap
    e.emit(keys::MEM_HEAP_ALLOC, m.heap.alloc);
    e.emit(keys::MEM_HEAP_SYS, m.heap.sys);
    e.emit(keys::MEM_HEAP_IDLE, m.heap.idle);
    e.emit(keys::MEM_HEAP_INUSE, m.heap.inuse);
    e.emit(keys::MEM_HEAP_RELEASED, m.heap.released);
    e.emit(keys::MEM_HEAP_OBJECTS, m.heap.objects);

    // Stack
    e.emit(keys::MEM_STACK_INUSE, m.stack.inuse);
    e.emit(keys::MEM_STACK_SYS, m.stack.sys);
    e.emit(keys::MEM_STACK_MSPAN_INUSE, m.stack.span_inuse);
    e.emit(keys::MEM_STACK_MSPAN_SYS, m.stack.span_sys);
    e.emit(keys::MEM_STACK_MCACHE_INUSE, m.stack.cache_inuse);
    e.emit(keys::MEM_STACK_MCACHE_SYS, m.stack.cache_sys);

    e.emit(keys::MEM_OTHERSYS, m.stack.other_sys);
}

fn emit_gc(e: &dyn Emit, gc: &GcStats) {
    e.emit(keys::MEM_GC_SYS, gc.sys);
    e.emit(keys::MEM_GC_NEXT, gc.next_threshold);
    e.emit(keys::MEM_GC_LAST, gc.last_ns);
    e.emit(keys::MEM_GC_PAUSE_TOTAL, gc.pause_total_ns);
    e.emit(keys::MEM_GC_PAUSE, gc.last_pause_ns());
    e.emit(keys::MEM_GC_COUNT, u64::from(gc.count));
}

fn describe_groups(groups: &MetricGroups) -> String {
    let mut enabled = Vec::with_capacity(3);
    if groups.cpu {
        enabled.push("cpu");
    }
    if groups.mem {
        enabled.push("mem");
    }
    if groups.gc_effective() {
        enabled.push("gc");
    }
    if enabled.is_empty() {
        String::from("(none)")
    } else {
        enabled.join(",")
    }
}
