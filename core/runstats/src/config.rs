//! Sampler configuration.
//!
//! The configuration is deserialized with `serde`, for instance from the TOML
//! file of an agent. Durations use the human-friendly format of `humantime`, e.g. `"10s"`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default time between two passes.
///
/// Gauges are snapshots, not aggregations: the interval should be shorter than the
/// flush period of the statsd server, so that each flush gets a recent value.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Settings of a [`Sampler`](crate::Sampler).
///
/// It cannot be modified once the sampler has been built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    /// Time between two passes.
    #[serde(with = "humantime_serde", default = "default_interval")]
    pub interval: Duration,

    /// Which groups of gauges to emit.
    #[serde(default)]
    pub groups: MetricGroups,
}

/// The groups of gauges that can be enabled or disabled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricGroups {
    /// `cpu.*`: number of tasks and foreign calls.
    #[serde(default = "default_enabled")]
    pub cpu: bool,

    /// `mem.*`: allocator, heap and stack statistics.
    #[serde(default = "default_enabled")]
    pub mem: bool,

    /// `mem.gc.*`: collection statistics. Ignored if `mem` is disabled.
    #[serde(default = "default_enabled")]
    pub gc: bool,
}

impl MetricGroups {
    /// Every group is enabled.
    pub const ALL: MetricGroups = MetricGroups {
        cpu: true,
        mem: true,
        gc: true,
    };

    /// Returns `true` if the `mem.gc.*` gauges will be emitted,
    /// which requires both `mem` and `gc`.
    pub fn gc_effective(&self) -> bool {
        self.mem && self.gc
    }

    /// Returns `true` if no gauge will be emitted.
    pub fn is_empty(&self) -> bool {
        !self.cpu && !self.mem
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            groups: MetricGroups::default(),
        }
    }
}

impl Default for MetricGroups {
    fn default() -> Self {
        Self::ALL
    }
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_enabled() -> bool {
    true
}
