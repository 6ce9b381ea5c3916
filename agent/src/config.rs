//! Agent configuration options.
//!
//! We use `serde` to parse these options from the TOML config file,
//! and to write the default configuration to the TOML config file,
//! therefore the structs derive [`serde::Deserialize`] and [`serde::Serialize`].

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Content of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default)]
    pub sampler: runstats::SamplerConfig,
    #[serde(default)]
    pub statsd: runstats_statsd::Config,
}

impl AgentConfig {
    /// Parses the content of a config file.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }
}

/// Returns the default configuration, serialized to TOML.
pub fn default_config_string() -> anyhow::Result<String> {
    toml::to_string_pretty(&AgentConfig::default()).context("could not serialize the default config")
}

/// Writes the default configuration to `path`, overwriting the file if it exists.
pub fn write_default(path: &Path) -> anyhow::Result<()> {
    let content = default_config_string()?;
    std::fs::write(path, content)
        .with_context(|| format!("could not write the default config to {}", path.display()))
}

/// Loads the configuration from `path`.
///
/// If the file does not exist and `generate_default` is true, the default
/// configuration is written to `path` and returned.
pub fn load(path: &Path, generate_default: bool) -> anyhow::Result<AgentConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => AgentConfig::parse(&content).with_context(|| format!("invalid config file {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && generate_default => {
            write_default(path)?;
            log::info!("Default configuration file written to: {}", path.display());
            Ok(AgentConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("could not read config file {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use runstats::MetricGroups;

    use super::{AgentConfig, default_config_string, load};

    #[test]
    fn default_roundtrip() {
        let s = default_config_string().unwrap();
        assert!(s.contains("interval = \"10s\""), "{s}");
        assert!(s.contains("address = \"localhost:8125\""), "{s}");
        assert_eq!(AgentConfig::parse(&s).unwrap(), AgentConfig::default());
    }

    #[test]
    fn partial_config() {
        let config = AgentConfig::parse(indoc! {r#"
            [sampler]
            interval = "250ms"

            [sampler.groups]
            gc = false

            [statsd]
            prefix = "myapp"
        "#})
        .unwrap();
        assert_eq!(config.sampler.interval, Duration::from_millis(250));
        assert_eq!(
            config.sampler.groups,
            MetricGroups {
                cpu: true,
                mem: true,
                gc: false
            }
        );
        assert_eq!(config.statsd.address, "localhost:8125");
        assert_eq!(config.statsd.prefix.as_deref(), Some("myapp"));
    }

    #[test]
    fn unknown_section() {
        let err = AgentConfig::parse("[plugins.rapl]\npoll_interval = \"1s\"").unwrap_err();
        assert!(format!("{err:#}").contains("plugins"), "{err:#}");
    }

    #[test]
    fn load_generates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runstats.toml");
        let config = load(&path, true).unwrap();
        assert_eq!(config, AgentConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), default_config_string().unwrap());

        // the second time, the file is read
        std::fs::write(&path, "[sampler]\ninterval = \"1s\"\n").unwrap();
        let config = load(&path, true).unwrap();
        assert_eq!(config.sampler.interval, Duration::from_secs(1));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = load(&path, false).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
        assert!(!path.exists());
    }
}
