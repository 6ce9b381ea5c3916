//! Sends runstats gauges to a statsd server, over UDP.
//!
//! Each gauge is sent in its own datagram, without waiting: if the socket is
//! not ready or the server is unreachable, the gauge is dropped.
//! Errors are only reported when connecting, which happens before the sampler starts.
//!
//! ```no_run
//! use runstats::Sampler;
//! use runstats_statsd::{Config, StatsdEmitter};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let emitter = StatsdEmitter::connect(&Config::default()).await?;
//! let sampler = Sampler::builder().emitter(emitter).build()?;
//! tokio::spawn(sampler.run());
//! # Ok(())
//! # }
//! ```

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};

use runstats::Emit;
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;

pub mod protocol;

/// Configuration of the statsd emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Address of the statsd server, as `host:port`.
    #[serde(default = "default_address")]
    pub address: String,

    /// Prefix of every gauge. Defaults to `rust.<hostname>`.
    pub prefix: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            prefix: None,
        }
    }
}

fn default_address() -> String {
    String::from("localhost:8125")
}

/// Error which can occur in [`StatsdEmitter::connect`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("could not resolve the statsd address {0}")]
    Resolve(String, #[source] io::Error),
    #[error("the statsd address {0} did not resolve to any socket address")]
    NoAddress(String),
    #[error("could not bind a local UDP socket")]
    Bind(#[source] io::Error),
    #[error("could not connect to the statsd server at {0}")]
    Connect(SocketAddr, #[source] io::Error),
    #[error("invalid prefix {0:?}: it must not contain whitespace or any of ':', '|', '@'")]
    InvalidPrefix(String),
}

/// Emits gauges to a statsd server.
#[derive(Debug)]
pub struct StatsdEmitter {
    socket: UdpSocket,
    prefix: String,
    server: SocketAddr,
    dropped: AtomicU64,
}

impl StatsdEmitter {
    /// Creates a UDP socket connected to the statsd server.
    ///
    /// The address is resolved once: if the server moves, the emitter must be recreated.
    pub async fn connect(config: &Config) -> Result<Self, ConnectError> {
        let prefix = match &config.prefix {
            Some(p) if protocol::is_valid_name(p) => p.to_owned(),
            Some(p) => return Err(ConnectError::InvalidPrefix(p.to_owned())),
            None => default_prefix(),
        };

        let server = tokio::net::lookup_host(&config.address)
            .await
            .map_err(|e| ConnectError::Resolve(config.address.clone(), e))?
            .next()
            .ok_or_else(|| ConnectError::NoAddress(config.address.clone()))?;

        let local: SocketAddr = match server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await.map_err(ConnectError::Bind)?;
        socket
            .connect(server)
            .await
            .map_err(|e| ConnectError::Connect(server, e))?;
        // Wait for the first readiness event, so that the first gauges are not dropped.
        socket
            .writable()
            .await
            .map_err(|e| ConnectError::Connect(server, e))?;

        log::info!("Sending gauges to statsd at {server} with the prefix '{prefix}'.");
        Ok(Self {
            socket,
            prefix,
            server,
            dropped: AtomicU64::new(0),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Number of gauges that could not be sent.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Emit for StatsdEmitter {
    fn emit(&self, key: &'static str, value: u64) {
        let line = protocol::gauge(&self.prefix, key, value);
        if let Err(e) = self.socket.try_send(line.as_bytes()) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::trace!("gauge {key} dropped: {e}");
        }
    }
}

/// Returns `rust.<hostname>`, or `rust.unknown` if the hostname is not available.
///
/// Dots in the hostname are replaced by underscores, so that the hostname is a
/// single level of the statsd hierarchy.
pub fn default_prefix() -> String {
    match hostname::get() {
        Ok(name) => format!("rust.{}", protocol::sanitize_segment(&name.to_string_lossy())),
        Err(e) => {
            log::warn!("Unable to retrieve the hostname, using 'rust.unknown' as the statsd prefix: {e}");
            String::from("rust.unknown")
        }
    }
}
