//! Cheap connectivity check gating network-dependent steps.
//!
//! A single bare TCP connection attempt is the full contract: no
//! retries, no protocol handshake. Callers decide whether absence of
//! reachability should skip or defer a step, so a disconnected machine
//! degrades to "skip with warning" instead of hanging.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Well-known public resolver, reachable from any connected network.
pub const DEFAULT_PROBE_HOST: &str = "8.8.8.8";
pub const DEFAULT_PROBE_PORT: u16 = 53;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Answers "can we reach the network right now?".
///
/// Trait seam so the fetcher and steps can be exercised with a fixed
/// answer in tests.
pub trait Reachability {
    fn is_reachable(&self) -> bool;
}

/// Transport-layer probe against a fixed `(host, port)`.
#[derive(Clone, Debug)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        TcpProbe {
            host: host.into(),
            port,
            timeout,
        }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        TcpProbe::new(DEFAULT_PROBE_HOST, DEFAULT_PROBE_PORT, DEFAULT_PROBE_TIMEOUT)
    }
}

impl Reachability for TcpProbe {
    fn is_reachable(&self) -> bool {
        is_reachable(&self.host, self.port, self.timeout)
    }
}

/// Attempt one TCP connection to `(host, port)` within `timeout`.
///
/// Returns false on resolution failure, connection error, or timeout.
pub fn is_reachable(host: &str, port: u16, timeout: Duration) -> bool {
    let addrs = match (host, port).to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            log::debug!("Could not resolve {}:{}: {}", host, port, e);
            return false;
        }
    };

    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => {
                log::debug!("Network reachable via {}", addr);
                return true;
            }
            Err(e) => {
                log::debug!("Probe to {} failed: {}", addr, e);
            }
        }
    }
    false
}
