//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! It is constructed from CLI arguments in `main.rs` or from defaults in
//! tests; the domain layer itself never reads the environment.
//!
//! The configuration surface is deliberately small: the listen address and
//! the heartbeat interval are the only tunables the relay has.

use std::net::SocketAddr;
use std::time::Duration;

/// All runtime configuration for the chat relay.
///
/// # Example
///
/// ```rust
/// use wirechat_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address and port the TCP listener binds to.
    ///
    /// `0.0.0.0` accepts connections from any network interface.  Set to
    /// `127.0.0.1` to accept only local connections.
    pub bind_addr: SocketAddr,

    /// How often each open connection is sent the keepalive ping frame.
    ///
    /// The ping is one-way: no reply is awaited or validated.
    pub heartbeat_interval: Duration,
}

impl Default for ServerConfig {
    /// Returns a `ServerConfig` suitable for local development: listen on
    /// every interface at port 8080, ping every 5 seconds.
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            heartbeat_interval: Duration::from_secs(5),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_8080() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr.port(), 8080);
    }

    #[test]
    fn test_default_heartbeat_is_5s() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.heartbeat_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_config_custom_values_are_stored() {
        let cfg = ServerConfig {
            bind_addr: "127.0.0.1:9000".parse().unwrap(),
            heartbeat_interval: Duration::from_millis(250),
        };
        assert_eq!(cfg.bind_addr.ip().to_string(), "127.0.0.1");
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.heartbeat_interval, Duration::from_millis(250));
    }
}
