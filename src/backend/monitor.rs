//! Backend reachability monitoring.
//!
//! The monitor is deliberately tri-state: `Unknown` (no probe configured,
//! or not yet probed) permits queuing without claiming the backend is up.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::BackendConfig;

/// Whether the backend is currently reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// The backend answered a probe.
    Online,
    /// The backend did not answer a probe.
    Offline,
    /// Reachability has not been established.
    Unknown,
}

impl ConnectionState {
    /// True only for [`ConnectionState::Online`].
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Supplies online/offline transitions to the sync engine.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionMonitor: Send + Sync {
    /// Current reachability of the backend.
    fn state(&self) -> ConnectionState;
}

/// Monitor that probes a TCP endpoint, e.g. the backend's host and port.
///
/// With no probe address configured the state is always `Unknown`.
pub struct ProbeMonitor {
    addr: Option<String>,
    timeout: Duration,
    last: Mutex<ConnectionState>,
}

impl ProbeMonitor {
    /// Create a monitor probing `addr` (a `host:port` string).
    #[must_use]
    pub const fn new(addr: Option<String>, timeout: Duration) -> Self {
        Self {
            addr,
            timeout,
            last: Mutex::new(ConnectionState::Unknown),
        }
    }

    /// Build a monitor from the backend configuration section.
    #[must_use]
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(
            config.probe_addr.clone(),
            Duration::from_millis(config.probe_timeout_ms),
        )
    }
}

impl ConnectionMonitor for ProbeMonitor {
    fn state(&self) -> ConnectionState {
        let Some(addr) = &self.addr else {
            return ConnectionState::Unknown;
        };

        let state = if probe(addr, self.timeout) {
            ConnectionState::Online
        } else {
            ConnectionState::Offline
        };

        let mut last = self.last.lock();
        if *last != state {
            tracing::info!(from = %last, to = %state, "backend reachability changed");
            *last = state;
        }
        state
    }
}

fn probe(addr: &str, timeout: Duration) -> bool {
    let Ok(mut addrs) = addr.to_socket_addrs() else {
        return false;
    };
    let Some(addr) = addrs.next() else {
        return false;
    };
    TcpStream::connect_timeout(&addr, timeout).is_ok()
}

/// Monitor pinned to a fixed state. Backs the `--offline` override and
/// tests.
pub struct StaticMonitor(ConnectionState);

impl StaticMonitor {
    /// A monitor that always reports the given state.
    #[must_use]
    pub const fn new(state: ConnectionState) -> Self {
        Self(state)
    }

    /// Always online.
    #[must_use]
    pub const fn online() -> Self {
        Self::new(ConnectionState::Online)
    }

    /// Always offline.
    #[must_use]
    pub const fn offline() -> Self {
        Self::new(ConnectionState::Offline)
    }
}

impl ConnectionMonitor for StaticMonitor {
    fn state(&self) -> ConnectionState {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_static_monitor() {
        assert_eq!(StaticMonitor::online().state(), ConnectionState::Online);
        assert_eq!(StaticMonitor::offline().state(), ConnectionState::Offline);
    }

    #[test]
    fn test_unconfigured_probe_is_unknown() {
        let monitor = ProbeMonitor::new(None, Duration::from_millis(100));
        assert_eq!(monitor.state(), ConnectionState::Unknown);
    }

    #[test]
    fn test_probe_against_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let monitor = ProbeMonitor::new(Some(addr), Duration::from_millis(500));
        assert_eq!(monitor.state(), ConnectionState::Online);
    }

    #[test]
    fn test_probe_against_closed_port() {
        // Bind then drop to find a port that is very likely closed.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let monitor = ProbeMonitor::new(Some(addr), Duration::from_millis(200));
        assert_eq!(monitor.state(), ConnectionState::Offline);
    }

    #[test]
    fn test_unresolvable_probe_is_offline() {
        let monitor = ProbeMonitor::new(
            Some("not-a-host-at-all:1".to_string()),
            Duration::from_millis(100),
        );
        assert_eq!(monitor.state(), ConnectionState::Offline);
    }

    #[test]
    fn test_mock_monitor() {
        let mut mock = MockConnectionMonitor::new();
        mock.expect_state().return_const(ConnectionState::Online);
        assert!(mock.state().is_online());
    }
}
