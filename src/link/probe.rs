//! Link status derived from TCP reachability of the report endpoint.

use crate::link::NetworkLink;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

/// How long a "connected" result is trusted before it is re-probed.
pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Errors that can occur while setting up a link.
#[derive(Debug)]
pub enum LinkError {
    InvalidEndpoint(String),
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::InvalidEndpoint(e) => write!(f, "Invalid endpoint: {e}"),
        }
    }
}

impl std::error::Error for LinkError {}

/// A link that is "up" while the endpoint's host accepts TCP connections.
///
/// Probes after the first one run on a background thread and report back
/// over a channel, so `is_connected` never blocks the control loop.
pub struct ProbeLink {
    target: String,
    network: Option<String>,
    timeout: Duration,
    recheck: Duration,
    connected: bool,
    checked_at: Instant,
    in_flight: bool,
    sender: Sender<bool>,
    receiver: Receiver<bool>,
}

impl ProbeLink {
    /// Create a link for a `host:port` target. Starts out disconnected.
    pub fn new(target: impl Into<String>, timeout: Duration) -> Self {
        let (sender, receiver) = bounded(1);
        Self {
            target: target.into(),
            network: None,
            timeout,
            recheck: DEFAULT_RECHECK_INTERVAL,
            connected: false,
            checked_at: Instant::now(),
            in_flight: false,
            sender,
            receiver,
        }
    }

    /// Create a link for the host and port of an endpoint URL.
    pub fn for_endpoint(url: &str, timeout: Duration) -> Result<Self, LinkError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| LinkError::InvalidEndpoint(format!("{url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| LinkError::InvalidEndpoint(format!("{url}: missing host")))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| LinkError::InvalidEndpoint(format!("{url}: missing port")))?;
        Ok(Self::new(format!("{host}:{port}"), timeout))
    }

    /// Name the network this link rides on, for log lines.
    pub fn with_network_name(mut self, name: impl Into<String>) -> Self {
        self.network = Some(name.into());
        self
    }

    /// Override how often a connected link is re-probed.
    pub fn with_recheck_interval(mut self, recheck: Duration) -> Self {
        self.recheck = recheck;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Probe once, blocking for at most the configured timeout.
    pub fn connect(&mut self) -> bool {
        if let Some(ref network) = self.network {
            tracing::info!(%network, endpoint = %self.target, "Connecting");
        }
        self.connected = probe(&self.target, self.timeout);
        self.checked_at = Instant::now();
        self.connected
    }

    fn spawn_probe(&mut self) {
        let target = self.target.clone();
        let timeout = self.timeout;
        let sender = self.sender.clone();
        self.in_flight = true;
        thread::spawn(move || {
            let _ = sender.send(probe(&target, timeout));
        });
    }

    fn drain(&mut self) {
        while let Ok(up) = self.receiver.try_recv() {
            if up != self.connected {
                if up {
                    tracing::info!(endpoint = %self.target, "Link up");
                } else {
                    tracing::warn!(endpoint = %self.target, "Link down");
                }
            }
            self.connected = up;
            self.checked_at = Instant::now();
            self.in_flight = false;
        }
    }
}

impl NetworkLink for ProbeLink {
    fn is_connected(&mut self) -> bool {
        self.drain();
        if self.connected && !self.in_flight && self.checked_at.elapsed() >= self.recheck {
            self.spawn_probe();
        }
        self.connected
    }

    fn attempt_reconnect(&mut self) {
        self.drain();
        if !self.in_flight {
            self.spawn_probe();
        }
    }
}

/// Whether any address of `target` accepts a TCP connection in time.
pub fn probe(target: &str, timeout: Duration) -> bool {
    match target.to_socket_addrs() {
        Ok(mut addrs) => addrs.any(|addr| TcpStream::connect_timeout(&addr, timeout).is_ok()),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_millis(500);

    #[test]
    fn test_for_endpoint_uses_default_ports() {
        let link = ProbeLink::for_endpoint("https://vault.example.com/api/collect", TIMEOUT).unwrap();
        assert_eq!(link.target(), "vault.example.com:443");

        let link = ProbeLink::for_endpoint("http://127.0.0.1:7071/api/collect", TIMEOUT).unwrap();
        assert_eq!(link.target(), "127.0.0.1:7071");
    }

    #[test]
    fn test_for_endpoint_rejects_garbage() {
        assert!(ProbeLink::for_endpoint("::nope::", TIMEOUT).is_err());
    }

    #[test]
    fn test_connect_to_listening_host() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut link = ProbeLink::new(addr.to_string(), TIMEOUT);
        assert!(link.connect());
        assert!(link.is_connected());
    }

    #[test]
    fn test_connect_to_closed_port() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let mut link = ProbeLink::new(addr.to_string(), TIMEOUT);
        assert!(!link.connect());
        assert!(!link.is_connected());
    }

    #[test]
    fn test_reconnect_result_arrives_later() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut link = ProbeLink::new(addr.to_string(), TIMEOUT);
        assert!(!link.is_connected());

        link.attempt_reconnect();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !link.is_connected() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(link.is_connected());
    }
}
