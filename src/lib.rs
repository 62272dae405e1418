//! VaultAlert - light and motion intrusion alarm node.
//!
//! This library watches a protected enclosure through a light sensor and an
//! accelerometer, sounds a local alarm the moment either trips, and reports
//! status to a supervisory endpoint that can silence the alarm remotely.
//!
//! # Alarm semantics
//!
//! - **Sticky alarm**: once raised, the alarm stays on until the endpoint
//!   answers a report with `false`
//! - **Per-interval events**: motion and light events are latched for one
//!   reporting interval, then cleared whether or not the report got through
//! - **Edge-driven buzzer**: the buzzer is only started or stopped when the
//!   alarm changes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        VaultAlert Node                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Sensor    │──▶│    Alarm    │──▶│  Indicator  │        │
//! │  │   Sampler   │   │    Latch    │   │   Driver    │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                           ▲ │                                │
//! │                     reset │ ▼ every 2s                       │
//! │                    ┌─────────────┐   ┌─────────────┐        │
//! │                    │  Reporting  │──▶│  Transport  │──▶ HTTP │
//! │                    │    Cycle    │   │   + Link    │        │
//! │                    └─────────────┘   └─────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::time::Instant;
//! use vault_alert::{
//!     config::Config, core::ConsoleBuzzer, link::ProbeLink, node::Node,
//!     sensor::RestingSampler, transport::BlockingHttpTransport,
//! };
//!
//! let config = Config::default();
//! let transport = BlockingHttpTransport::new(config.transport()).expect("transport");
//! let mut link = ProbeLink::for_endpoint(&config.endpoint_url, config.request_timeout)
//!     .expect("endpoint");
//! link.connect();
//!
//! let mut node = Node::new(
//!     (&config).into(),
//!     RestingSampler,
//!     ConsoleBuzzer::default(),
//!     link,
//!     transport,
//!     Instant::now(),
//! );
//! node.tick(Instant::now());
//! ```

pub mod activity;
pub mod config;
pub mod core;
pub mod link;
pub mod node;
pub mod sensor;
pub mod transport;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use activity::{ActivityLog, ActivityStats, SharedActivityLog};
pub use config::{Config, ConfigError, LinkConfig};
pub use crate::core::{
    AlarmLatch, AlarmState, CycleOutcome, Indicator, IndicatorDriver, ReportingCycle,
    StatusReport, VaultStatus,
};
pub use link::{NetworkLink, ProbeLink};
pub use node::{Node, NodeSettings, TickReport};
pub use sensor::{Acceleration, SensorSample, SensorSampler};
pub use transport::{
    BlockingHttpTransport, HttpTransport, ReportTransport, TlsMode, TransportConfig,
    TransportError, TransportResponse,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice about how the endpoint's certificate is checked.
pub const TLS_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                VAULTALERT - TRANSPORT SECURITY NOTICE            ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Status reports are sent over HTTPS, but by default the          ║
║  endpoint's certificate is NOT VERIFIED.                         ║
║                                                                  ║
║  Anyone able to intercept traffic can read reports and send      ║
║  a reset that silences the alarm.                                ║
║                                                                  ║
║  To pin the endpoint's root certificate, set in config.json:     ║
║    "tls": { "mode": "pinned", "ca_cert_path": "/path/ca.pem" }   ║
║  or pass --ca-cert /path/ca.pem to `vault-alert run`.            ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
