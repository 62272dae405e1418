//! Supervisory endpoint for VaultAlert nodes.
//!
//! This module provides an HTTP server that:
//! - Accepts status reports from a node via POST /collect
//! - Raises alerts on motion and vault-open edges
//! - Queues a mute via POST /mute, delivered as a `false` reply to the
//!   next report
//! - Serves recent reports via GET /history
//! - Charts vault status and motion over the stored history via GET /plot
//!
//! # Architecture
//!
//! ```text
//! Node ──→ POST /collect ──→ supervisor ──→ "true" | "false"
//!                                ↑
//! Operator ──→ POST /mute ───────┘
//! ```

use crate::core::{StatusReport, VaultStatus};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Default number of reports kept in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Reports kept in history
    pub history_capacity: usize,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, history_capacity: usize) -> Self {
        Self {
            port,
            history_capacity,
        }
    }
}

/// Alert raised by a report edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alert {
    #[serde(rename = "Motion Detected")]
    MotionDetected,
    #[serde(rename = "Vault Opened")]
    VaultOpened,
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alert::MotionDetected => write!(f, "Motion Detected"),
            Alert::VaultOpened => write!(f, "Vault Opened"),
        }
    }
}

/// A stored report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    pub report: StatusReport,
    pub alerts: Vec<Alert>,
}

/// Time series drawn by GET /plot, one point per stored report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlotSeries {
    pub timestamps: Vec<String>,
    /// 1 = OPEN, 0 = CLOSED
    pub vault_open: Vec<u8>,
    pub motion: Vec<u8>,
}

/// Mutable supervisor state.
#[derive(Debug)]
struct Supervisor {
    history: VecDeque<ReportRecord>,
    capacity: usize,
    mute_pending: bool,
    last_motion: bool,
    last_vault: VaultStatus,
}

impl Supervisor {
    fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            mute_pending: false,
            last_motion: false,
            last_vault: VaultStatus::Closed,
        }
    }

    /// Store a report and return (alerts, whether to mute).
    fn accept(&mut self, report: StatusReport) -> (Vec<Alert>, bool) {
        let mut alerts = Vec::new();
        if report.motion_detected && !self.last_motion {
            alerts.push(Alert::MotionDetected);
        }
        if report.vault_status == VaultStatus::Open && self.last_vault == VaultStatus::Closed {
            alerts.push(Alert::VaultOpened);
        }
        self.last_motion = report.motion_detected;
        self.last_vault = report.vault_status;

        if self.capacity > 0 {
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(ReportRecord {
                id: Uuid::new_v4(),
                received_at: Utc::now(),
                report,
                alerts: alerts.clone(),
            });
        }

        let mute = std::mem::take(&mut self.mute_pending);
        (alerts, mute)
    }

    fn plot_series(&self) -> PlotSeries {
        let mut series = PlotSeries::default();
        for record in &self.history {
            series.timestamps.push(record.received_at.to_rfc3339());
            series
                .vault_open
                .push(u8::from(record.report.vault_status == VaultStatus::Open));
            series.motion.push(u8::from(record.report.motion_detected));
        }
        series
    }
}

/// Shared server state
pub struct ServerState {
    supervisor: RwLock<Supervisor>,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            supervisor: RwLock::new(Supervisor::new(config.history_capacity)),
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /collect
///
/// Missing report fields take their defaults. Replies `false` when a mute
/// is pending, `true` otherwise.
async fn collect(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<StatusReport>, JsonRejection>,
) -> (StatusCode, &'static str) {
    let Json(report) = match payload {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!("Rejected report: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    let (alerts, muted) = state.supervisor.write().await.accept(report);

    if !alerts.is_empty() {
        let subject = alerts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        tracing::warn!(
            light_level = report.light_level,
            vault = %report.vault_status,
            "Security alert: {}",
            subject
        );
    }

    if muted {
        tracing::info!("Sending mute command to node");
        (StatusCode::OK, "false")
    } else {
        (StatusCode::OK, "true")
    }
}

/// POST /mute
async fn mute(State(state): State<Arc<ServerState>>) -> &'static str {
    state.supervisor.write().await.mute_pending = true;
    tracing::info!("Mute requested");
    "Mute command queued. The alarm will stop the next time the node reports in."
}

/// GET /history
async fn history(State(state): State<Arc<ServerState>>) -> Json<Vec<ReportRecord>> {
    let supervisor = state.supervisor.read().await;
    Json(supervisor.history.iter().cloned().collect())
}

const PLOT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>VaultAlert History Plot</title>
  <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
  <style>
    body { font-family: Arial, sans-serif; padding: 20px; background: #f6f6f6; }
    #chart-container { width: 95%; max-width: 850px; margin: auto; background: white;
      padding: 20px; border-radius: 12px; box-shadow: 0 3px 10px rgba(0,0,0,0.15); }
  </style>
</head>
<body>
  <h2 style="text-align:center;">VaultAlert Status History</h2>
  <div id="chart-container"><canvas id="vaultChart"></canvas></div>
  <script>
    const series = __SERIES__;
    new Chart(document.getElementById('vaultChart'), {
      type: 'line',
      data: {
        labels: series.timestamps,
        datasets: [
          { label: 'Vault Status (1=OPEN, 0=CLOSED)', data: series.vault_open, stepped: true, borderWidth: 2 },
          { label: 'Motion Detected (1=Yes, 0=No)', data: series.motion, stepped: true, borderWidth: 2 }
        ]
      },
      options: { scales: { y: { min: -0.1, max: 1.1, ticks: { stepSize: 1 } } } }
    });
  </script>
</body>
</html>
"#;

/// GET /plot
async fn plot(State(state): State<Arc<ServerState>>) -> Result<Html<String>, StatusCode> {
    let series = state.supervisor.read().await.plot_series();
    let json = serde_json::to_string(&series).map_err(|e| {
        tracing::error!("Failed to encode plot series: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Html(PLOT_PAGE.replace("__SERIES__", &json)))
}

/// Build the router without binding.
pub fn router(config: &ServerConfig) -> Router {
    let state = Arc::new(ServerState::new(config));

    Router::new()
        .route("/health", get(health))
        .route("/collect", post(collect))
        .route("/api/collect", post(collect))
        .route("/mute", post(mute).get(mute))
        .route("/history", get(history))
        .route("/plot", get(plot))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = router(&config);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Supervisor listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
