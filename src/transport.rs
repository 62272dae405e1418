//! Report transport: delivers status reports to the supervisory endpoint.
//!
//! The reporting cycle only sees [`ReportTransport`], a single blocking
//! request with a bounded timeout. [`BlockingHttpTransport`] is the real
//! implementation; tests substitute canned responses.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// How the endpoint's certificate is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TlsMode {
    /// Accept any certificate.
    #[default]
    Insecure,
    /// Trust only the given PEM root certificate.
    Pinned { ca_cert_path: PathBuf },
}

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Full URL reports are POSTed to
    pub endpoint_url: String,
    /// Upper bound on one request, connect through body read
    pub timeout: Duration,
    /// Certificate policy
    pub tls: TlsMode,
}

impl TransportConfig {
    pub fn new(endpoint_url: impl Into<String>, timeout: Duration, tls: TlsMode) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            timeout,
            tls,
        }
    }
}

/// Transport error types.
#[derive(Debug)]
pub enum TransportError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Request did not finish within the timeout
    Timeout,
    /// Endpoint returned a non-success status
    Server { status: u16, message: String },
    /// Report could not be encoded
    Serialization(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Config(msg) => write!(f, "Transport config error: {msg}"),
            TransportError::Network(msg) => write!(f, "Transport network error: {msg}"),
            TransportError::Timeout => write!(f, "Transport timed out"),
            TransportError::Server { status, message } => {
                write!(f, "Endpoint error ({status}): {message}")
            }
            TransportError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one JSON report and returns the endpoint's answer.
///
/// Implementations block until the response arrives or their timeout
/// expires. Non-2xx statuses are errors.
pub trait ReportTransport {
    fn send(&self, body: &str) -> Result<TransportResponse, TransportError>;
}

/// Async HTTP transport.
pub struct HttpTransport {
    config: TransportConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a new transport.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        reqwest::Url::parse(&config.endpoint_url).map_err(|e| {
            TransportError::Config(format!("Invalid endpoint URL '{}': {e}", config.endpoint_url))
        })?;

        let builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(user_agent());

        let builder = match &config.tls {
            TlsMode::Insecure => builder.danger_accept_invalid_certs(true),
            TlsMode::Pinned { ca_cert_path } => {
                let pem = std::fs::read(ca_cert_path).map_err(|e| {
                    TransportError::Config(format!(
                        "Failed to read CA certificate from {ca_cert_path:?}: {e}"
                    ))
                })?;
                let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    TransportError::Config(format!("Invalid CA certificate: {e}"))
                })?;
                builder
                    .tls_built_in_root_certs(false)
                    .add_root_certificate(cert)
            }
        };

        let client = builder
            .build()
            .map_err(|e| TransportError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// POST a report body.
    pub async fn post_report(&self, body: &str) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(&self.config.endpoint_url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Blocking transport for the synchronous control loop.
pub struct BlockingHttpTransport {
    inner: HttpTransport,
    runtime: tokio::runtime::Runtime,
}

impl BlockingHttpTransport {
    /// Create a new blocking transport.
    ///
    /// Must not be called from within an async runtime.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TransportError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: HttpTransport::new(config)?,
            runtime,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        self.inner.config()
    }
}

impl ReportTransport for BlockingHttpTransport {
    fn send(&self, body: &str) -> Result<TransportResponse, TransportError> {
        self.runtime.block_on(self.inner.post_report(body))
    }
}

fn user_agent() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("vault-alert/{} ({host})", env!("CARGO_PKG_VERSION"))
}
