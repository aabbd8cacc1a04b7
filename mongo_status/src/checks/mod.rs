use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod dns;
pub mod probe;

/// Coarse classification of a failed probe stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureCategory {
    /// Connection string missing or rejected before any network activity
    Configuration,
    /// Name resolution failed (SRV or address lookup)
    Dns,
    /// An operation exceeded the configured timeout
    Timeout,
    /// The driver could not select a server within the timeout
    ServerSelection,
    /// The server rejected the credentials
    Authentication,
    /// TLS setup or handshake failed
    Tls,
    /// Socket level failure
    Network,
    /// The server answered with a command error
    Command,
    /// Anything else, including crashes inside the probe cycle
    Internal,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::Configuration => "ConfigurationError",
            FailureCategory::Dns => "DnsError",
            FailureCategory::Timeout => "Timeout",
            FailureCategory::ServerSelection => "ServerSelectionTimeout",
            FailureCategory::Authentication => "AuthenticationFailed",
            FailureCategory::Tls => "TlsError",
            FailureCategory::Network => "NetworkError",
            FailureCategory::Command => "CommandError",
            FailureCategory::Internal => "InternalError",
        }
    }
}

impl Display for FailureCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure of a single probe stage
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{category}: {message}")]
pub struct ProbeFailure {
    pub category: FailureCategory,
    pub message: String,
    /// Full error chain, only rendered by the diagnostic tier
    #[serde(skip_serializing_if = "String::is_empty")]
    pub trace: String,
}

impl ProbeFailure {
    pub fn new(category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            trace: String::new(),
        }
    }

    pub fn timeout(operation: &str, after: Duration) -> Self {
        Self::new(
            FailureCategory::Timeout,
            format!("{} did not complete within {}ms", operation, after.as_millis()),
        )
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }
}

/// Outcome of one connectivity probe
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// Whether the liveness command succeeded
    pub ok: bool,
    /// Short human summary
    pub message: String,
    /// Free text diagnostics
    pub details: String,
    pub checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProbeFailure>,
    /// Round trip time of the liveness command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

impl ProbeResult {
    pub fn ok(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            details: details.into(),
            checked_at: Utc::now(),
            failure: None,
            latency_ms: None,
        }
    }

    pub fn fail(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            details: details.into(),
            checked_at: Utc::now(),
            failure: None,
            latency_ms: None,
        }
    }

    pub fn checked_at(mut self, at: DateTime<Utc>) -> Self {
        self.checked_at = at;
        self
    }

    pub fn with_failure(mut self, failure: ProbeFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = Some(latency.as_secs_f64() * 1000.0);
        self
    }
}
