use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;

use super::{ProbeFailure, ProbeResult};
use crate::db::{ClientPool, ConnectionConfig};

/// At most this many database names are listed in the details
pub const MAX_LISTED_NAMES: usize = 10;
/// Appended when more names exist than are listed
pub const TRUNCATION_MARKER: &str = "...";

pub const MSG_CONNECTED: &str = "Connected";
pub const MSG_NOT_CONFIGURED: &str = "Not configured";
pub const MSG_CONNECTION_FAILED: &str = "Connection failed";

/// Runs the liveness command through the pooled client and classifies the
/// outcome. The ping alone decides `ok`; the database listing is best effort.
pub struct Prober {
    pool: Arc<ClientPool>,
    /// Environment variable the connection string comes from, for messages
    uri_env: String,
    /// Append the full failure trace to the details
    include_trace: bool,
}

impl Prober {
    pub fn new(pool: Arc<ClientPool>, uri_env: impl Into<String>) -> Self {
        Self {
            pool,
            uri_env: uri_env.into(),
            include_trace: false,
        }
    }

    pub fn with_trace(mut self, include_trace: bool) -> Self {
        self.include_trace = include_trace;
        self
    }

    pub async fn check(&self, config: &ConnectionConfig) -> ProbeResult {
        let checked_at = chrono::Utc::now();

        if config.uri().is_none() {
            return ProbeResult::fail(
                MSG_NOT_CONFIGURED,
                format!(
                    "Missing env var {} (set it in .env or system env).",
                    self.uri_env
                ),
            )
            .checked_at(checked_at);
        }

        let client = match self.pool.get_or_connect(config).await {
            Ok(c) => c,
            Err(e) => return self.failed(e).checked_at(checked_at),
        };

        let start = Instant::now();
        if let Err(e) = client.ping().await {
            return self.failed(e).checked_at(checked_at);
        }
        let latency = start.elapsed();
        debug!("Ping OK in {:.1}ms", latency.as_secs_f64() * 1000.0);

        let details = match client.list_database_names().await {
            Ok(names) => format!("Ping OK. Visible DBs: {}", list_names(&names)),
            Err(e) => {
                warn!("Database listing failed after successful ping: {}", e);
                format!("Ping OK. Database listing failed: {}", e)
            }
        };

        ProbeResult::ok(MSG_CONNECTED, details)
            .checked_at(checked_at)
            .with_latency(latency)
    }

    fn failed(&self, failure: ProbeFailure) -> ProbeResult {
        let mut details = failure.to_string();
        if self.include_trace && !failure.trace.is_empty() {
            details.push_str("\n\nTrace:\n");
            details.push_str(&failure.trace);
        }
        ProbeResult::fail(MSG_CONNECTION_FAILED, details).with_failure(failure)
    }
}

/// Comma separated names, truncated to [MAX_LISTED_NAMES]
pub fn list_names(names: &[String]) -> String {
    let shown: Vec<&str> = names
        .iter()
        .take(MAX_LISTED_NAMES)
        .map(|n| n.as_str())
        .collect();
    let mut out = shown.join(", ");
    if names.len() > MAX_LISTED_NAMES {
        out.push_str(TRUNCATION_MARKER);
    }
    out
}
