use async_trait::async_trait;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::checks::{FailureCategory, ProbeFailure};

mod mongo;

pub use mongo::*;

/// Everything needed to build a client handle
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Connection string, `None` when not configured
    pub uri: Option<String>,
    /// Applied to server selection, connect and every individual operation
    pub timeout: Duration,
    /// CA bundle used to verify the server certificate, platform roots when `None`
    pub tls_ca_file: Option<PathBuf>,
    /// Reported to the server in the handshake
    pub app_name: String,
}

impl ConnectionConfig {
    /// The connection string if set and not blank
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// Read-only view of a database deployment
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Run the administrative liveness command
    async fn ping(&self) -> Result<(), ProbeFailure>;

    /// List visible database names
    async fn list_database_names(&self) -> Result<Vec<String>, ProbeFailure>;
}

/// Builds [DatabaseClient] handles
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn connect(&self, config: &ConnectionConfig)
    -> Result<Arc<dyn DatabaseClient>, ProbeFailure>;
}

struct PooledClient {
    uri: String,
    client: Arc<dyn DatabaseClient>,
}

/// Owns the single long-lived client handle for the process.
///
/// The handle is created on first use and handed out on every later call.
/// Creation runs under the lock so concurrent first callers end up with the
/// same handle. A different connection string replaces the handle.
pub struct ClientPool {
    factory: Arc<dyn ClientFactory>,
    slot: Mutex<Option<PooledClient>>,
}

impl ClientPool {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            slot: Mutex::new(None),
        }
    }

    /// Get the shared client, creating it if this is the first call
    pub async fn get_or_connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Arc<dyn DatabaseClient>, ProbeFailure> {
        let uri = config.uri().ok_or_else(|| {
            ProbeFailure::new(FailureCategory::Configuration, "connection string is not set")
        })?;

        let mut slot = self.slot.lock().await;
        if let Some(pooled) = slot.as_ref()
            && pooled.uri == uri
        {
            return Ok(pooled.client.clone());
        }
        if slot.is_some() {
            info!("Connection string changed, replacing pooled client");
        }

        let client = self.factory.connect(config).await?;
        *slot = Some(PooledClient {
            uri: uri.to_string(),
            client: client.clone(),
        });
        info!("Created pooled database client");
        Ok(client)
    }

    /// Whether a handle has been created yet
    pub async fn is_connected(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}
