use async_trait::async_trait;
use log::debug;
use mongodb::bson::doc;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{ClientOptions, Tls, TlsOptions};
use mongodb::Client;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::{ClientFactory, ConnectionConfig, DatabaseClient};
use crate::checks::{FailureCategory, ProbeFailure};
use crate::uri::redact_secrets;

/// Command error codes the server uses for rejected credentials
const AUTH_ERROR_CODES: [i32; 2] = [13, 18];

/// Builds handles backed by the official MongoDB driver
#[derive(Default)]
pub struct MongoClientFactory;

#[async_trait]
impl ClientFactory for MongoClientFactory {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Arc<dyn DatabaseClient>, ProbeFailure> {
        let uri = config.uri().ok_or_else(|| {
            ProbeFailure::new(FailureCategory::Configuration, "connection string is not set")
        })?;

        // mongodb+srv resolves the seed list while parsing
        let mut options = tokio::time::timeout(config.timeout, ClientOptions::parse(uri))
            .await
            .map_err(|_| ProbeFailure::timeout("Parsing the connection string", config.timeout))?
            .map_err(|e| classify(&e, uri))?;

        options.server_selection_timeout = Some(config.timeout);
        options.connect_timeout = Some(config.timeout);
        options.app_name = Some(config.app_name.clone());
        apply_tls(&mut options, config.tls_ca_file.as_ref());

        debug!(
            "Building client: hosts={:?} timeout={}ms ca_file={:?}",
            options.hosts,
            config.timeout.as_millis(),
            config.tls_ca_file
        );
        let client = Client::with_options(options).map_err(|e| classify(&e, uri))?;

        Ok(Arc::new(MongoDatabaseClient {
            client,
            uri: uri.to_string(),
            timeout: config.timeout,
        }))
    }
}

/// Turn TLS on unless the connection string opts out with `tls=false`.
///
/// Options already parsed from the connection string (`tlsCAFile`,
/// `tlsCertificateKeyFile`, ...) are kept, a configured CA file only replaces
/// the CA path.
fn apply_tls(options: &mut ClientOptions, ca_file: Option<&PathBuf>) {
    if options.tls.is_none() {
        options.tls = Some(Tls::Enabled(TlsOptions::default()));
    }
    if let (Some(Tls::Enabled(tls)), Some(ca)) = (options.tls.as_mut(), ca_file) {
        tls.ca_file_path = Some(ca.clone());
    }
}

pub struct MongoDatabaseClient {
    client: Client,
    /// Kept only to scrub credentials out of error messages
    uri: String,
    timeout: Duration,
}

#[async_trait]
impl DatabaseClient for MongoDatabaseClient {
    async fn ping(&self) -> Result<(), ProbeFailure> {
        let admin = self.client.database("admin");
        tokio::time::timeout(self.timeout, admin.run_command(doc! { "ping": 1 }))
            .await
            .map_err(|_| ProbeFailure::timeout("ping", self.timeout))?
            .map_err(|e| classify(&e, &self.uri))?;
        Ok(())
    }

    async fn list_database_names(&self) -> Result<Vec<String>, ProbeFailure> {
        tokio::time::timeout(self.timeout, self.client.list_database_names())
            .await
            .map_err(|_| ProbeFailure::timeout("listDatabases", self.timeout))?
            .map_err(|e| classify(&e, &self.uri))
    }
}

/// Map a driver error onto a [FailureCategory], scrubbing credentials from
/// both the message and the trace.
pub fn classify(err: &MongoError, uri: &str) -> ProbeFailure {
    let category = match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } => FailureCategory::ServerSelection,
        ErrorKind::Authentication { .. } => FailureCategory::Authentication,
        ErrorKind::DnsResolve { .. } => FailureCategory::Dns,
        ErrorKind::InvalidTlsConfig { .. } => FailureCategory::Tls,
        ErrorKind::InvalidArgument { .. } => FailureCategory::Configuration,
        ErrorKind::Io(e) => classify_io(e),
        ErrorKind::ConnectionPoolCleared { .. } => FailureCategory::Network,
        ErrorKind::Command(c) if AUTH_ERROR_CODES.contains(&c.code) => {
            FailureCategory::Authentication
        }
        ErrorKind::Command(_) => FailureCategory::Command,
        _ => FailureCategory::Internal,
    };
    ProbeFailure::new(category, redact_secrets(&err.to_string(), uri))
        .with_trace(redact_secrets(&format!("{:#?}", err), uri))
}

fn classify_io(err: &io::Error) -> FailureCategory {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FailureCategory::Timeout,
        _ => {
            let text = err.to_string().to_lowercase();
            if text.contains("certificate") || text.contains("tls") || text.contains("handshake")
            {
                FailureCategory::Tls
            } else {
                FailureCategory::Network
            }
        }
    }
}
