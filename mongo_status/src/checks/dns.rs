use anyhow::{Context, Result};
use async_trait::async_trait;
use hickory_resolver::config::ResolverOpts;
use hickory_resolver::TokioResolver;
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::uri::UriSummary;

/// Default service/protocol label for MongoDB seed list records
pub const DEFAULT_SRV_SERVICE: &str = "_mongodb._tcp";

const NO_HOSTNAME: &str = "no hostname could be derived from the connection string";

/// One service-discovery record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsSrvRecord {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

/// Address lookup outcome for a single cluster member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostResolution {
    pub host: String,
    pub port: Option<u16>,
    pub addresses: Vec<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostResolution {
    pub fn is_resolved(&self) -> bool {
        self.error.is_none() && !self.addresses.is_empty()
    }
}

/// Result of the two stage (SRV then address) resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DnsReport {
    /// SRV name queried, `None` when the SRV stage did not apply
    pub query: Option<String>,
    pub srv_records: Vec<DnsSrvRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srv_error: Option<String>,
    pub hosts: Vec<HostResolution>,
}

impl DnsReport {
    pub fn resolved_hosts(&self) -> usize {
        self.hosts.iter().filter(|h| h.is_resolved()).count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.query {
            Some(q) => out.push_str(&format!("SRV {}:\n", q)),
            None => out.push_str("SRV: skipped\n"),
        }
        if let Some(e) = &self.srv_error {
            out.push_str(&format!("  error: {}\n", e));
        }
        for r in &self.srv_records {
            out.push_str(&format!(
                "  priority={} weight={} port={} target={}\n",
                r.priority, r.weight, r.port, r.target
            ));
        }
        out.push_str(&format!("Hosts ({}):\n", self.hosts.len()));
        for h in &self.hosts {
            let name = match h.port {
                Some(p) => format!("{}:{}", h.host, p),
                None => h.host.clone(),
            };
            match &h.error {
                Some(e) => out.push_str(&format!("  [FAIL] {} -> {}\n", name, e)),
                None => {
                    let ips: Vec<String> = h.addresses.iter().map(|ip| ip.to_string()).collect();
                    out.push_str(&format!("  [OK] {} -> [{}]\n", name, ips.join(", ")))
                }
            }
        }
        out
    }
}

/// Name lookups used by the diagnostics
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// Look up SRV records for a fully qualified service name
    async fn lookup_srv(&self, name: &str) -> Result<Vec<DnsSrvRecord>>;

    /// Resolve a hostname to its addresses
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// [DnsLookup] using the host's resolver configuration
pub struct HickoryLookup {
    resolver: TokioResolver,
}

impl HickoryLookup {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;

        let mut builder =
            TokioResolver::builder_tokio().context("Failed to read system resolver config")?;
        *builder.options_mut() = opts;
        Ok(Self {
            resolver: builder.build(),
        })
    }
}

#[async_trait]
impl DnsLookup for HickoryLookup {
    async fn lookup_srv(&self, name: &str) -> Result<Vec<DnsSrvRecord>> {
        let lookup = self.resolver.srv_lookup(name).await?;
        Ok(lookup
            .iter()
            .map(|srv| DnsSrvRecord {
                priority: srv.priority(),
                weight: srv.weight(),
                port: srv.port(),
                target: srv.target().to_utf8().trim_end_matches('.').to_string(),
            })
            .collect())
    }

    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
        let lookup = self.resolver.lookup_ip(host).await?;
        Ok(lookup.iter().collect())
    }
}

/// Two stage resolution of the cluster behind a connection string.
///
/// SRV hostnames usually have no address records of their own, so the SRV
/// records are queried first and every target is then resolved on its own.
/// Plain `mongodb://` strings skip straight to resolving the listed hosts.
pub struct DnsDiagnostics {
    lookup: Arc<dyn DnsLookup>,
    service: String,
}

impl DnsDiagnostics {
    pub fn new(lookup: Arc<dyn DnsLookup>, service: impl Into<String>) -> Self {
        Self {
            lookup,
            service: service.into(),
        }
    }

    pub async fn run(&self, summary: &UriSummary) -> DnsReport {
        let Some(hostname) = summary.hostname() else {
            return DnsReport {
                srv_error: Some(NO_HOSTNAME.to_string()),
                ..Default::default()
            };
        };

        if !summary.is_srv() {
            let mut hosts = Vec::with_capacity(summary.hosts().len());
            for seed in summary.hosts() {
                hosts.push(self.resolve_host(&seed.host, seed.port).await);
            }
            return DnsReport {
                hosts,
                ..Default::default()
            };
        }

        let query = format!("{}.{}", self.service, hostname);
        debug!("Querying SRV {}", query);
        let (mut srv_records, srv_error) = match self.lookup.lookup_srv(&query).await {
            Ok(records) => (records, None),
            Err(e) => (vec![], Some(format!("{:#}", e))),
        };
        srv_records.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.weight.cmp(&a.weight)));

        let mut hosts = Vec::with_capacity(srv_records.len());
        for r in &srv_records {
            hosts.push(self.resolve_host(&r.target, Some(r.port)).await);
        }

        DnsReport {
            query: Some(query),
            srv_records,
            srv_error,
            hosts,
        }
    }

    async fn resolve_host(&self, host: &str, port: Option<u16>) -> HostResolution {
        debug!("Resolving {}", host);
        match self.lookup.lookup_ip(host).await {
            Ok(ips) => {
                let addresses: Vec<IpAddr> = ips.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
                let error = if addresses.is_empty() {
                    Some("lookup returned no addresses".to_string())
                } else {
                    None
                };
                HostResolution {
                    host: host.to_string(),
                    port,
                    addresses,
                    error,
                }
            }
            Err(e) => HostResolution {
                host: host.to_string(),
                port,
                addresses: vec![],
                error: Some(format!("{:#}", e)),
            },
        }
    }
}
