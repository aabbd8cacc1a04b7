#![allow(unused)]
use crate::checks::dns::{DnsLookup, DnsSrvRecord};
use crate::checks::ProbeFailure;
use crate::db::{ClientFactory, ConnectionConfig, DatabaseClient};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
pub struct MockDatabaseClient {
    pub ping: Result<(), ProbeFailure>,
    pub names: Result<Vec<String>, ProbeFailure>,
    pub panic_on_ping: bool,
    pub ping_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl MockDatabaseClient {
    pub fn healthy(names: Vec<String>) -> Self {
        Self {
            ping: Ok(()),
            names: Ok(names),
            panic_on_ping: false,
            ping_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_ping_error(mut self, failure: ProbeFailure) -> Self {
        self.ping = Err(failure);
        self
    }

    pub fn with_list_error(mut self, failure: ProbeFailure) -> Self {
        self.names = Err(failure);
        self
    }

    pub fn panicking() -> Self {
        Self {
            panic_on_ping: true,
            ..Self::healthy(vec![])
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn ping(&self) -> Result<(), ProbeFailure> {
        self.ping_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_ping {
            panic!("mock client exploded");
        }
        self.ping.clone()
    }

    async fn list_database_names(&self) -> Result<Vec<String>, ProbeFailure> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.names.clone()
    }
}

/// Hands out the same [MockDatabaseClient] and counts how often it was asked
pub struct MockClientFactory {
    pub client: Arc<MockDatabaseClient>,
    pub connects: AtomicUsize,
    delay: Option<Duration>,
}

impl MockClientFactory {
    pub fn new(client: MockDatabaseClient) -> Self {
        Self {
            client: Arc::new(client),
            connects: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleep inside connect, widens the window for racing first use
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ClientFactory for MockClientFactory {
    async fn connect(
        &self,
        _config: &ConnectionConfig,
    ) -> Result<Arc<dyn DatabaseClient>, ProbeFailure> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        Ok(self.client.clone() as Arc<dyn DatabaseClient>)
    }
}

/// Resolver with canned answers, unknown hosts fail to resolve
#[derive(Default)]
pub struct MockDns {
    pub srv: Option<Result<Vec<DnsSrvRecord>, String>>,
    pub hosts: HashMap<String, Result<Vec<IpAddr>, String>>,
    pub srv_calls: AtomicUsize,
    pub ip_calls: AtomicUsize,
}

impl MockDns {
    pub fn with_srv(mut self, records: Vec<DnsSrvRecord>) -> Self {
        self.srv = Some(Ok(records));
        self
    }

    pub fn with_srv_error(mut self, error: &str) -> Self {
        self.srv = Some(Err(error.to_string()));
        self
    }

    pub fn with_host(mut self, host: &str, result: Result<Vec<IpAddr>, String>) -> Self {
        self.hosts.insert(host.to_string(), result);
        self
    }
}

#[async_trait]
impl DnsLookup for MockDns {
    async fn lookup_srv(&self, name: &str) -> Result<Vec<DnsSrvRecord>> {
        self.srv_calls.fetch_add(1, Ordering::SeqCst);
        match &self.srv {
            Some(Ok(r)) => Ok(r.clone()),
            Some(Err(e)) => Err(anyhow!("{}", e)),
            None => Err(anyhow!("no SRV records for {}", name)),
        }
    }

    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
        self.ip_calls.fetch_add(1, Ordering::SeqCst);
        match self.hosts.get(host) {
            Some(Ok(ips)) => Ok(ips.clone()),
            Some(Err(e)) => Err(anyhow!("{}", e)),
            None => Err(anyhow!("no record found for {}", host)),
        }
    }
}
