use log::error;
use prometheus::{Encoder, Gauge, IntCounterVec, Opts, Registry, TextEncoder};

use crate::checks::dns::DnsReport;
use crate::checks::ProbeResult;

/// Prometheus metrics for probe cycles
#[derive(Clone)]
pub struct ProbeMetrics {
    registry: Registry,
    /// Last ping outcome (1 = connected, 0 = not)
    pub probe_up: Gauge,
    /// Round trip of the last successful ping in seconds, failed pings leave it untouched
    pub probe_latency: Gauge,
    /// Cluster members that resolved in the last DNS diagnostic
    pub dns_hosts_resolved: Gauge,
    /// Completed cycles by outcome (connected, failed, not_configured, crashed)
    pub cycles: IntCounterVec,
}

impl ProbeMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let probe_up = Gauge::with_opts(Opts::new(
            "mongo_status_probe_up",
            "Database liveness (1 = ping ok, 0 = failed)",
        ))
        .expect("Failed to create probe_up");

        let probe_latency = Gauge::with_opts(Opts::new(
            "mongo_status_probe_latency_seconds",
            "Round trip time of the last successful ping in seconds",
        ))
        .expect("Failed to create probe_latency");

        let dns_hosts_resolved = Gauge::with_opts(Opts::new(
            "mongo_status_dns_hosts_resolved",
            "Cluster members resolved to at least one address",
        ))
        .expect("Failed to create dns_hosts_resolved");

        let cycles = IntCounterVec::new(
            Opts::new("mongo_status_probe_cycles_total", "Probe cycles by outcome"),
            &["outcome"],
        )
        .expect("Failed to create cycles");

        registry
            .register(Box::new(probe_up.clone()))
            .expect("Failed to register probe_up");
        registry
            .register(Box::new(probe_latency.clone()))
            .expect("Failed to register probe_latency");
        registry
            .register(Box::new(dns_hosts_resolved.clone()))
            .expect("Failed to register dns_hosts_resolved");
        registry
            .register(Box::new(cycles.clone()))
            .expect("Failed to register cycles");

        Self {
            registry,
            probe_up,
            probe_latency,
            dns_hosts_resolved,
            cycles,
        }
    }

    pub fn record_probe(&self, result: &ProbeResult) {
        self.probe_up.set(if result.ok { 1.0 } else { 0.0 });
        if let Some(ms) = result.latency_ms {
            self.probe_latency.set(ms / 1000.0);
        }
    }

    pub fn record_dns(&self, report: &DnsReport) {
        self.dns_hosts_resolved.set(report.resolved_hosts() as f64);
    }

    pub fn record_cycle(&self, outcome: &str) {
        self.cycles.with_label_values(&[outcome]).inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            error!("Failed to encode metrics: {}", e);
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for ProbeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
