use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::{path::Path, sync::Arc};
use tracing::debug;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    // Probing
    probe_requests: IntCounterVec,
    endpoint_health: IntCounterVec,
    network_reference_height: IntGauge,
    healthy_endpoints: IntGauge,
    // Selection
    restart_trust_height: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let probe_requests = IntCounterVec::new(
            Opts::new("bootstrap_probe_requests_total", "Total number of requests sent to REST endpoints"),
            &["resource", "result"],
        )?;
        registry.register(Box::new(probe_requests.clone()))?;

        let endpoint_health = IntCounterVec::new(
            Opts::new("bootstrap_endpoint_health_total", "Health verdicts given to REST endpoints"),
            &["verdict"],
        )?;
        registry.register(Box::new(endpoint_health.clone()))?;

        let network_reference_height = IntGauge::with_opts(Opts::new(
            "bootstrap_network_reference_height",
            "Highest block height reported by any endpoint",
        ))?;
        registry.register(Box::new(network_reference_height.clone()))?;

        let healthy_endpoints = IntGauge::with_opts(Opts::new(
            "bootstrap_healthy_endpoints",
            "Number of endpoints kept after health filtering",
        ))?;
        registry.register(Box::new(healthy_endpoints.clone()))?;

        let restart_trust_height = IntGauge::with_opts(Opts::new(
            "bootstrap_restart_trust_height",
            "Trust height selected for state-sync",
        ))?;
        registry.register(Box::new(restart_trust_height.clone()))?;

        Ok(Self {
            registry,
            probe_requests,
            endpoint_health,
            network_reference_height,
            healthy_endpoints,
            restart_trust_height,
        })
    }

    pub fn gather(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::<u8>::new();
        let encoder = TextEncoder::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("failed to encode metrics")?;
        String::from_utf8(buffer).context("metrics not utf8")
    }

    /// Dump the registry in text exposition format, for node_exporter's
    /// textfile collector.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let rendered = self.gather()?;
        std::fs::write(path, rendered)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        debug!(path = %path.display(), "Metrics written");
        Ok(())
    }

    // Probing
    pub fn inc_probe_request(&self, resource: &str, result: &str) {
        self.probe_requests.with_label_values(&[resource, result]).inc();
    }

    pub fn inc_endpoint_health(&self, verdict: &str) {
        self.endpoint_health.with_label_values(&[verdict]).inc();
    }

    pub fn set_network_reference_height(&self, height: u64) {
        self.network_reference_height.set(clamp(height));
    }

    pub fn set_healthy_endpoints(&self, count: usize) {
        self.healthy_endpoints.set(clamp(count as u64));
    }

    // Selection
    pub fn set_restart_trust_height(&self, height: u64) {
        self.restart_trust_height.set(clamp(height));
    }
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub type SharedMetrics = Arc<Metrics>;
