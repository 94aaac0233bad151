//! Endpoint health assessment.
//!
//! An endpoint is trusted only while it keeps up with the network: its core
//! must be close to the highest height seen across all endpoints, and its
//! data node (when it reports one) must be close to its own core.

use std::{fmt, future::Future};

use api_types::StatusRecord;
use futures::{stream, StreamExt};
use tracing::{debug, info};

use crate::{
    config::{ClientConfig, DEFAULT_MAX_CONCURRENT_PROBES},
    endpoint::Endpoint,
    error::{EndpointFailure, ProbeError},
    probe::StatisticsProbe,
    retry::RetryPolicy,
    transport::HttpTransport,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthVerdict {
    Healthy,
    /// No probe succeeded within the retry budget.
    Unreachable,
    /// Core height trails the network head by `lag` blocks.
    BehindNetwork { lag: u64 },
    /// Data node trails the endpoint's own core by `lag` blocks.
    DataPlaneBehind { lag: u64 },
}

impl HealthVerdict {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthVerdict::Healthy)
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthVerdict::Healthy => "healthy",
            HealthVerdict::Unreachable => "unreachable",
            HealthVerdict::BehindNetwork { .. } => "behind_network",
            HealthVerdict::DataPlaneBehind { .. } => "data_plane_behind",
        }
    }
}

impl fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthVerdict::Healthy => f.write_str("healthy"),
            HealthVerdict::Unreachable => f.write_str("failed to get statistics"),
            HealthVerdict::BehindNetwork { lag } => write!(f, "core is {lag} blocks behind the network head"),
            HealthVerdict::DataPlaneBehind { lag } => write!(f, "data node is {lag} blocks behind core"),
        }
    }
}

/// Run `requests` with at most `limit` in flight. Outputs keep input order.
pub(crate) async fn bounded<I, Fut>(limit: usize, requests: I) -> Vec<Fut::Output>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future,
{
    stream::iter(requests).buffered(limit.max(1)).collect().await
}

/// Classify a successfully probed endpoint.
///
/// A lag equal to the threshold is still healthy. An endpoint ahead of the
/// reference height is never considered lagging.
pub fn classify(status: &StatusRecord, reference_height: u64, lagging_threshold: u64) -> HealthVerdict {
    let lag = reference_height.saturating_sub(status.block_height);
    if lag > lagging_threshold {
        return HealthVerdict::BehindNetwork { lag };
    }

    match status.data_plane_lag() {
        Some(lag) if lag > lagging_threshold => HealthVerdict::DataPlaneBehind { lag },
        _ => HealthVerdict::Healthy,
    }
}

pub struct EndpointHealthFilter<'a, T> {
    probe: &'a StatisticsProbe<T>,
    retry: RetryPolicy,
    lagging_threshold: u64,
    concurrency: usize,
}

impl<'a, T: HttpTransport> EndpointHealthFilter<'a, T> {
    pub fn new(probe: &'a StatisticsProbe<T>, retry: RetryPolicy, lagging_threshold: u64) -> Self {
        Self {
            probe,
            retry,
            lagging_threshold,
            concurrency: DEFAULT_MAX_CONCURRENT_PROBES,
        }
    }

    pub fn from_config(probe: &'a StatisticsProbe<T>, config: &ClientConfig) -> Self {
        Self::new(probe, config.retry, config.lagging_threshold).with_concurrency(config.max_concurrent_probes)
    }

    /// Upper bound on endpoints probed at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Probe with the fixed-delay retry policy.
    pub async fn probe_with_retry(&self, endpoint: &Endpoint) -> Result<StatusRecord, ProbeError> {
        self.retry
            .run(self.probe.cancellation(), |_| self.probe.probe(endpoint))
            .await
    }

    /// Highest block height reported by any of `endpoints`.
    ///
    /// Endpoints are probed concurrently, at most `concurrency` at a time.
    /// One failing or lagging endpoint cannot lower the result; the failures
    /// are returned only when no endpoint answered at all.
    pub async fn network_head(&self, endpoints: &[Endpoint]) -> Result<u64, Vec<EndpointFailure>> {
        let outcomes = bounded(
            self.concurrency,
            endpoints
                .iter()
                .map(move |endpoint| async move { (endpoint, self.probe_with_retry(endpoint).await) }),
        )
        .await;

        let mut head: Option<u64> = None;
        let mut failures = Vec::new();

        for (endpoint, outcome) in outcomes {
            match outcome {
                Ok(status) => {
                    head = Some(head.map_or(status.block_height, |height| height.max(status.block_height)));
                }
                Err(error) => {
                    debug!(endpoint = %endpoint, %error, "Endpoint did not report statistics");
                    failures.push(EndpointFailure::new(endpoint.clone(), error));
                }
            }
        }

        match head {
            Some(height) => {
                if let Some(metrics) = self.probe.metrics() {
                    metrics.set_network_reference_height(height);
                }
                Ok(height)
            }
            None => Err(failures),
        }
    }

    /// Give `endpoint` a verdict against `reference_height`. Never fails:
    /// an endpoint that cannot be probed is [`HealthVerdict::Unreachable`].
    pub async fn assess(&self, endpoint: &Endpoint, reference_height: u64) -> HealthVerdict {
        let verdict = match self.probe_with_retry(endpoint).await {
            Ok(status) => classify(&status, reference_height, self.lagging_threshold),
            Err(error) => {
                debug!(endpoint = %endpoint, %error, "Endpoint unreachable");
                HealthVerdict::Unreachable
            }
        };

        match verdict {
            HealthVerdict::Healthy => debug!(endpoint = %endpoint, "Endpoint is healthy"),
            HealthVerdict::Unreachable => {
                info!(endpoint = %endpoint, "Endpoint unhealthy: failed to get statistics")
            }
            HealthVerdict::BehindNetwork { lag } => info!(
                endpoint = %endpoint,
                lag,
                reference_height,
                allowed = self.lagging_threshold,
                "Endpoint unhealthy: core is behind the network head"
            ),
            HealthVerdict::DataPlaneBehind { lag } => info!(
                endpoint = %endpoint,
                lag,
                allowed = self.lagging_threshold,
                "Endpoint unhealthy: data node is behind core"
            ),
        }

        if let Some(metrics) = self.probe.metrics() {
            metrics.inc_endpoint_health(verdict.label());
        }

        verdict
    }

    pub async fn is_healthy(&self, endpoint: &Endpoint, reference_height: u64) -> bool {
        self.assess(endpoint, reference_height).await.is_healthy()
    }
}
