use std::future::Future;

use api_types::{EndpointWithRest, HistorySegment, Snapshot, StatusRecord};
use metrics::SharedMetrics;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::ClientConfig,
    endpoint::Endpoint,
    error::{AggregateEndpointError, EndpointFailure, NetworkError, ProbeError, RejectedEndpoint},
    health::{bounded, EndpointHealthFilter},
    probe::StatisticsProbe,
    transport::HttpTransport,
};

/// Client over a fixed set of REST endpoints.
///
/// Every read tries the endpoints in order and returns the first success.
/// When built with `restrict_to_healthy`, endpoints that trail the network
/// are dropped once, at build time.
pub struct NetworkClient<T> {
    probe: StatisticsProbe<T>,
    endpoints: Vec<Endpoint>,
    config: ClientConfig,
    reference_height: Option<u64>,
}

pub struct NetworkClientBuilder<T> {
    transport: T,
    endpoints: Vec<String>,
    restrict_to_healthy: bool,
    config: ClientConfig,
    cancel: CancellationToken,
    metrics: Option<SharedMetrics>,
}

impl<T: HttpTransport> NetworkClientBuilder<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            endpoints: Vec::new(),
            restrict_to_healthy: false,
            config: ClientConfig::default(),
            cancel: CancellationToken::new(),
            metrics: None,
        }
    }

    pub fn endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints.extend(endpoints.into_iter().map(Into::into));
        self
    }

    pub fn restrict_to_healthy(mut self, restrict: bool) -> Self {
        self.restrict_to_healthy = restrict;
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Token that aborts in-flight requests and retry delays of the client.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn build(self) -> Result<NetworkClient<T>, NetworkError> {
        if self.endpoints.is_empty() {
            return Err(NetworkError::Configuration(
                "at least one REST endpoint is required".to_string(),
            ));
        }

        let mut endpoints = self
            .endpoints
            .iter()
            .map(|raw| Endpoint::parse(raw).map_err(|err| NetworkError::Configuration(err.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        let probe = StatisticsProbe::new(self.transport, self.config.request_timeout, self.cancel)
            .with_metrics(self.metrics);

        let mut reference_height = None;

        if self.restrict_to_healthy {
            let filter = EndpointHealthFilter::from_config(&probe, &self.config);

            let head = match filter.network_head(&endpoints).await {
                Ok(head) => head,
                Err(_) if probe.cancellation().is_cancelled() => return Err(NetworkError::Cancelled),
                Err(failures) => {
                    return Err(NetworkError::NoHealthyEndpoint {
                        reason: "every endpoint failed to report statistics".to_string(),
                        failures,
                        rejected: Vec::new(),
                    });
                }
            };

            info!(height = head, endpoints = endpoints.len(), "Determined network head");

            let verdicts = bounded(
                self.config.max_concurrent_probes,
                endpoints.iter().map(|endpoint| filter.assess(endpoint, head)),
            )
            .await;

            if probe.cancellation().is_cancelled() {
                return Err(NetworkError::Cancelled);
            }

            let mut rejected = Vec::new();
            endpoints = endpoints
                .into_iter()
                .zip(verdicts)
                .filter_map(|(endpoint, verdict)| {
                    if verdict.is_healthy() {
                        Some(endpoint)
                    } else {
                        rejected.push(RejectedEndpoint::new(endpoint, verdict));
                        None
                    }
                })
                .collect();

            if endpoints.is_empty() {
                return Err(NetworkError::NoHealthyEndpoint {
                    reason: format!(
                        "no endpoint is within {} blocks of the network head {head}",
                        self.config.lagging_threshold
                    ),
                    failures: Vec::new(),
                    rejected,
                });
            }

            info!(healthy = endpoints.len(), "Restricted client to healthy endpoints");
            reference_height = Some(head);
        }

        if let Some(metrics) = probe.metrics() {
            metrics.set_healthy_endpoints(endpoints.len());
        }

        Ok(NetworkClient {
            probe,
            endpoints,
            config: self.config,
            reference_height,
        })
    }
}

impl<T: HttpTransport> NetworkClient<T> {
    pub fn builder(transport: T) -> NetworkClientBuilder<T> {
        NetworkClientBuilder::new(transport)
    }

    /// Build a client with the default configuration.
    pub async fn new<I, S>(transport: T, endpoints: I, restrict_to_healthy: bool) -> Result<Self, NetworkError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder(transport)
            .endpoints(endpoints)
            .restrict_to_healthy(restrict_to_healthy)
            .build()
            .await
    }

    /// Endpoints the client talks to, in fallback order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Network head determined while filtering for healthy endpoints.
    pub fn reference_height(&self) -> Option<u64> {
        self.reference_height
    }

    pub async fn statistics(&self) -> Result<StatusRecord, NetworkError> {
        self.first_success("statistics", move |endpoint| async move { self.probe.probe(&endpoint).await })
            .await
    }

    pub async fn snapshots(&self) -> Result<Vec<Snapshot>, NetworkError> {
        self.first_success("snapshots", move |endpoint| async move { self.probe.snapshots(&endpoint).await })
            .await
    }

    /// History segments from the first endpoint whose list reaches close
    /// enough to `network_height`. A lagging or slow-to-archive endpoint is
    /// treated as failed and the next one is asked.
    pub async fn history_segments(&self, network_height: u64) -> Result<Vec<HistorySegment>, NetworkError> {
        let threshold = self.config.segment_freshness_threshold;

        self.first_success("history_segments", move |endpoint| {
            self.fresh_history_segments(endpoint, network_height, threshold)
        })
        .await
    }

    /// Highest block height across the client's endpoints.
    ///
    /// Reuses the head found at build time when the client was restricted to
    /// healthy endpoints, otherwise probes every endpoint.
    pub async fn network_head(&self) -> Result<u64, NetworkError> {
        if let Some(height) = self.reference_height {
            return Ok(height);
        }

        let filter = EndpointHealthFilter::from_config(&self.probe, &self.config);
        match filter.network_head(&self.endpoints).await {
            Ok(head) => Ok(head),
            Err(_) if self.probe.cancellation().is_cancelled() => Err(NetworkError::Cancelled),
            Err(failures) => Err(NetworkError::NoHealthyEndpoint {
                reason: "failed to get network statistics for the network head".to_string(),
                failures,
                rejected: Vec::new(),
            }),
        }
    }

    /// Companion endpoints whose REST api is healthy against the current
    /// network head, in the order given.
    pub async fn healthy_endpoints(&self, candidates: &[EndpointWithRest]) -> Result<Vec<String>, NetworkError> {
        let head = self.network_head().await?;
        let filter = EndpointHealthFilter::from_config(&self.probe, &self.config);

        let filter = &filter;
        let checks = candidates.iter().map(move |candidate| async move {
            match Endpoint::parse(&candidate.rest) {
                Ok(rest) => filter.is_healthy(&rest, head).await,
                Err(err) => {
                    warn!(endpoint = %candidate.endpoint, %err, "Skipping endpoint with invalid REST url");
                    false
                }
            }
        });
        let verdicts = bounded(self.config.max_concurrent_probes, checks).await;

        if self.probe.cancellation().is_cancelled() {
            return Err(NetworkError::Cancelled);
        }

        Ok(candidates
            .iter()
            .zip(verdicts)
            .filter_map(|(candidate, healthy)| healthy.then(|| candidate.endpoint.clone()))
            .collect())
    }

    async fn fresh_history_segments(
        &self,
        endpoint: Endpoint,
        network_height: u64,
        threshold: u64,
    ) -> Result<Vec<HistorySegment>, ProbeError> {
        let segments = self.probe.history_segments(&endpoint).await?;

        if !has_fresh_segment(&segments, network_height, threshold) {
            return Err(ProbeError::StaleSegments {
                newest: segments.iter().filter_map(HistorySegment::end_height).max(),
                endpoint,
                network_height,
                threshold,
            });
        }

        Ok(segments)
    }

    async fn first_success<R, F, Fut>(&self, operation: &'static str, request: F) -> Result<R, NetworkError>
    where
        F: Fn(Endpoint) -> Fut,
        Fut: Future<Output = Result<R, ProbeError>>,
    {
        let mut failures = Vec::new();

        for endpoint in &self.endpoints {
            if self.probe.cancellation().is_cancelled() {
                return Err(NetworkError::Cancelled);
            }

            match request(endpoint.clone()).await {
                Ok(result) => {
                    debug!(endpoint = %endpoint, operation, "Endpoint answered");
                    return Ok(result);
                }
                Err(error) if error.is_cancelled() => return Err(NetworkError::Cancelled),
                Err(error) => {
                    warn!(endpoint = %endpoint, operation, %error, "Endpoint failed, trying next");
                    failures.push(EndpointFailure::new(endpoint.clone(), error));
                }
            }
        }

        Err(AggregateEndpointError::new(failures).into())
    }
}

/// Whether any valid segment ends within `threshold` blocks of
/// `network_height`. Below `threshold` every valid segment counts as fresh.
pub fn has_fresh_segment(segments: &[HistorySegment], network_height: u64, threshold: u64) -> bool {
    let oldest_fresh = network_height.saturating_sub(threshold);
    segments
        .iter()
        .filter_map(HistorySegment::end_height)
        .any(|to_height| to_height >= oldest_fresh)
}
