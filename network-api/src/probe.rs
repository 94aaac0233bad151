use std::time::Duration;

use api_types::{
    CoreSnapshotsResponse, HistorySegment, HistorySegmentsResponse, RawStatistics, Snapshot,
    StatisticsResponse, StatusRecord,
};
use chrono::{DateTime, Utc};
use metrics::SharedMetrics;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{
    endpoint::Endpoint,
    error::ProbeError,
    transport::{HttpResponse, HttpTransport},
};

/// Response header carrying the height the endpoint's data node has
/// processed.
pub const DATA_PLANE_HEIGHT_HEADER: &str = "x-block-height";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Statistics,
    Snapshots,
    HistorySegments,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Statistics => "statistics",
            Resource::Snapshots => "api/v2/snapshots",
            Resource::HistorySegments => "api/v2/networkhistory/segments",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Resource::Statistics => "statistics",
            Resource::Snapshots => "snapshots",
            Resource::HistorySegments => "history_segments",
        }
    }
}

/// Reads the REST resources of one endpoint at a time.
///
/// Every request is bounded by the request timeout and aborted as soon as
/// the cancellation token fires.
pub struct StatisticsProbe<T> {
    transport: T,
    timeout: Duration,
    cancel: CancellationToken,
    metrics: Option<SharedMetrics>,
}

impl<T: HttpTransport> StatisticsProbe<T> {
    pub fn new(transport: T, timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            transport,
            timeout,
            cancel,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<SharedMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn metrics(&self) -> Option<&SharedMetrics> {
        self.metrics.as_ref()
    }

    /// Query the statistics resource and normalize it.
    pub async fn probe(&self, endpoint: &Endpoint) -> Result<StatusRecord, ProbeError> {
        let result = self.fetch_statistics(endpoint).await;
        self.record(Resource::Statistics, &result);
        result
    }

    /// Snapshots as advertised, placeholders included.
    pub async fn snapshots(&self, endpoint: &Endpoint) -> Result<Vec<Snapshot>, ProbeError> {
        let result = self
            .fetch::<CoreSnapshotsResponse>(Resource::Snapshots, endpoint)
            .await
            .map(|(response, _)| response.into_snapshots());
        self.record(Resource::Snapshots, &result);
        result
    }

    /// History segments as advertised, placeholders included.
    pub async fn history_segments(&self, endpoint: &Endpoint) -> Result<Vec<HistorySegment>, ProbeError> {
        let result = self
            .fetch::<HistorySegmentsResponse>(Resource::HistorySegments, endpoint)
            .await
            .map(|(response, _)| response.segments);
        self.record(Resource::HistorySegments, &result);
        result
    }

    async fn fetch_statistics(&self, endpoint: &Endpoint) -> Result<StatusRecord, ProbeError> {
        let url = endpoint.join(Resource::Statistics.path());
        let (response, raw) = self
            .fetch::<StatisticsResponse>(Resource::Statistics, endpoint)
            .await?;

        let status = parse_status(&url, response.statistics, raw.header(DATA_PLANE_HEIGHT_HEADER))?;

        debug!(
            endpoint = %endpoint,
            chain_id = %status.chain_id,
            block_height = status.block_height,
            data_plane_height = status.data_plane_height,
            "Probed endpoint statistics"
        );

        Ok(status)
    }

    async fn fetch<R: DeserializeOwned>(
        &self,
        resource: Resource,
        endpoint: &Endpoint,
    ) -> Result<(R, HttpResponse), ProbeError> {
        let url = endpoint.join(resource.path());
        let response = self.get(&url).await?;

        let decoded = serde_json::from_slice(&response.body).map_err(|source| ProbeError::Malformed {
            url: url.clone(),
            source,
        })?;

        Ok((decoded, response))
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, ProbeError> {
        if self.cancel.is_cancelled() {
            return Err(ProbeError::Cancelled { url: url.to_string() });
        }

        trace!(url, "GET");

        let response = tokio::select! {
            _ = self.cancel.cancelled() => {
                return Err(ProbeError::Cancelled { url: url.to_string() });
            }
            response = tokio::time::timeout(self.timeout, self.transport.get(url)) => response,
        };

        let response = response
            .map_err(|_| ProbeError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|source| ProbeError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !response.is_success() {
            return Err(ProbeError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(response)
    }

    fn record<R>(&self, resource: Resource, result: &Result<R, ProbeError>) {
        if let Some(metrics) = &self.metrics {
            let outcome = match result {
                Ok(_) => "ok",
                Err(error) => error.kind(),
            };
            metrics.inc_probe_request(resource.label(), outcome);
        }
    }
}

/// Turn the string encoded statistics into a [`StatusRecord`].
///
/// `data_plane_height` is the raw header value; absent or blank means the
/// endpoint does not report one.
pub fn parse_status(
    url: &str,
    raw: RawStatistics,
    data_plane_height: Option<&str>,
) -> Result<StatusRecord, ProbeError> {
    let block_height = parse_height(url, "blockHeight", &raw.block_height)?;

    let data_plane_height = match data_plane_height.map(str::trim) {
        None | Some("") => 0,
        Some(value) => parse_height(url, DATA_PLANE_HEIGHT_HEADER, value)?,
    };

    Ok(StatusRecord {
        chain_id: raw.chain_id,
        app_version: raw.app_version,
        block_height,
        data_plane_height,
        current_time: parse_timestamp(url, "currentTime", &raw.current_time)?,
        reference_time: parse_timestamp(url, "vegaTime", &raw.vega_time)?,
    })
}

fn parse_height(url: &str, field: &'static str, value: &str) -> Result<u64, ProbeError> {
    value.trim().parse::<u64>().map_err(|source| ProbeError::InvalidNumber {
        url: url.to_string(),
        field,
        value: value.to_string(),
        source,
    })
}

fn parse_timestamp(url: &str, field: &'static str, value: &str) -> Result<DateTime<Utc>, ProbeError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|time| time.with_timezone(&Utc))
        .map_err(|source| ProbeError::InvalidTimestamp {
            url: url.to_string(),
            field,
            value: value.to_string(),
            source,
        })
}
