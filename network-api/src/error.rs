use std::{fmt, num::ParseIntError, time::Duration};

use thiserror::Error;

use crate::{endpoint::Endpoint, health::HealthVerdict, transport::TransportError};

/// Failure of a single request to a single endpoint.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("request to {url} was cancelled")]
    Cancelled { url: String },
    #[error("invalid response code from {url}: expected 2xx, got {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decode response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {field} {value:?} from {url}: {source}")]
    InvalidNumber {
        url: String,
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid {field} {value:?} from {url}: {source}")]
    InvalidTimestamp {
        url: String,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error(
        "history segments of {endpoint} are stale: newest ends at {newest:?}, \
         network height {network_height}, allowed lag {threshold}"
    )]
    StaleSegments {
        endpoint: Endpoint,
        newest: Option<u64>,
        network_height: u64,
        threshold: u64,
    },
}

impl ProbeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled { .. } => "cancelled",
            Self::Status { .. } => "status",
            Self::Malformed { .. } => "malformed",
            Self::InvalidNumber { .. } => "invalid_number",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::StaleSegments { .. } => "stale",
        }
    }
}

#[derive(Debug)]
pub struct EndpointFailure {
    pub endpoint: Endpoint,
    pub error: ProbeError,
}

impl EndpointFailure {
    pub fn new(endpoint: Endpoint, error: ProbeError) -> Self {
        Self { endpoint, error }
    }
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.error)
    }
}

/// Every endpoint was tried and every one failed.
///
/// Keeps one entry per endpoint, in the order they were tried.
#[derive(Debug, Error)]
pub struct AggregateEndpointError {
    failures: Vec<EndpointFailure>,
}

impl AggregateEndpointError {
    pub fn new(failures: Vec<EndpointFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[EndpointFailure] {
        &self.failures
    }

}

impl fmt::Display for AggregateEndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} endpoints failed", self.failures.len())?;
        for (index, failure) in self.failures.iter().enumerate() {
            write!(f, "\n  {}. {failure}", index + 1)?;
        }
        Ok(())
    }
}

/// Endpoint dropped by health filtering, with the reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedEndpoint {
    pub endpoint: Endpoint,
    pub verdict: HealthVerdict,
}

impl RejectedEndpoint {
    pub fn new(endpoint: Endpoint, verdict: HealthVerdict) -> Self {
        Self { endpoint, verdict }
    }
}

impl fmt::Display for RejectedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.verdict)
    }
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid network client configuration: {0}")]
    Configuration(String),
    #[error("no healthy endpoint found for the network: {reason}{}", list_rejected(.rejected))]
    NoHealthyEndpoint {
        reason: String,
        /// Endpoints that could not be probed at all.
        failures: Vec<EndpointFailure>,
        /// Endpoints judged unhealthy against the network head.
        rejected: Vec<RejectedEndpoint>,
    },
    #[error(transparent)]
    AllEndpointsFailed(#[from] AggregateEndpointError),
    #[error("operation cancelled")]
    Cancelled,
}

fn list_rejected(rejected: &[RejectedEndpoint]) -> String {
    rejected
        .iter()
        .enumerate()
        .map(|(index, entry)| format!("\n  {}. {entry}", index + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(url: &str) -> Endpoint {
        Endpoint::parse(url).unwrap()
    }

    #[test]
    fn test_aggregate_lists_every_failure() {
        let error = AggregateEndpointError::new(vec![
            EndpointFailure::new(
                endpoint("https://a.example.com"),
                ProbeError::Status {
                    url: "https://a.example.com/statistics".to_string(),
                    status: 502,
                },
            ),
            EndpointFailure::new(
                endpoint("https://b.example.com"),
                ProbeError::Timeout {
                    url: "https://b.example.com/statistics".to_string(),
                    timeout: Duration::from_secs(5),
                },
            ),
        ]);

        assert_eq!(error.failures().len(), 2);
        assert_eq!(error.failures()[1].error.kind(), "timeout");

        let rendered = error.to_string();
        assert!(rendered.starts_with("all 2 endpoints failed"));
        assert!(rendered.contains("1. https://a.example.com: invalid response code"));
        assert!(rendered.contains("2. https://b.example.com: request to"));
    }

    #[test]
    fn test_network_error_is_transparent_over_aggregate() {
        let error: NetworkError = AggregateEndpointError::new(Vec::new()).into();
        assert_eq!(error.to_string(), "all 0 endpoints failed");
    }

    #[test]
    fn test_no_healthy_endpoint_lists_rejections() {
        let error = NetworkError::NoHealthyEndpoint {
            reason: "no endpoint is within 500 blocks of the network head 10000".to_string(),
            failures: Vec::new(),
            rejected: vec![
                RejectedEndpoint::new(endpoint("https://a.example.com"), HealthVerdict::BehindNetwork { lag: 900 }),
                RejectedEndpoint::new(endpoint("https://b.example.com"), HealthVerdict::DataPlaneBehind { lag: 600 }),
            ],
        };

        let rendered = error.to_string();
        assert!(rendered.contains("1. https://a.example.com: core is 900 blocks behind the network head"));
        assert!(rendered.contains("2. https://b.example.com: data node is 600 blocks behind core"));
    }
}
