//! Probing and selection tunables.
//!
//! Every value can be overridden by the embedding application; the defaults
//! are what public networks are operated against.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Blocks an endpoint may trail the network head (or its own data node may
/// trail its core) before it is considered unhealthy.
pub const DEFAULT_LAGGING_THRESHOLD: u64 = 500;

/// A history segment list must reach within this many blocks of the network
/// height to be accepted.
pub const DEFAULT_SEGMENT_FRESHNESS_THRESHOLD: u64 = 350;

/// Timeout applied to every single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Endpoints probed at the same time during health checks.
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 8;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub lagging_threshold: u64,
    pub segment_freshness_threshold: u64,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub max_concurrent_probes: usize,
}

pub const DEFAULT_CLIENT_CONFIG: ClientConfig = ClientConfig {
    lagging_threshold: DEFAULT_LAGGING_THRESHOLD,
    segment_freshness_threshold: DEFAULT_SEGMENT_FRESHNESS_THRESHOLD,
    request_timeout: DEFAULT_REQUEST_TIMEOUT,
    retry: RetryPolicy {
        attempts: DEFAULT_RETRY_ATTEMPTS,
        delay: DEFAULT_RETRY_DELAY,
    },
    max_concurrent_probes: DEFAULT_MAX_CONCURRENT_PROBES,
};

impl Default for ClientConfig {
    fn default() -> Self {
        DEFAULT_CLIENT_CONFIG
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_operated_values() {
        let config = ClientConfig::default();
        assert_eq!(config.lagging_threshold, 500);
        assert_eq!(config.segment_freshness_threshold, 350);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.retry.delay, Duration::from_millis(500));
        assert_eq!(config.max_concurrent_probes, 8);
    }
}
