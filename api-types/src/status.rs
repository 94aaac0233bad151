use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the `/statistics` resource.
#[derive(Clone, Debug, PartialEq, Eq, Default, Deserialize)]
pub struct StatisticsResponse {
    pub statistics: RawStatistics,
}

/// Statistics exactly as the endpoint reports them. Numbers and timestamps
/// are still strings here; the probe turns them into a [`StatusRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatistics {
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub block_height: String,
    #[serde(default)]
    pub current_time: String,
    #[serde(default)]
    pub vega_time: String,
}

/// Normalized status of a single endpoint, produced by one probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub chain_id: String,
    pub app_version: String,
    /// Height of the chain as seen by the endpoint's core node.
    pub block_height: u64,
    /// Height the endpoint's data node has processed, `0` when not reported.
    pub data_plane_height: u64,
    /// Wall clock time of the endpoint.
    pub current_time: DateTime<Utc>,
    /// Time of the latest block.
    pub reference_time: DateTime<Utc>,
}

impl StatusRecord {
    pub fn has_data_plane_height(&self) -> bool {
        self.data_plane_height > 0
    }

    /// Number of blocks the data node trails the core node, if it reports one.
    pub fn data_plane_lag(&self) -> Option<u64> {
        self.has_data_plane_height()
            .then(|| self.block_height.saturating_sub(self.data_plane_height))
    }
}
