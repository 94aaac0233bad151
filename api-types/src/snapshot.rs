use serde::{Deserialize, Serialize};

use crate::serde_helpers::optional_quoted_u64;

/// Core state checkpoint advertised by a peer.
///
/// Servers are known to emit placeholder entries, so the height may be
/// missing and the hash may be empty. Such snapshots are kept as received and
/// must be dropped with [`Snapshot::is_valid`] before they are used.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub core_version: String,
    #[serde(default, with = "optional_quoted_u64")]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub block_hash: String,
}

impl Snapshot {
    pub fn new(core_version: impl Into<String>, block_height: u64, block_hash: impl Into<String>) -> Self {
        Self {
            core_version: core_version.into(),
            block_height: Some(block_height),
            block_hash: block_hash.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.block_height.is_some() && !self.block_hash.is_empty()
    }
}

/// Body of the snapshots resource: a connection-style edge list.
#[derive(Clone, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreSnapshotsResponse {
    #[serde(default)]
    pub core_snapshots: SnapshotConnection,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Deserialize)]
pub struct SnapshotConnection {
    #[serde(default)]
    pub edges: Vec<SnapshotEdge>,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Deserialize)]
pub struct SnapshotEdge {
    pub node: Snapshot,
}

impl CoreSnapshotsResponse {
    pub fn into_snapshots(self) -> Vec<Snapshot> {
        self.core_snapshots
            .edges
            .into_iter()
            .map(|edge| edge.node)
            .collect()
    }
}
