use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataKind {
    Snapshots,
    Segments,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Snapshots => f.write_str("snapshots"),
            DataKind::Segments => f.write_str("network history segments"),
        }
    }
}

/// Whether a count was taken on the list as received or after placeholder
/// entries were dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Raw,
    Filtered,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Raw => f.write_str("received"),
            Stage::Filtered => f.write_str("valid after filtering"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error(
        "not enough {kind} for restart: required at least {required}, {found} {stage}; \
         retry later when the network has published more"
    )]
    InsufficientData {
        kind: DataKind,
        stage: Stage,
        required: usize,
        found: usize,
    },
    #[error("failed to find snapshot at or below block {segment_height} (third highest history segment)")]
    NoTrustableSnapshot { segment_height: u64 },
}
