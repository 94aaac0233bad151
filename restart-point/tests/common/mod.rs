//! Common fixtures for restart point tests

#![allow(dead_code)]

use api_types::{HistorySegment, Snapshot};

/// Snapshot at `height` whose hash encodes the height.
pub fn snapshot(height: u64) -> Snapshot {
    Snapshot::new("v0.73.4", height, format!("hash-{height}"))
}

pub fn snapshots(heights: &[u64]) -> Vec<Snapshot> {
    heights.iter().copied().map(snapshot).collect()
}

/// Segment ending at `to_height`, one thousand blocks long.
pub fn segment(to_height: u64) -> HistorySegment {
    HistorySegment::new(to_height.saturating_sub(1_000), to_height, format!("segment-{to_height}"))
}

pub fn segments(heights: &[u64]) -> Vec<HistorySegment> {
    heights.iter().copied().map(segment).collect()
}

/// Snapshot with no usable height, as published while a snapshot is in progress.
pub fn placeholder_snapshot() -> Snapshot {
    Snapshot {
        core_version: "v0.73.4".to_string(),
        block_height: None,
        block_hash: String::new(),
    }
}

/// Segment whose end height was never recorded.
pub fn placeholder_segment() -> HistorySegment {
    HistorySegment {
        from_height: None,
        to_height: None,
        segment_id: String::new(),
    }
}
