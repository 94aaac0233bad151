//! Restart point selection.
//!
//! Combines two independently sourced lists, core snapshots and history
//! segments, into the one `(height, hash)` pair a node can state-sync from.
//!
//! The newest history segments may not be replicated across the content
//! store yet, so the selection anchors on the third highest segment and
//! takes the highest snapshot that is not newer than it.

use api_types::{HistorySegment, RestartPoint, Snapshot};
use tracing::debug;

use crate::error::{DataKind, SelectionError, Stage};

/// Minimum number of snapshots and of segments, both as received and after
/// dropping placeholders.
pub const MIN_CANDIDATES: usize = 3;

/// Zero based rank of the anchoring segment in descending `to_height` order.
pub const ANCHOR_SEGMENT_INDEX: usize = 2;

pub fn select(snapshots: &[Snapshot], segments: &[HistorySegment]) -> Result<RestartPoint, SelectionError> {
    ensure_enough(DataKind::Snapshots, Stage::Raw, snapshots.len())?;
    ensure_enough(DataKind::Segments, Stage::Raw, segments.len())?;

    let mut snapshots: Vec<(u64, &Snapshot)> = snapshots
        .iter()
        .filter(|snapshot| snapshot.is_valid())
        .filter_map(|snapshot| snapshot.block_height.map(|height| (height, snapshot)))
        .collect();

    let mut segments: Vec<(u64, &HistorySegment)> = segments
        .iter()
        .filter_map(|segment| segment.end_height().map(|height| (height, segment)))
        .collect();

    ensure_enough(DataKind::Snapshots, Stage::Filtered, snapshots.len())?;
    ensure_enough(DataKind::Segments, Stage::Filtered, segments.len())?;

    // Stable sorts: equal heights keep their input order.
    snapshots.sort_by(|(left, _), (right, _)| right.cmp(left));
    segments.sort_by(|(left, _), (right, _)| right.cmp(left));

    let (segment_height, segment) = segments[ANCHOR_SEGMENT_INDEX];
    debug!(
        segment_height,
        segment_id = %segment.segment_id,
        "Anchoring restart on history segment"
    );

    let (trust_height, snapshot) = snapshots
        .iter()
        .find(|(height, _)| *height <= segment_height)
        .copied()
        .ok_or(SelectionError::NoTrustableSnapshot { segment_height })?;

    debug!(
        trust_height,
        trust_hash = %snapshot.block_hash,
        core_version = %snapshot.core_version,
        "Selected snapshot for restart"
    );

    Ok(RestartPoint {
        trust_height,
        trust_hash: snapshot.block_hash.clone(),
    })
}

fn ensure_enough(kind: DataKind, stage: Stage, found: usize) -> Result<(), SelectionError> {
    if found < MIN_CANDIDATES {
        return Err(SelectionError::InsufficientData {
            kind,
            stage,
            required: MIN_CANDIDATES,
            found,
        });
    }
    Ok(())
}
