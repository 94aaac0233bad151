use serde::{Deserialize, Serialize};

use crate::serde_helpers::optional_quoted_u64;

/// Archived range of history published for bulk download by late joiners.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySegment {
    #[serde(default, with = "optional_quoted_u64")]
    pub from_height: Option<u64>,
    #[serde(default, with = "optional_quoted_u64")]
    pub to_height: Option<u64>,
    #[serde(default, rename = "historySegmentId")]
    pub segment_id: String,
}

impl HistorySegment {
    pub fn new(from_height: u64, to_height: u64, segment_id: impl Into<String>) -> Self {
        Self {
            from_height: Some(from_height),
            to_height: Some(to_height),
            segment_id: segment_id.into(),
        }
    }

    /// Upper bound of the segment, `None` for placeholder entries.
    pub fn end_height(&self) -> Option<u64> {
        self.to_height.filter(|height| *height > 0)
    }

    pub fn is_valid(&self) -> bool {
        self.end_height().is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Deserialize)]
pub struct HistorySegmentsResponse {
    #[serde(default)]
    pub segments: Vec<HistorySegment>,
}
