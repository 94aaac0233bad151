pub mod endpoint;
pub mod restart;
pub mod segment;
pub mod serde_helpers;
pub mod snapshot;
pub mod status;

pub use endpoint::EndpointWithRest;
pub use restart::RestartPoint;
pub use segment::{HistorySegment, HistorySegmentsResponse};
pub use snapshot::{CoreSnapshotsResponse, Snapshot};
pub use status::{RawStatistics, StatisticsResponse, StatusRecord};
