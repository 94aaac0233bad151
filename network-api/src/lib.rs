//! Probing of REST endpoints for the node bootstrap flow.
//!
//! - **Probe**: fetches and normalizes the statistics, snapshots and history
//!   segments of a single endpoint
//! - **Health filter**: decides whether an endpoint keeps up with the network
//! - **Client**: holds the endpoint set and falls back across endpoints for
//!   every read
//!
//! Retries live in the health layer only. Read operations use endpoint
//! fallback instead, so one unreachable endpoint costs one timeout, not three.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod health;
pub mod probe;
pub mod retry;
pub mod transport;

pub use client::{NetworkClient, NetworkClientBuilder};
pub use config::*;
pub use endpoint::Endpoint;
pub use error::{AggregateEndpointError, EndpointFailure, NetworkError, ProbeError, RejectedEndpoint};
pub use health::{EndpointHealthFilter, HealthVerdict};
pub use probe::{Resource, StatisticsProbe};
pub use retry::RetryPolicy;
pub use tokio_util::sync::CancellationToken;
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};

#[cfg(test)]
mod tests;
