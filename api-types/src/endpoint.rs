use serde::{Deserialize, Serialize};

/// A network address paired with the REST api of the same operator.
///
/// The address itself (an RPC server, a p2p multiaddr, ...) cannot be probed
/// for health directly, so the REST endpoint vouches for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointWithRest {
    pub rest: String,
    pub endpoint: String,
}

impl EndpointWithRest {
    pub fn new(rest: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            rest: rest.into(),
            endpoint: endpoint.into(),
        }
    }
}
