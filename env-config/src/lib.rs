//! Built-in network presets.
//!
//! A preset lists the public REST endpoints of a network and, for state-sync,
//! the RPC servers that are vouched for by those REST endpoints.

use api_types::EndpointWithRest;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkPreset {
    pub name: &'static str,
    pub chain_id: &'static str,
    pub rest_endpoints: &'static [&'static str],
    /// `(rest, rpc server)` pairs.
    pub state_sync_rpc_servers: &'static [(&'static str, &'static str)],
}

impl NetworkPreset {
    pub fn rest_endpoints(&self) -> Vec<String> {
        self.rest_endpoints.iter().map(|url| url.to_string()).collect()
    }

    /// Whether `chain_id`, as reported by an endpoint, belongs to this network.
    pub fn is_chain(&self, chain_id: &str) -> bool {
        self.chain_id == chain_id.trim()
    }

    pub fn state_sync_rpc_servers(&self) -> Vec<EndpointWithRest> {
        self.state_sync_rpc_servers
            .iter()
            .map(|(rest, endpoint)| EndpointWithRest::new(*rest, *endpoint))
            .collect()
    }
}

pub const MAINNET: NetworkPreset = NetworkPreset {
    name: "mainnet",
    chain_id: "vega-mainnet-0011",
    rest_endpoints: &[
        "https://api1.vega.community",
        "https://api2.vega.community",
        "https://api3.vega.community",
    ],
    state_sync_rpc_servers: &[
        ("https://api0.vega.community", "api0.vega.community:26657"),
        ("https://api1.vega.community", "api1.vega.community:26657"),
        ("https://api2.vega.community", "api2.vega.community:26657"),
        ("https://api3.vega.community", "api3.vega.community:26657"),
    ],
};

pub const PRESETS: &[NetworkPreset] = &[MAINNET];

pub fn preset(name: &str) -> Option<NetworkPreset> {
    PRESETS
        .iter()
        .copied()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}
