//! State-sync configuration derived from a restart point.
//!
//! The node binaries are configured by patching their config files. The
//! patch is kept typed here so a misspelt key is a compile error rather than
//! a silently ignored setting; writing it out is left to the caller.

use api_types::RestartPoint;
use serde::Serialize;

/// How long the consensus engine trusts the restart point's validator set.
pub const DEFAULT_TRUST_PERIOD: &str = "672h0m0s";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigTarget {
    /// Consensus engine config (`config/config.toml`).
    Tendermint,
    /// Data node config.
    DataNode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    StateSyncEnable,
    StateSyncTrustHeight,
    StateSyncTrustHash,
    StateSyncTrustPeriod,
    StateSyncRpcServers,
    AutoInitialiseFromNetworkHistory,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::StateSyncEnable => "statesync.enable",
            ConfigKey::StateSyncTrustHeight => "statesync.trust_height",
            ConfigKey::StateSyncTrustHash => "statesync.trust_hash",
            ConfigKey::StateSyncTrustPeriod => "statesync.trust_period",
            ConfigKey::StateSyncRpcServers => "statesync.rpc_servers",
            ConfigKey::AutoInitialiseFromNetworkHistory => "AutoInitialiseFromNetworkHistory",
        }
    }

    pub fn target(&self) -> ConfigTarget {
        match self {
            ConfigKey::AutoInitialiseFromNetworkHistory => ConfigTarget::DataNode,
            _ => ConfigTarget::Tendermint,
        }
    }
}

impl Serialize for ConfigKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(u64),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub target: ConfigTarget,
    pub key: ConfigKey,
    pub value: ConfigValue,
}

impl ConfigEntry {
    fn new(key: ConfigKey, value: ConfigValue) -> Self {
        Self {
            target: key.target(),
            key,
            value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateSyncPatch {
    pub restart_point: RestartPoint,
    pub rpc_servers: Vec<String>,
    pub trust_period: String,
}

impl StateSyncPatch {
    pub fn new(restart_point: RestartPoint, rpc_servers: Vec<String>) -> Self {
        Self {
            restart_point,
            rpc_servers,
            trust_period: DEFAULT_TRUST_PERIOD.to_string(),
        }
    }

    pub fn with_trust_period(mut self, trust_period: impl Into<String>) -> Self {
        self.trust_period = trust_period.into();
        self
    }

    pub fn entries(&self) -> Vec<ConfigEntry> {
        vec![
            ConfigEntry::new(ConfigKey::StateSyncEnable, ConfigValue::Bool(true)),
            ConfigEntry::new(
                ConfigKey::StateSyncTrustHeight,
                ConfigValue::Integer(self.restart_point.trust_height),
            ),
            ConfigEntry::new(
                ConfigKey::StateSyncTrustHash,
                ConfigValue::Text(self.restart_point.trust_hash.clone()),
            ),
            ConfigEntry::new(
                ConfigKey::StateSyncTrustPeriod,
                ConfigValue::Text(self.trust_period.clone()),
            ),
            ConfigEntry::new(
                ConfigKey::StateSyncRpcServers,
                ConfigValue::Text(self.rpc_servers.join(",")),
            ),
            ConfigEntry::new(ConfigKey::AutoInitialiseFromNetworkHistory, ConfigValue::Bool(true)),
        ]
    }

    pub fn entries_for(&self, target: ConfigTarget) -> Vec<ConfigEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.target == target)
            .collect()
    }
}
