use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Block height and hash a state-syncing node trusts as its starting point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPoint {
    pub trust_height: u64,
    pub trust_hash: String,
}

impl Display for RestartPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "height={} hash={}", self.trust_height, self.trust_hash)
    }
}
