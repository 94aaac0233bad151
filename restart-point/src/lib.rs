pub mod error;
pub mod selector;
pub mod statesync;

pub use error::{DataKind, SelectionError, Stage};
pub use selector::*;
pub use statesync::{ConfigEntry, ConfigKey, ConfigTarget, ConfigValue, StateSyncPatch};
