// The REST api transmits every height as a decimal string.

use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serializer};

/// Decimal string height where an empty string (or a missing / null field
/// when combined with `#[serde(default)]`) decodes as `None`.
///
/// Servers publish placeholder entries with empty heights; those are not
/// parse errors; callers filter them out later. Anything else that is not a
/// decimal `u64` is still rejected.
pub mod optional_quoted_u64 {
    use super::{Deserialize, Deserializer, SerdeError, Serializer};

    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&value.to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(value) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };

        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        trimmed
            .parse::<u64>()
            .map(Some)
            .map_err(|err| SerdeError::custom(format!("invalid u64 {value:?}: {err}")))
    }
}
