use std::{fmt, str::FromStr};

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("invalid endpoint url {endpoint:?}: {source}")]
    InvalidUrl {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("endpoint {endpoint:?} must use http or https")]
    UnsupportedScheme { endpoint: String },
}

/// Base URL of one peer's REST api.
///
/// Stored without a trailing slash so resource paths can be appended.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let normalized = raw.trim().trim_end_matches('/');

        let url = Url::parse(normalized).map_err(|source| EndpointError::InvalidUrl {
            endpoint: raw.to_string(),
            source,
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(EndpointError::UnsupportedScheme {
                endpoint: raw.to_string(),
            });
        }

        Ok(Self(normalized.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL of a resource below this endpoint.
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_are_dropped() {
        let endpoint = Endpoint::parse(" https://api1.example.com// ").unwrap();
        assert_eq!(endpoint.as_str(), "https://api1.example.com");
        assert_eq!(
            endpoint.join("/api/v2/snapshots"),
            "https://api1.example.com/api/v2/snapshots"
        );
    }

    #[test]
    fn test_path_prefix_is_kept() {
        let endpoint: Endpoint = "http://127.0.0.1:3008/rest/".parse().unwrap();
        assert_eq!(endpoint.join("statistics"), "http://127.0.0.1:3008/rest/statistics");
    }

    #[test]
    fn test_rejects_invalid_urls() {
        assert!(matches!(
            Endpoint::parse("api1.example.com"),
            Err(EndpointError::InvalidUrl { .. })
        ));
        assert!(matches!(
            Endpoint::parse("ftp://api1.example.com"),
            Err(EndpointError::UnsupportedScheme { .. })
        ));
    }
}
