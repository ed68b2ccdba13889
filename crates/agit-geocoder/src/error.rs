use thiserror::Error;

/// Errors returned by [`crate::KakaoGeocoder`].
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The query resolved to no address or coordinate.
    #[error("no geocoding result for {0}")]
    NotFound(String),

    /// The REST API key was rejected.
    #[error("geocoding API rejected the configured key")]
    Unauthorized,

    /// The client could not be configured (bad base URL).
    #[error("invalid geocoder configuration: {0}")]
    InvalidConfig(String),

    /// Network or TLS failure, timeout, or non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response parsed but held values that are not usable coordinates.
    #[error("invalid geocoding response: {0}")]
    InvalidResponse(String),
}

impl GeocodeError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
