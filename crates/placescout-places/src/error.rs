use thiserror::Error;

/// Errors returned by the places provider client.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a status other than `OK` or `ZERO_RESULTS`.
    #[error("places API returned {status} for {operation}{}", suffix(.message))]
    Status {
        operation: &'static str,
        status: String,
        message: Option<String>,
    },

    /// Geocoding produced no usable location.
    #[error("no geocoding result for \"{query}\"")]
    NoResults { query: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid places base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

fn suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl GeoError {
    /// `true` for a non-ok provider status, as opposed to a transport or decode failure.
    #[must_use]
    pub fn is_provider_status(&self) -> bool {
        matches!(self, GeoError::Status { .. })
    }
}
