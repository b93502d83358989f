//! HTTP client for a Places-style REST API.
//!
//! Wraps `reqwest` with API key management, transient-error retry, and typed
//! envelope handling. Every endpoint checks the `"status"` field of the JSON
//! envelope: `OK` and `ZERO_RESULTS` pass, anything else becomes
//! [`GeoError::Status`].

use std::time::Duration;

use async_trait::async_trait;
use placescout_core::{AppConfig, LatLng, PlaceId};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::GeoError;
use crate::normalize::normalize_places;
use crate::provider::{DetailField, GeoProvider, NearbyPage, NearbyRequest, PlaceDetails};
use crate::retry::retry_with_backoff;
use crate::types::{
    DetailsResponse, GeocodeResponse, NearbySearchResponse, STATUS_OK, STATUS_ZERO_RESULTS,
};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/";

pub(crate) const NEARBY_PATH: &str = "place/nearbysearch/json";
pub(crate) const DETAILS_PATH: &str = "place/details/json";
pub(crate) const GEOCODE_PATH: &str = "geocode/json";

/// Common accessors over the `{"status": ..., "error_message": ...}` envelope.
pub(crate) trait Envelope {
    fn status(&self) -> &str;
    fn error_message(&self) -> Option<&str>;
}

impl Envelope for NearbySearchResponse {
    fn status(&self) -> &str {
        &self.status
    }
    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

impl Envelope for DetailsResponse {
    fn status(&self) -> &str {
        &self.status
    }
    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

impl Envelope for GeocodeResponse {
    fn status(&self) -> &str {
        &self.status
    }
    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Client for the places REST API.
///
/// Use [`PlacesClient::new`] for production or [`PlacesClient::with_base_url`]
/// to point at a mock server in tests.
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl PlacesClient {
    /// Creates a client pointed at the production API with retries disabled.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, GeoError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`GeoError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("placescout/0.1")
            .build()?;

        // Exactly one trailing slash so `Url::join` appends endpoint paths
        // instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GeoError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Builds a client from application configuration, retries included.
    ///
    /// # Errors
    ///
    /// Same as [`PlacesClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, GeoError> {
        Ok(Self::with_base_url(
            &config.places_api_key,
            config.request_timeout_secs,
            &config.places_base_url,
        )?
        .with_retries(config.max_retries, config.retry_backoff_base_ms))
    }

    /// Enables retry of transient failures: `max_retries` extra attempts with
    /// exponential back-off starting at `backoff_base_ms`.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches one page of a keyword nearby search.
    ///
    /// With a `page_token` only the token and key are sent; the provider
    /// rejects continuation requests that repeat the original parameters.
    ///
    /// # Errors
    ///
    /// - [`GeoError::Status`] for statuses other than `OK`/`ZERO_RESULTS`
    ///   (including `INVALID_REQUEST` when a token is used too early).
    /// - [`GeoError::Http`] on network failure or non-2xx HTTP status.
    /// - [`GeoError::Deserialize`] if the body is not the expected shape.
    pub async fn nearby_search_page(
        &self,
        request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<NearbyPage, GeoError> {
        let url = if let Some(token) = page_token {
            self.build_url(NEARBY_PATH, &[("pagetoken", token)])?
        } else {
            let location = request.center.to_string();
            let radius = format!("{:.0}", request.radius_meters);
            self.build_url(
                NEARBY_PATH,
                &[
                    ("location", &location),
                    ("radius", &radius),
                    ("keyword", &request.keyword),
                ],
            )?
        };

        let response: NearbySearchResponse = self.get_envelope(&url, "nearbysearch").await?;
        if response.status == STATUS_ZERO_RESULTS {
            tracing::info!(keyword = %request.keyword, center = %request.center, "nearby search returned zero results");
            return Ok(NearbyPage::default());
        }

        Ok(NearbyPage {
            places: normalize_places(response.results),
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    /// Builds the endpoint URL with the API key and properly percent-encoded
    /// query parameters.
    pub(crate) fn build_url(&self, path: &str, extra: &[(&str, &str)]) -> Result<Url, GeoError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| GeoError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET with retry, decodes the body into `T`, and rejects
    /// non-ok envelope statuses.
    pub(crate) async fn get_envelope<T>(
        &self,
        url: &Url,
        operation: &'static str,
    ) -> Result<T, GeoError>
    where
        T: DeserializeOwned + Envelope,
    {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let body = self.request_text(url).await?;
            let parsed: T = serde_json::from_str(&body).map_err(|e| GeoError::Deserialize {
                context: operation.to_string(),
                source: e,
            })?;
            Self::check_status(&parsed, operation)?;
            Ok(parsed)
        })
        .await
    }

    /// Sends a GET request, asserts a 2xx HTTP status, and returns the body.
    async fn request_text(&self, url: &Url) -> Result<String, GeoError> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }

    fn check_status<T: Envelope>(envelope: &T, operation: &'static str) -> Result<(), GeoError> {
        let status = envelope.status();
        if status == STATUS_OK || status == STATUS_ZERO_RESULTS {
            return Ok(());
        }
        Err(GeoError::Status {
            operation,
            status: status.to_owned(),
            message: envelope.error_message().map(str::to_owned),
        })
    }
}

#[async_trait]
impl GeoProvider for PlacesClient {
    async fn nearby_page(
        &self,
        request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<NearbyPage, GeoError> {
        self.nearby_search_page(request, page_token).await
    }

    async fn details(
        &self,
        id: &PlaceId,
        fields: &[DetailField],
    ) -> Result<PlaceDetails, GeoError> {
        self.place_details(id, fields).await
    }

    async fn geocode(&self, query: &str) -> Result<LatLng, GeoError> {
        self.geocode_address(query).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
