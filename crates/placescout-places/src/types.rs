//! Places API response types.
//!
//! Every endpoint wraps its payload in a `{"status": "OK", ...}` envelope.
//! `status` is `"OK"`, `"ZERO_RESULTS"`, or an error code such as
//! `"INVALID_REQUEST"`, `"OVER_QUERY_LIMIT"`, `"REQUEST_DENIED"`, or
//! `"UNKNOWN_ERROR"`; the optional `error_message` explains the latter.

use serde::Deserialize;

pub const STATUS_OK: &str = "OK";
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

// ---------------------------------------------------------------------------
// place/nearbysearch
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NearbySearchResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    /// Token for the next page; only valid after a short provider-side delay.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// One raw place entry. Only `place_id` is needed to keep a result.
#[derive(Debug, Deserialize)]
pub struct PlaceResult {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vicinity: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: WireLatLng,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WireLatLng {
    pub lat: f64,
    pub lng: f64,
}

// ---------------------------------------------------------------------------
// place/details
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub result: Option<DetailsResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailsResult {
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    #[serde(default)]
    pub international_phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

// ---------------------------------------------------------------------------
// geocode
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}
