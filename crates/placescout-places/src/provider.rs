//! The geo provider contract consumed by the map engine.
//!
//! [`GeoProvider`] exposes exactly the three calls the engine needs: one page
//! of a keyword nearby search, a field-limited details lookup, and
//! address/zip geocoding. Pagination is driven by the caller so that the
//! mandatory inter-page delay and per-page failure policy stay in one place.

use async_trait::async_trait;
use placescout_core::{LatLng, Place, PlaceId};

use crate::error::GeoError;

/// Parameters of a keyword nearby search. Reused unchanged across pages.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyRequest {
    pub center: LatLng,
    pub radius_meters: f64,
    pub keyword: String,
}

/// One page of nearby-search results.
///
/// A `ZERO_RESULTS` answer is an empty page, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NearbyPage {
    pub places: Vec<Place>,
    pub next_page_token: Option<String>,
}

impl NearbyPage {
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.next_page_token.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    FormattedPhoneNumber,
    InternationalPhoneNumber,
    Website,
}

impl DetailField {
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            DetailField::FormattedPhoneNumber => "formatted_phone_number",
            DetailField::InternationalPhoneNumber => "international_phone_number",
            DetailField::Website => "website",
        }
    }
}

/// The subset of detail fields that was requested and returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceDetails {
    pub formatted_phone_number: Option<String>,
    pub international_phone_number: Option<String>,
    pub website: Option<String>,
}

impl PlaceDetails {
    /// Local phone format when available, otherwise the international one.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.formatted_phone_number
            .as_deref()
            .or(self.international_phone_number.as_deref())
    }
}

#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Fetches one page. `page_token` is `None` for the first page.
    ///
    /// # Errors
    ///
    /// [`GeoError::Status`] for non-ok provider statuses; transport and decode
    /// failures otherwise.
    async fn nearby_page(
        &self,
        request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<NearbyPage, GeoError>;

    /// # Errors
    ///
    /// Any [`GeoError`]; callers treat details as optional enrichment.
    async fn details(&self, id: &PlaceId, fields: &[DetailField])
        -> Result<PlaceDetails, GeoError>;

    /// # Errors
    ///
    /// [`GeoError::NoResults`] when the query resolves to nothing.
    async fn geocode(&self, query: &str) -> Result<LatLng, GeoError>;
}
