//! Details and geocoding endpoints for the places client.

use placescout_core::{LatLng, PlaceId};

use crate::client::{PlacesClient, DETAILS_PATH, GEOCODE_PATH};
use crate::error::GeoError;
use crate::provider::{DetailField, PlaceDetails};
use crate::types::{DetailsResponse, GeocodeResponse};

impl PlacesClient {
    /// Fetches only the requested `fields` for one place.
    ///
    /// An `OK` answer without a `result` object yields empty details.
    ///
    /// # Errors
    ///
    /// - [`GeoError::Status`] on a non-ok status (e.g. `NOT_FOUND`).
    /// - [`GeoError::Http`] on network failure.
    /// - [`GeoError::Deserialize`] if the response shape is unexpected.
    pub async fn place_details(
        &self,
        id: &PlaceId,
        fields: &[DetailField],
    ) -> Result<PlaceDetails, GeoError> {
        let fields_param = fields
            .iter()
            .map(|f| f.as_param())
            .collect::<Vec<_>>()
            .join(",");
        let url = self.build_url(
            DETAILS_PATH,
            &[("place_id", id.as_str()), ("fields", &fields_param)],
        )?;
        let response: DetailsResponse = self.get_envelope(&url, "details").await?;
        let result = response.result.unwrap_or_default();
        Ok(PlaceDetails {
            formatted_phone_number: result.formatted_phone_number,
            international_phone_number: result.international_phone_number,
            website: result.website,
        })
    }

    /// Resolves a free-form address or zip code to coordinates.
    ///
    /// The first result with geometry wins.
    ///
    /// # Errors
    ///
    /// - [`GeoError::NoResults`] when the provider finds nothing.
    /// - [`GeoError::Status`] on any other non-ok status.
    /// - [`GeoError::Http`] on network failure.
    pub async fn geocode_address(&self, query: &str) -> Result<LatLng, GeoError> {
        let url = self.build_url(GEOCODE_PATH, &[("address", query)])?;
        let response: GeocodeResponse = self.get_envelope(&url, "geocode").await?;
        let location = response
            .results
            .into_iter()
            .find_map(|r| r.geometry.map(|g| LatLng::from(g.location)));
        match location {
            Some(location) => {
                tracing::debug!(query, %location, "geocoded");
                Ok(location)
            }
            None => Err(GeoError::NoResults {
                query: query.to_owned(),
            }),
        }
    }
}
