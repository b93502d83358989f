//! Conversion of raw Places API entries into domain [`Place`]s.

use placescout_core::{LatLng, Place, PlaceId};

use crate::types::{PlaceResult, WireLatLng};

const UNKNOWN_NAME: &str = "Unknown";

impl From<WireLatLng> for LatLng {
    fn from(value: WireLatLng) -> Self {
        LatLng::new(value.lat, value.lng)
    }
}

/// Converts one raw result. Entries without a `place_id` have no identity
/// and are dropped.
#[must_use]
pub fn normalize_place(raw: PlaceResult) -> Option<Place> {
    let id = raw.place_id.filter(|id| !id.is_empty())?;
    let address = raw
        .vicinity
        .filter(|v| !v.is_empty())
        .or(raw.formatted_address.filter(|a| !a.is_empty()));
    Some(Place {
        id: PlaceId::new(id),
        name: raw
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        address,
        location: raw.geometry.map(|g| g.location.into()),
        rating: raw.rating,
        rating_count: raw.user_ratings_total,
    })
}

/// Converts a page of raw results, preserving provider order.
pub fn normalize_places(raw: Vec<PlaceResult>) -> Vec<Place> {
    let total = raw.len();
    let places: Vec<Place> = raw.into_iter().filter_map(normalize_place).collect();
    if places.len() < total {
        tracing::debug!(
            dropped = total - places.len(),
            "normalize_places: skipped results without place_id"
        );
    }
    places
}
