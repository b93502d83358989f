//! Saving a listed place to the user's store.

use chrono::{DateTime, Utc};
use placescout_core::{Place, SavedPlace};
use placescout_places::{DetailField, GeoProvider};

use crate::error::EngineError;
use crate::store::SaveSink;

const PHONE_FIELDS: [DetailField; 2] = [
    DetailField::FormattedPhoneNumber,
    DetailField::InternationalPhoneNumber,
];

/// Looks up the place's phone number, then upserts it for `user`.
///
/// A failed details lookup is logged and the save goes ahead without a phone.
///
/// # Errors
///
/// Returns whatever the sink returns for the upsert itself.
pub async fn save_place(
    provider: &dyn GeoProvider,
    sink: &dyn SaveSink,
    user: &str,
    place: &Place,
    now: DateTime<Utc>,
) -> Result<SavedPlace, EngineError> {
    let phone = match provider.details(&place.id, &PHONE_FIELDS).await {
        Ok(details) => details.phone().map(str::to_owned),
        Err(e) => {
            tracing::warn!(place_id = %place.id, error = %e, "phone lookup failed, saving without it");
            None
        }
    };

    let record = SavedPlace::from_place(place, phone, now);
    let stored = sink.upsert(user, &place.id, record).await?;
    tracing::info!(user, place_id = %place.id, name = %stored.name, "place saved");
    Ok(stored)
}
