//! Domain types shared by the provider adapter and the map engine.
//!
//! A [`Place`] is identified solely by its [`PlaceId`]; every other field is
//! display data that the provider may omit. [`StatusRecord`]s arrive from the
//! per-user status feed on their own schedule and are keyed by the same id.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Meters in one statute mile, as used for the provider's radius parameter.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Radius used when neither the profile nor the caller picks one.
pub const DEFAULT_RADIUS_MILES: f64 = 2.0;

/// Converts a radius in miles to the meters the provider expects.
#[must_use]
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Opaque, provider-assigned place identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(String);

impl PlaceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaceId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for PlaceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// One point of interest returned by a nearby search or pinned from a saved record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub address: Option<String>,
    pub location: Option<LatLng>,
    pub rating: Option<f32>,
    pub rating_count: Option<u32>,
}

/// Per-place flags from the live status feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub met: bool,
    pub excluded: bool,
}

/// Latest known status flags for every place the user has saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    records: HashMap<PlaceId, StatusRecord>,
}

impl StatusSnapshot {
    #[must_use]
    pub fn new(records: HashMap<PlaceId, StatusRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn get(&self, id: &PlaceId) -> Option<StatusRecord> {
        self.records.get(id).copied()
    }

    /// `true` when the place is flagged as excluded. Unknown places are never excluded.
    #[must_use]
    pub fn is_excluded(&self, id: &PlaceId) -> bool {
        self.records.get(id).is_some_and(|r| r.excluded)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn insert(&mut self, id: PlaceId, record: StatusRecord) {
        self.records.insert(id, record);
    }

    pub fn remove(&mut self, id: &PlaceId) {
        self.records.remove(id);
    }
}

impl FromIterator<(PlaceId, StatusRecord)> for StatusSnapshot {
    fn from_iter<T: IntoIterator<Item = (PlaceId, StatusRecord)>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// A place as persisted by the save sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlace {
    pub name: String,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub rating: Option<f32>,
    pub rating_count: Option<u32>,
    pub phone: Option<String>,
    pub met: bool,
    pub excluded: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedPlace {
    /// Fresh record for a place being saved for the first time.
    #[must_use]
    pub fn from_place(place: &Place, phone: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: place.name.clone(),
            address: place.address.clone(),
            lat: place.location.map(|l| l.lat),
            lng: place.location.map(|l| l.lng),
            rating: place.rating,
            rating_count: place.rating_count,
            phone,
            met: false,
            excluded: false,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Stored coordinates, when both halves were persisted.
    #[must_use]
    pub fn location(&self) -> Option<LatLng> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(LatLng { lat, lng }),
            _ => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusRecord {
        StatusRecord {
            met: self.met,
            excluded: self.excluded,
        }
    }

    #[must_use]
    pub fn to_target(&self, id: PlaceId) -> TargetPlace {
        TargetPlace {
            id,
            name: self.name.clone(),
            address: self.address.clone(),
            location: self.location(),
            rating: self.rating,
            rating_count: self.rating_count,
        }
    }
}

/// Caller-supplied data for a deep-linked place, used to pin it into the
/// result set when the live search misses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPlace {
    pub id: PlaceId,
    pub name: String,
    pub address: Option<String>,
    pub location: Option<LatLng>,
    pub rating: Option<f32>,
    pub rating_count: Option<u32>,
}

impl TargetPlace {
    #[must_use]
    pub fn to_place(&self) -> Place {
        Place {
            id: self.id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            location: self.location,
            rating: self.rating,
            rating_count: self.rating_count,
        }
    }
}
