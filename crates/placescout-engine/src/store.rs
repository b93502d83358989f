//! Save sink contract and an in-memory store that doubles as a status feed.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use placescout_core::{PlaceId, SavedPlace, StatusRecord, StatusSnapshot};
use tokio::sync::watch;

use crate::error::EngineError;
use crate::status::StatusFeed;

/// External per-user store of saved places.
#[async_trait]
pub trait SaveSink: Send + Sync {
    /// # Errors
    ///
    /// [`EngineError::Sink`] when the backing store is unreachable.
    async fn fetch(&self, user: &str, id: &PlaceId) -> Result<Option<SavedPlace>, EngineError>;

    /// Idempotent upsert keyed by place id.
    ///
    /// When a record already exists its `met`, `excluded`, `notes` and
    /// `created_at` survive; everything else is replaced by `record`.
    /// Returns the stored record.
    ///
    /// # Errors
    ///
    /// [`EngineError::Sink`] when the backing store rejects the write.
    async fn upsert(
        &self,
        user: &str,
        id: &PlaceId,
        record: SavedPlace,
    ) -> Result<SavedPlace, EngineError>;
}

#[derive(Debug)]
struct UserPlaces {
    places: HashMap<PlaceId, SavedPlace>,
    status: watch::Sender<StatusSnapshot>,
}

impl UserPlaces {
    fn new() -> Self {
        let (status, _) = watch::channel(StatusSnapshot::default());
        Self {
            places: HashMap::new(),
            status,
        }
    }

    fn publish(&self) {
        let snapshot: StatusSnapshot = self
            .places
            .iter()
            .map(|(id, place)| (id.clone(), place.status()))
            .collect();
        self.status.send_replace(snapshot);
    }
}

/// Process-local store backing both [`SaveSink`] and [`StatusFeed`].
///
/// Every mutation republishes the user's full status snapshot, so
/// subscribers see saves and status edits the way a live document feed
/// would deliver them.
#[derive(Debug, Default)]
pub struct MemoryPlaceStore {
    users: Mutex<HashMap<String, UserPlaces>>,
}

impl MemoryPlaceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, UserPlaces>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the status flags of a saved place and notifies subscribers.
    ///
    /// Returns `false` when the user has no saved record for `id`.
    pub fn set_status(&self, user: &str, id: &PlaceId, status: StatusRecord) -> bool {
        let mut users = self.lock();
        let Some(entry) = users.get_mut(user) else {
            return false;
        };
        let Some(place) = entry.places.get_mut(id) else {
            return false;
        };
        place.met = status.met;
        place.excluded = status.excluded;
        entry.publish();
        tracing::debug!(user, place_id = %id, met = status.met, excluded = status.excluded, "status updated");
        true
    }

    /// Deletes a saved place. Returns `true` if it existed.
    pub fn remove(&self, user: &str, id: &PlaceId) -> bool {
        let mut users = self.lock();
        let Some(entry) = users.get_mut(user) else {
            return false;
        };
        let existed = entry.places.remove(id).is_some();
        if existed {
            entry.publish();
        }
        existed
    }

    #[must_use]
    pub fn saved(&self, user: &str) -> Vec<(PlaceId, SavedPlace)> {
        let users = self.lock();
        let mut saved: Vec<_> = users
            .get(user)
            .map(|u| {
                u.places
                    .iter()
                    .map(|(id, p)| (id.clone(), p.clone()))
                    .collect()
            })
            .unwrap_or_default();
        saved.sort_by(|a, b| a.0.cmp(&b.0));
        saved
    }
}

#[async_trait]
impl SaveSink for MemoryPlaceStore {
    async fn fetch(&self, user: &str, id: &PlaceId) -> Result<Option<SavedPlace>, EngineError> {
        Ok(self
            .lock()
            .get(user)
            .and_then(|u| u.places.get(id))
            .cloned())
    }

    async fn upsert(
        &self,
        user: &str,
        id: &PlaceId,
        mut record: SavedPlace,
    ) -> Result<SavedPlace, EngineError> {
        let mut users = self.lock();
        let entry = users.entry(user.to_owned()).or_insert_with(UserPlaces::new);
        if let Some(existing) = entry.places.get(id) {
            record.met = existing.met;
            record.excluded = existing.excluded;
            record.notes.clone_from(&existing.notes);
            record.created_at = existing.created_at;
        }
        entry.places.insert(id.clone(), record.clone());
        entry.publish();
        Ok(record)
    }
}

impl StatusFeed for MemoryPlaceStore {
    fn subscribe(&self, user: &str) -> watch::Receiver<StatusSnapshot> {
        let mut users = self.lock();
        users
            .entry(user.to_owned())
            .or_insert_with(UserPlaces::new)
            .status
            .subscribe()
    }
}
