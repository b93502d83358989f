//! Scripted provider and fixtures shared by the engine's unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use placescout_core::{LatLng, Place, PlaceId};
use placescout_places::{
    DetailField, GeoError, GeoProvider, NearbyPage, NearbyRequest, PlaceDetails,
};
use tokio::sync::Semaphore;

pub(crate) fn place(id: &str) -> Place {
    Place {
        id: PlaceId::from(id),
        name: format!("Place {id}"),
        address: Some(format!("{id} Main St")),
        location: Some(LatLng::new(28.5, -81.3)),
        rating: Some(4.0),
        rating_count: Some(10),
    }
}

pub(crate) fn ids(places: &[Place]) -> Vec<&str> {
    places.iter().map(|p| p.id.as_str()).collect()
}

#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Page(Vec<&'static str>, Option<&'static str>),
    Status(&'static str),
    Transport,
}

fn transport_error() -> GeoError {
    GeoError::Deserialize {
        context: "nearbysearch".to_owned(),
        source: serde_json::from_str::<u8>("<html>").unwrap_err(),
    }
}

fn status_error(status: &str) -> GeoError {
    GeoError::Status {
        operation: "nearbysearch",
        status: status.to_owned(),
        message: None,
    }
}

/// Answers nearby searches from a script keyed by `(keyword, page token)`.
/// Unscripted requests get an empty page.
#[derive(Default)]
pub(crate) struct FakeProvider {
    pages: HashMap<(String, Option<String>), Scripted>,
    geocodes: HashMap<String, LatLng>,
    details: HashMap<PlaceId, PlaceDetails>,
    calls: Mutex<Vec<(String, Option<String>)>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, keyword: &str, token: Option<&str>, answer: Scripted) -> Self {
        self.pages
            .insert((keyword.to_owned(), token.map(str::to_owned)), answer);
        self
    }

    pub(crate) fn geocode_to(mut self, query: &str, location: LatLng) -> Self {
        self.geocodes.insert(query.to_owned(), location);
        self
    }

    pub(crate) fn details_for(mut self, id: &str, details: PlaceDetails) -> Self {
        self.details.insert(PlaceId::from(id), details);
        self
    }

    /// Every nearby request waits for a permit from `gate` before answering.
    pub(crate) fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeoProvider for FakeProvider {
    async fn nearby_page(
        &self,
        request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<NearbyPage, GeoError> {
        let key = (request.keyword.clone(), page_token.map(str::to_owned));
        self.calls.lock().unwrap().push(key.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        match self.pages.get(&key).cloned() {
            Some(Scripted::Page(ids, next)) => Ok(NearbyPage {
                places: ids.into_iter().map(place).collect(),
                next_page_token: next.map(str::to_owned),
            }),
            Some(Scripted::Status(status)) => Err(status_error(status)),
            Some(Scripted::Transport) => Err(transport_error()),
            None => Ok(NearbyPage::default()),
        }
    }

    async fn details(
        &self,
        id: &PlaceId,
        _fields: &[DetailField],
    ) -> Result<PlaceDetails, GeoError> {
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| GeoError::Status {
                operation: "details",
                status: "NOT_FOUND".to_owned(),
                message: None,
            })
    }

    async fn geocode(&self, query: &str) -> Result<LatLng, GeoError> {
        self.geocodes
            .get(query)
            .copied()
            .ok_or_else(|| GeoError::NoResults {
                query: query.to_owned(),
            })
    }
}
