//! Async event loop around [`MapEngine`].
//!
//! The driver owns the engine and is the only thing that mutates it. Each
//! loop iteration waits on four sources: incoming [`Trigger`]s, the running
//! search task, other background work (geocoding, deep-link lookups, saves)
//! and status-feed changes. Search tasks report back with their session
//! token; a task that panics or is aborted still completes its session as a
//! failure so the single-flight lock is always released.

use std::sync::Arc;

use chrono::Utc;
use placescout_core::{LatLng, Place, PlaceId, SavedPlace, StatusSnapshot, TargetPlace};
use placescout_places::{GeoError, GeoProvider};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::error::EngineError;
use crate::navigation::SearchOrigin;
use crate::orchestrator::{MapEngine, SearchCompletion, SearchStart};
use crate::reconciler::reconcile;
use crate::save::save_place;
use crate::session::SessionToken;
use crate::status::StatusFeed;
use crate::store::SaveSink;
use crate::surface::MapSurface;
use crate::trigger::{EngineEvent, Trigger};

type SearchOutcome = Result<Vec<Place>, EngineError>;
type SearchTask = (SessionToken, JoinHandle<SearchOutcome>);

/// Results of non-search background work.
enum Background {
    Geocoded {
        query: String,
        result: Result<LatLng, GeoError>,
    },
    DeepLinkResolved {
        id: PlaceId,
        result: Result<(TargetPlace, LatLng), EngineError>,
    },
    Saved {
        id: PlaceId,
        result: Result<SavedPlace, EngineError>,
    },
}

pub struct EngineDriver<S> {
    engine: MapEngine<S>,
    provider: Arc<dyn GeoProvider>,
    sink: Arc<dyn SaveSink>,
    feed: Arc<dyn StatusFeed>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl<S: MapSurface> EngineDriver<S> {
    #[must_use]
    pub fn new(
        engine: MapEngine<S>,
        provider: Arc<dyn GeoProvider>,
        sink: Arc<dyn SaveSink>,
        feed: Arc<dyn StatusFeed>,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            engine,
            provider,
            sink,
            feed,
            events,
        }
    }

    /// Processes triggers until the sender side closes, then returns the
    /// engine for inspection. A search still running at shutdown is aborted.
    pub async fn run(mut self, mut triggers: mpsc::Receiver<Trigger>) -> MapEngine<S> {
        let mut search: Option<SearchTask> = None;
        let mut background: JoinSet<Background> = JoinSet::new();
        let mut status_rx = self.engine.status_receiver();

        loop {
            tokio::select! {
                trigger = triggers.recv() => {
                    let Some(trigger) = trigger else {
                        break;
                    };
                    let rescoped = matches!(trigger, Trigger::SignIn(_) | Trigger::SignOut);
                    self.handle_trigger(trigger, &mut search, &mut background);
                    if rescoped {
                        status_rx = self.engine.status_receiver();
                    }
                }
                Some((token, outcome)) = next_search(&mut search) => {
                    self.finish_search(token, outcome);
                }
                Some(joined) = background.join_next() => {
                    match joined {
                        Ok(done) => self.handle_background(done, &mut search),
                        Err(e) => tracing::error!(error = %e, "background task failed"),
                    }
                }
                alive = status_changed(&mut status_rx) => {
                    if alive {
                        let removed = self.engine.apply_status();
                        if !removed.is_empty() {
                            self.emit(EngineEvent::ResultsFiltered { removed });
                        }
                    } else {
                        tracing::debug!("status feed closed");
                        status_rx = None;
                    }
                }
            }
        }

        if let Some((token, handle)) = search.take() {
            tracing::debug!(%token, "aborting search at shutdown");
            handle.abort();
        }
        background.shutdown().await;
        self.engine
    }

    fn handle_trigger(
        &mut self,
        trigger: Trigger,
        search: &mut Option<SearchTask>,
        background: &mut JoinSet<Background>,
    ) {
        tracing::trace!(?trigger, "trigger");
        match trigger {
            Trigger::MapClick(location) => {
                let start = self.engine.map_click(location);
                self.launch(start, search);
            }
            Trigger::Locate(location) => {
                let start = self
                    .engine
                    .begin_search(location, SearchOrigin::Background, None);
                self.launch(start, search);
            }
            Trigger::LookupAddress(query) => {
                let provider = Arc::clone(&self.provider);
                background.spawn(async move {
                    let result = provider.geocode(&query).await;
                    Background::Geocoded { query, result }
                });
            }
            Trigger::SetOptions(options) => {
                let start = self.engine.set_options(options);
                self.launch(start, search);
            }
            Trigger::DeepLink(id) => self.deep_link(id, background),
            Trigger::Select { id, source } => {
                if let Err(e) = self.engine.select(&id, source) {
                    tracing::debug!(error = %e, "select ignored");
                    self.emit(EngineEvent::SelectFailed { id });
                }
            }
            Trigger::HoverEnter(id) => self.engine.hover_enter(&id),
            Trigger::HoverLeave(id) => self.engine.hover_leave(&id),
            Trigger::ClosePopup => self.engine.dismiss_popup(),
            Trigger::Save(id) => self.save(id, background),
            Trigger::SignIn(user) => {
                let removed = self.engine.subscribe_status(self.feed.as_ref(), &user);
                if !removed.is_empty() {
                    self.emit(EngineEvent::ResultsFiltered { removed });
                }
                if let Some(id) = self.engine.pending_deep_link().cloned() {
                    tracing::debug!(place_id = %id, "resolving deep link after sign-in");
                    self.spawn_resolution(id, user, background);
                }
            }
            Trigger::SignOut => self.engine.sign_out(),
        }
    }

    fn handle_background(
        &mut self,
        done: Background,
        search: &mut Option<SearchTask>,
    ) {
        match done {
            Background::Geocoded { query, result } => match result {
                Ok(location) => {
                    let start = self
                        .engine
                        .begin_search(location, SearchOrigin::Background, None);
                    self.launch(start, search);
                }
                Err(e) => {
                    tracing::warn!(query, error = %e, "address lookup failed");
                    self.emit(EngineEvent::GeocodeFailed {
                        query,
                        message: e.to_string(),
                    });
                }
            },
            Background::DeepLinkResolved { id, result } => match result {
                Ok((target, center)) => {
                    let start = self.engine.deep_link_resolved(target, center);
                    self.launch(start, search);
                }
                Err(e) => {
                    tracing::warn!(place_id = %id, error = %e, "deep link unresolved");
                    self.emit(EngineEvent::DeepLinkUnresolved {
                        id,
                        message: e.to_string(),
                    });
                }
            },
            Background::Saved { id, result } => match result {
                Ok(saved) => self.emit(EngineEvent::Saved {
                    id,
                    name: saved.name,
                }),
                Err(e) => {
                    tracing::error!(place_id = %id, error = %e, "save failed");
                    self.emit(EngineEvent::SaveFailed {
                        id,
                        message: e.to_string(),
                    });
                }
            },
        }
    }

    fn launch(&mut self, start: SearchStart, search: &mut Option<SearchTask>) {
        let session = match start {
            SearchStart::Started(session) => session,
            SearchStart::Dropped => {
                self.emit(EngineEvent::SearchDropped);
                return;
            }
            SearchStart::NoTerms => {
                self.emit(EngineEvent::NothingToSearch);
                return;
            }
            SearchStart::NotNeeded => return,
        };

        let token = session.token;
        let provider = Arc::clone(&self.provider);
        let status = self.engine.status_view();
        let settings = self.engine.reconcile_settings();
        let handle = tokio::spawn(async move {
            reconcile(provider.as_ref(), &session, settings, &status).await
        });
        if let Some((stale, _)) = search.replace((token, handle)) {
            tracing::warn!(%stale, %token, "replaced an unfinished search task");
        }
        self.emit(EngineEvent::SearchStarted { token });
    }

    fn finish_search(&mut self, token: SessionToken, outcome: SearchOutcome) {
        let message = outcome.as_ref().err().map(ToString::to_string);
        match self.engine.complete_search(token, outcome) {
            SearchCompletion::Published { results, focused } => {
                self.emit(EngineEvent::ResultsPublished {
                    token,
                    count: results,
                    focused,
                });
            }
            SearchCompletion::Failed => self.emit(EngineEvent::SearchFailed {
                token,
                message: message.unwrap_or_default(),
            }),
            SearchCompletion::Stale => {}
        }
    }

    fn deep_link(&mut self, id: Option<PlaceId>, background: &mut JoinSet<Background>) {
        if !self.engine.set_deep_link(id.clone()) {
            return;
        }
        let Some(id) = id else {
            return;
        };
        let Some(user) = self.engine.user().map(str::to_owned) else {
            self.emit(EngineEvent::DeepLinkUnresolved {
                message: EngineError::NotSignedIn.to_string(),
                id,
            });
            return;
        };
        self.spawn_resolution(id, user, background);
    }

    fn spawn_resolution(
        &self,
        id: PlaceId,
        user: String,
        background: &mut JoinSet<Background>,
    ) {
        let provider = Arc::clone(&self.provider);
        let sink = Arc::clone(&self.sink);
        background.spawn(async move {
            let result = resolve_deep_link(provider.as_ref(), sink.as_ref(), &user, &id).await;
            Background::DeepLinkResolved { id, result }
        });
    }

    fn save(&mut self, id: PlaceId, background: &mut JoinSet<Background>) {
        let Some(user) = self.engine.user().map(str::to_owned) else {
            self.emit(EngineEvent::SaveFailed {
                id,
                message: EngineError::NotSignedIn.to_string(),
            });
            return;
        };
        let Some(place) = self.engine.place(&id).cloned() else {
            self.emit(EngineEvent::SaveFailed {
                message: EngineError::UnknownPlace(id.clone()).to_string(),
                id,
            });
            return;
        };

        let provider = Arc::clone(&self.provider);
        let sink = Arc::clone(&self.sink);
        background.spawn(async move {
            let result =
                save_place(provider.as_ref(), sink.as_ref(), &user, &place, Utc::now()).await;
            Background::Saved { id, result }
        });
    }

    fn emit(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}

/// Loads the saved record behind a deep link and picks the search center:
/// stored coordinates when present, otherwise the geocoded stored address.
async fn resolve_deep_link(
    provider: &dyn GeoProvider,
    sink: &dyn SaveSink,
    user: &str,
    id: &PlaceId,
) -> Result<(TargetPlace, LatLng), EngineError> {
    let saved = sink
        .fetch(user, id)
        .await?
        .ok_or_else(|| EngineError::DeepLinkNotFound(id.clone()))?;

    let center = match saved.location() {
        Some(location) => location,
        None => {
            let address = saved
                .address
                .as_deref()
                .filter(|a| !a.trim().is_empty())
                .ok_or_else(|| EngineError::DeepLinkUnlocatable(id.clone()))?;
            provider
                .geocode(address)
                .await
                .map_err(|source| EngineError::Geocode {
                    query: address.to_owned(),
                    source,
                })?
        }
    };

    let mut target = saved.to_target(id.clone());
    target.location = Some(center);
    Ok((target, center))
}

async fn next_search(slot: &mut Option<SearchTask>) -> Option<(SessionToken, SearchOutcome)> {
    let (token, handle) = slot.as_mut()?;
    let joined = handle.await;
    let token = *token;
    *slot = None;
    let outcome = joined.unwrap_or_else(|e| Err(EngineError::TaskFailed(e.to_string())));
    Some((token, outcome))
}

/// Resolves when the feed publishes; `false` once the feed is gone.
/// Never resolves while unsubscribed.
async fn status_changed(rx: &mut Option<watch::Receiver<StatusSnapshot>>) -> bool {
    match rx {
        Some(rx) => rx.changed().await.is_ok(),
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
