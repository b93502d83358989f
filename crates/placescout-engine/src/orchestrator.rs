//! The map engine: owned search, marker, selection and navigation state.
//!
//! [`MapEngine`] is a synchronous reducer. Async work (provider calls,
//! geocoding, saved-record lookups) happens elsewhere and feeds back through
//! [`MapEngine::complete_search`] and friends. Single-flight is enforced with
//! one in-flight [`SessionToken`]: a second search while one runs is dropped,
//! and a completion whose token is not the in-flight one is discarded.

use placescout_core::{LatLng, Place, PlaceId, SearchOptions, StatusSnapshot, TargetPlace};
use tokio::sync::watch;

use crate::cards::{CardState, ResultCard};
use crate::error::EngineError;
use crate::markers::{MarkerRegistry, MarkerState};
use crate::navigation::{NavigationResolver, NavigationState, SearchOrigin};
use crate::reconciler::{filter_excluded, ReconcileSettings};
use crate::selection::SelectionState;
use crate::session::{SearchSession, SessionToken};
use crate::status::{StatusCache, StatusFeed, StatusView};
use crate::surface::MapSurface;

/// Where a selection request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectSource {
    /// Click on a marker. Counts as manual navigation and opens the popup.
    Marker,
    /// Click on a result card.
    Card,
    /// The card's "view on map" action.
    ViewOnMap,
    /// Automatic focus of a deep-linked place.
    DeepLink,
}

/// What [`MapEngine::complete_search`] did with a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCompletion {
    /// The token was not the in-flight one; nothing changed.
    Stale,
    /// The session failed; results stay cleared.
    Failed,
    Published {
        results: usize,
        focused: Option<PlaceId>,
    },
}

/// Outcome of a search trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchStart {
    /// A new session is in flight; run it and report back.
    Started(SearchSession),
    /// Another session is in flight; the trigger had no effect.
    Dropped,
    /// State was cleared but no term is enabled, so nothing will be fetched.
    NoTerms,
    /// The trigger did not call for a search.
    NotNeeded,
}

impl SearchStart {
    #[must_use]
    pub fn into_session(self) -> Option<SearchSession> {
        match self {
            SearchStart::Started(session) => Some(session),
            SearchStart::Dropped | SearchStart::NoTerms | SearchStart::NotNeeded => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    token: SessionToken,
    origin: SearchOrigin,
}

pub struct MapEngine<S> {
    surface: S,
    registry: MarkerRegistry,
    selection: SelectionState,
    navigation: NavigationResolver,
    status: StatusCache,
    results: Vec<Place>,
    center: Option<LatLng>,
    options: SearchOptions,
    reconcile: ReconcileSettings,
    next_token: SessionToken,
    in_flight: Option<InFlight>,
    popup: Option<PlaceId>,
}

impl<S: MapSurface> MapEngine<S> {
    #[must_use]
    pub fn new(surface: S, options: SearchOptions, reconcile: ReconcileSettings) -> Self {
        Self {
            surface,
            registry: MarkerRegistry::new(),
            selection: SelectionState::new(),
            navigation: NavigationResolver::new(),
            status: StatusCache::default(),
            results: Vec::new(),
            center: None,
            options,
            reconcile,
            next_token: SessionToken::first(),
            in_flight: None,
            popup: None,
        }
    }

    #[must_use]
    pub fn results(&self) -> &[Place] {
        &self.results
    }

    #[must_use]
    pub fn place(&self, id: &PlaceId) -> Option<&Place> {
        self.results.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn marker_state(&self, id: &PlaceId) -> Option<MarkerState> {
        self.registry.get(id)
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&PlaceId> {
        self.selection.selected()
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&PlaceId> {
        self.selection.hovered()
    }

    #[must_use]
    pub fn popup(&self) -> Option<&PlaceId> {
        self.popup.as_ref()
    }

    #[must_use]
    pub fn navigation_state(&self) -> &NavigationState {
        self.navigation.state()
    }

    /// The deep link still waiting to be focused, if any.
    #[must_use]
    pub fn pending_deep_link(&self) -> Option<&PlaceId> {
        self.navigation.pending()
    }

    #[must_use]
    pub fn center(&self) -> Option<LatLng> {
        self.center
    }

    #[must_use]
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    #[must_use]
    pub fn reconcile_settings(&self) -> ReconcileSettings {
        self.reconcile
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<SessionToken> {
        self.in_flight.map(|f| f.token)
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Clone of the status view for a search task.
    #[must_use]
    pub fn status_view(&self) -> StatusView {
        self.status.view().clone()
    }

    #[must_use]
    pub fn status_receiver(&self) -> Option<watch::Receiver<StatusSnapshot>> {
        self.status.receiver()
    }

    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.status.user()
    }

    /// The published results annotated for display.
    #[must_use]
    pub fn cards(&self) -> Vec<ResultCard> {
        let snapshot = self.status.view().snapshot();
        self.results
            .iter()
            .map(|place| {
                let met = snapshot.get(&place.id).is_some_and(|r| r.met);
                let state = CardState::resolve(
                    self.selection.selected() == Some(&place.id),
                    self.selection.hovered() == Some(&place.id),
                    met,
                );
                ResultCard::new(place, state, self.registry.contains(&place.id))
            })
            .collect()
    }

    /// Starts a session at `center` unless one is already in flight.
    ///
    /// On start the popup closes, every marker is destroyed, selection resets,
    /// the results clear and the surface moves to `center` before any new
    /// data arrives. With no enabled
    /// term the cleared, empty state is final.
    pub fn begin_search(
        &mut self,
        center: LatLng,
        origin: SearchOrigin,
        target: Option<TargetPlace>,
    ) -> SearchStart {
        if let Some(current) = self.in_flight {
            tracing::debug!(current = %current.token, ?origin, "search already in flight, dropping trigger");
            return SearchStart::Dropped;
        }

        self.close_popup();
        self.registry.destroy_all(&mut self.surface);
        self.selection.reset(&mut self.registry, &mut self.surface);
        self.results.clear();
        self.center = Some(center);
        self.surface.pan_to(center);

        let terms = self.options.enabled_terms();
        if terms.is_empty() {
            tracing::info!(%center, "no search terms enabled");
            return SearchStart::NoTerms;
        }

        let token = self.next_token;
        self.next_token = token.next();
        self.in_flight = Some(InFlight { token, origin });
        tracing::info!(%token, %center, ?origin, terms = terms.len(), "search started");

        SearchStart::Started(SearchSession {
            token,
            center,
            radius_meters: self.options.radius_meters(),
            terms,
            target,
            origin,
        })
    }

    /// Applies a finished session. Always releases the single-flight lock
    /// when `token` is the in-flight one.
    pub fn complete_search(
        &mut self,
        token: SessionToken,
        outcome: Result<Vec<Place>, EngineError>,
    ) -> SearchCompletion {
        let Some(current) = self.in_flight.filter(|f| f.token == token) else {
            tracing::debug!(%token, "discarding result of superseded session");
            return SearchCompletion::Stale;
        };
        self.in_flight = None;

        let places = match outcome {
            Ok(places) => places,
            Err(e) => {
                tracing::error!(%token, error = %e, "search failed");
                return SearchCompletion::Failed;
            }
        };

        self.results = filter_excluded(places, self.status.view());
        self.registry.rebuild(&mut self.surface, &self.results);
        self.selection.reset(&mut self.registry, &mut self.surface);

        let registry = &self.registry;
        let focused = self
            .navigation
            .on_search_complete(current.origin, |id| registry.contains(id));
        if let Some(id) = &focused {
            tracing::info!(place_id = %id, "focusing deep-linked place");
            self.apply_selection(id, SelectSource::DeepLink);
        }

        tracing::info!(%token, results = self.results.len(), markers = self.registry.len(), "results published");
        SearchCompletion::Published {
            results: self.results.len(),
            focused,
        }
    }

    /// Click on empty map area: manual navigation, selection cleared, and a
    /// new search at the clicked point.
    pub fn map_click(&mut self, location: LatLng) -> SearchStart {
        self.navigation.manual_interaction();
        self.close_popup();
        self.selection.reset(&mut self.registry, &mut self.surface);
        self.begin_search(location, SearchOrigin::Manual, None)
    }

    /// Replaces the search options. Re-searches at the current center only
    /// when there is one and results are showing.
    pub fn set_options(&mut self, options: SearchOptions) -> SearchStart {
        self.options = options;
        let Some(center) = self.center else {
            return SearchStart::NotNeeded;
        };
        if self.results.is_empty() {
            return SearchStart::NotNeeded;
        }
        self.begin_search(center, SearchOrigin::Background, None)
    }

    /// Selects a listed place and pans to it.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownPlace`] when `id` is not in the current results.
    pub fn select(&mut self, id: &PlaceId, source: SelectSource) -> Result<(), EngineError> {
        if self.place(id).is_none() {
            return Err(EngineError::UnknownPlace(id.clone()));
        }
        if source == SelectSource::Marker {
            self.navigation.manual_interaction();
        }
        self.apply_selection(id, source);
        Ok(())
    }

    /// Ignored for places outside the current results.
    pub fn hover_enter(&mut self, id: &PlaceId) {
        if self.place(id).is_none() {
            tracing::trace!(place_id = %id, "hover on unknown place ignored");
            return;
        }
        self.selection
            .hover_enter(&mut self.registry, &mut self.surface, id);
    }

    pub fn hover_leave(&mut self, id: &PlaceId) {
        self.selection
            .hover_leave(&mut self.registry, &mut self.surface, id);
    }

    /// Closes the detail popup and clears the selection it belonged to.
    pub fn dismiss_popup(&mut self) {
        if self.popup.is_some() {
            self.close_popup();
            self.selection
                .clear_selection(&mut self.registry, &mut self.surface);
        }
    }

    /// Records a new deep-link id (or its removal). Returns `true` when the
    /// caller should resolve the saved record and search around it.
    pub fn set_deep_link(&mut self, id: Option<PlaceId>) -> bool {
        self.navigation.set_deep_link(id)
    }

    /// Searches around a resolved deep link with the saved record pinned.
    ///
    /// Ignored when the deep link changed while the record was being fetched.
    pub fn deep_link_resolved(
        &mut self,
        target: TargetPlace,
        center: LatLng,
    ) -> SearchStart {
        if self.navigation.deep_link() != Some(&target.id) {
            tracing::debug!(place_id = %target.id, "deep link changed during resolution");
            return SearchStart::NotNeeded;
        }
        self.begin_search(center, SearchOrigin::DeepLink, Some(target))
    }

    /// Subscribes to `user`'s status feed, replacing any previous scope, and
    /// re-filters the current results against it.
    pub fn subscribe_status(&mut self, feed: &dyn StatusFeed, user: &str) -> Vec<PlaceId> {
        self.status.subscribe(feed, user);
        self.apply_status()
    }

    pub fn sign_out(&mut self) {
        self.status.clear();
    }

    /// Incremental re-filter after a status update.
    ///
    /// Only newly-excluded places lose their markers; every other marker is
    /// left as it is. The result list is replaced only when its length
    /// changes. Returns the removed ids.
    pub fn apply_status(&mut self) -> Vec<PlaceId> {
        let view = self.status.view();
        let removed: Vec<PlaceId> = self
            .results
            .iter()
            .filter(|p| view.is_excluded(&p.id))
            .map(|p| p.id.clone())
            .collect();
        if removed.is_empty() {
            return removed;
        }

        self.results.retain(|p| !removed.contains(&p.id));
        for id in &removed {
            self.registry.remove(&mut self.surface, id);
            if self.selection.forget(id) {
                tracing::debug!(place_id = %id, "selected place was excluded");
            }
            if self.popup.as_ref() == Some(id) {
                self.close_popup();
            }
        }
        tracing::info!(removed = removed.len(), results = self.results.len(), "status update filtered results");
        removed
    }

    fn apply_selection(&mut self, id: &PlaceId, source: SelectSource) {
        if self.popup.as_ref().is_some_and(|p| p != id) {
            self.close_popup();
        }
        self.selection
            .select(&mut self.registry, &mut self.surface, id);

        let Some(place) = self.results.iter().find(|p| &p.id == id) else {
            return;
        };
        if let Some(location) = place.location {
            self.surface.pan_to(location);
        }
        if source == SelectSource::Marker {
            if let Some(marker) = self.registry.get(id) {
                self.surface.open_popup(marker.handle, place);
                self.popup = Some(id.clone());
            }
        }
    }

    fn close_popup(&mut self) {
        if self.popup.take().is_some() {
            self.surface.close_popup();
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
