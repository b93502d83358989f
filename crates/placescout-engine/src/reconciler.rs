//! Multi-term paginated search, dedup, target pinning and status filtering.

use std::collections::HashSet;
use std::time::Duration;

use placescout_core::{AppConfig, Place, TargetPlace};
use placescout_places::{GeoProvider, NearbyRequest};

use crate::error::EngineError;
use crate::session::SearchSession;
use crate::status::StatusView;

/// Pagination knobs for the nearby search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSettings {
    /// Wait before every page request except a term's first. The provider
    /// rejects page tokens that are used too soon.
    pub page_delay: Duration,
    /// Upper bound on pages fetched per term.
    pub max_pages: usize,
}

impl ReconcileSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_delay: Duration::from_millis(config.page_delay_ms),
            max_pages: config.max_pages,
        }
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(1500),
            max_pages: 3,
        }
    }
}

/// Runs the full search for `session` and returns the canonical result list.
///
/// Terms run sequentially in configuration order, and each term's pages run
/// sequentially. The status filter reads `status` after the last page lands.
///
/// # Errors
///
/// [`EngineError::Search`] when a term's first page fails in transport or
/// decoding. Provider statuses and later-page failures only shorten the
/// results.
pub async fn reconcile(
    provider: &dyn GeoProvider,
    session: &SearchSession,
    settings: ReconcileSettings,
    status: &StatusView,
) -> Result<Vec<Place>, EngineError> {
    let mut candidates = Vec::new();
    for term in &session.terms {
        let request = NearbyRequest {
            center: session.center,
            radius_meters: session.radius_meters,
            keyword: term.clone(),
        };
        let places = fetch_term(provider, &request, settings).await?;
        tracing::debug!(token = %session.token, term, count = places.len(), "term fetched");
        candidates.extend(places);
    }

    let deduped = dedup_by_id(candidates);
    let pinned = pin_target(deduped, session.target.as_ref());
    let results = filter_excluded(pinned, status);
    tracing::info!(
        token = %session.token,
        terms = session.terms.len(),
        results = results.len(),
        "search reconciled"
    );
    Ok(results)
}

/// Fetches every page of one term, honoring the inter-page delay.
async fn fetch_term(
    provider: &dyn GeoProvider,
    request: &NearbyRequest,
    settings: ReconcileSettings,
) -> Result<Vec<Place>, EngineError> {
    let mut places = Vec::new();
    let mut token: Option<String> = None;
    let mut page_count = 0usize;

    loop {
        page_count += 1;
        if page_count > settings.max_pages {
            tracing::debug!(term = %request.keyword, max_pages = settings.max_pages, "page cap reached");
            break;
        }

        let is_first_page = token.is_none();
        if !is_first_page && !settings.page_delay.is_zero() {
            tokio::time::sleep(settings.page_delay).await;
        }

        let page = match provider.nearby_page(request, token.as_deref()).await {
            Ok(page) => page,
            Err(e) if e.is_provider_status() => {
                tracing::warn!(term = %request.keyword, page = page_count, error = %e, "provider status error, skipping rest of term");
                break;
            }
            Err(e) if is_first_page => {
                return Err(EngineError::Search {
                    term: request.keyword.clone(),
                    source: e,
                });
            }
            Err(e) => {
                tracing::warn!(term = %request.keyword, page = page_count, error = %e, "next page failed, keeping earlier pages");
                break;
            }
        };

        places.extend(page.places);
        token = page.next_page_token;
        if token.is_none() {
            break;
        }
    }

    Ok(places)
}

/// Keeps the first occurrence of every id, preserving order.
#[must_use]
pub fn dedup_by_id(places: Vec<Place>) -> Vec<Place> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

/// Prepends `target` when the results do not already contain its id.
#[must_use]
pub fn pin_target(mut places: Vec<Place>, target: Option<&TargetPlace>) -> Vec<Place> {
    if let Some(target) = target {
        if !places.iter().any(|p| p.id == target.id) {
            tracing::debug!(place_id = %target.id, "pinning deep-linked place");
            places.insert(0, target.to_place());
        }
    }
    places
}

/// Drops every place the latest status snapshot flags as excluded.
#[must_use]
pub fn filter_excluded(places: Vec<Place>, status: &StatusView) -> Vec<Place> {
    places
        .into_iter()
        .filter(|p| !status.is_excluded(&p.id))
        .collect()
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
