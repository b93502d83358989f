use std::time::Duration;

use chrono::Utc;
use placescout_core::{SavedPlace, SearchTerm, StatusRecord};

use super::*;
use crate::reconciler::reconcile;
use crate::store::{MemoryPlaceStore, SaveSink};
use crate::surface::{HeadlessSurface, MarkerVisual};
use crate::testing::{ids, place, FakeProvider, Scripted};

const USER: &str = "user-1";

fn options(terms: &[(&str, bool)]) -> SearchOptions {
    SearchOptions {
        radius_miles: 2.0,
        terms: terms
            .iter()
            .map(|(k, enabled)| SearchTerm {
                keyword: (*k).to_owned(),
                enabled: *enabled,
            })
            .collect(),
    }
}

fn engine() -> MapEngine<HeadlessSurface> {
    MapEngine::new(
        HeadlessSurface::new(),
        options(&[("A", true), ("B", true)]),
        ReconcileSettings {
            page_delay: Duration::ZERO,
            max_pages: 3,
        },
    )
}

fn provider() -> FakeProvider {
    FakeProvider::new()
        .page("A", None, Scripted::Page(vec!["p1", "p2"], None))
        .page("B", None, Scripted::Page(vec!["p2", "p3"], None))
}

fn here() -> LatLng {
    LatLng::new(28.5383, -81.3792)
}

async fn run(
    engine: &mut MapEngine<HeadlessSurface>,
    provider: &FakeProvider,
    start: SearchStart,
) -> SearchCompletion {
    let session = start.into_session().expect("search should start");
    let outcome = reconcile(
        provider,
        &session,
        engine.reconcile_settings(),
        &engine.status_view(),
    )
    .await;
    engine.complete_search(session.token, outcome)
}

fn excluded() -> StatusRecord {
    StatusRecord {
        met: false,
        excluded: true,
    }
}

async fn save(store: &MemoryPlaceStore, id: &str) -> SavedPlace {
    let record = SavedPlace::from_place(&place(id), None, Utc::now());
    store
        .upsert(USER, &PlaceId::from(id), record)
        .await
        .unwrap()
}

#[tokio::test]
async fn overlapping_terms_publish_deduplicated_results_with_markers() {
    let mut engine = engine();
    let start = engine.begin_search(here(), SearchOrigin::Background, None);

    let completion = run(&mut engine, &provider(), start).await;

    assert_eq!(
        completion,
        SearchCompletion::Published {
            results: 3,
            focused: None
        }
    );
    assert_eq!(ids(engine.results()), vec!["p1", "p2", "p3"]);
    assert_eq!(engine.marker_count(), 3);
    assert_eq!(engine.surface().live_markers().len(), 3);
    assert!(engine.in_flight().is_none());
}

#[tokio::test]
async fn status_exclusion_removes_only_that_marker() {
    let store = MemoryPlaceStore::new();
    save(&store, "p2").await;
    let mut engine = engine();
    engine.subscribe_status(&store, USER);
    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider(), start).await;

    let p1 = engine.marker_state(&PlaceId::from("p1")).unwrap();
    let p2 = engine.marker_state(&PlaceId::from("p2")).unwrap();
    let p3 = engine.marker_state(&PlaceId::from("p3")).unwrap();
    let removed_before = engine.surface().removed().len();

    store.set_status(USER, &PlaceId::from("p2"), excluded());
    let removed = engine.apply_status();

    assert_eq!(removed, vec![PlaceId::from("p2")]);
    assert_eq!(ids(engine.results()), vec!["p1", "p3"]);
    assert!(engine.marker_state(&PlaceId::from("p2")).is_none());
    assert_eq!(engine.marker_state(&PlaceId::from("p1")), Some(p1));
    assert_eq!(engine.marker_state(&PlaceId::from("p3")), Some(p3));
    assert_eq!(&engine.surface().removed()[removed_before..], &[p2.handle]);
}

#[tokio::test]
async fn no_op_status_update_leaves_results_alone() {
    let store = MemoryPlaceStore::new();
    save(&store, "p1").await;
    let mut engine = engine();
    engine.subscribe_status(&store, USER);
    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider(), start).await;

    store.set_status(
        USER,
        &PlaceId::from("p1"),
        StatusRecord {
            met: true,
            excluded: false,
        },
    );

    assert!(engine.apply_status().is_empty());
    assert_eq!(ids(engine.results()), vec!["p1", "p2", "p3"]);
    let cards = engine.cards();
    assert_eq!(cards[0].state, CardState::SavedMet);
    assert_eq!(cards[1].state, CardState::Plain);
}

#[tokio::test]
async fn excluded_before_search_never_appears() {
    let store = MemoryPlaceStore::new();
    save(&store, "p3").await;
    store.set_status(USER, &PlaceId::from("p3"), excluded());
    let mut engine = engine();
    engine.subscribe_status(&store, USER);

    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider(), start).await;

    assert_eq!(ids(engine.results()), vec!["p1", "p2"]);
}

#[tokio::test]
async fn deep_link_outside_results_is_pinned_selected_and_centered() {
    let store = MemoryPlaceStore::new();
    let mut saved = save(&store, "p9").await;
    saved.lat = Some(28.61);
    saved.lng = Some(-81.20);
    let mut engine = engine();

    assert!(engine.set_deep_link(Some(PlaceId::from("p9"))));
    let target = saved.to_target(PlaceId::from("p9"));
    let center = target.location.unwrap();
    let start = engine.deep_link_resolved(target, center);
    let completion = run(&mut engine, &provider(), start).await;

    assert_eq!(
        completion,
        SearchCompletion::Published {
            results: 4,
            focused: Some(PlaceId::from("p9"))
        }
    );
    assert_eq!(ids(engine.results()), vec!["p9", "p1", "p2", "p3"]);
    assert_eq!(engine.selected(), Some(&PlaceId::from("p9")));
    let marker = engine.marker_state(&PlaceId::from("p9")).unwrap();
    assert_eq!(marker.visual, MarkerVisual::Selected);
    assert_eq!(engine.surface().center(), Some(LatLng::new(28.61, -81.20)));
    assert_eq!(engine.surface().selected_count(), 1);
    assert_eq!(engine.navigation_state(), &NavigationState::Idle);
}

#[tokio::test]
async fn manual_click_clears_selection_and_blocks_later_auto_focus() {
    let mut engine = engine();
    let provider = provider();
    engine.set_deep_link(Some(PlaceId::from("p2")));
    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider, start).await;
    assert_eq!(engine.selected(), Some(&PlaceId::from("p2")));

    // Same deep link arrives again, then the user clicks the map.
    engine.set_deep_link(Some(PlaceId::from("p2")));
    let start = engine.map_click(LatLng::new(28.55, -81.40));

    assert_eq!(engine.surface().center(), Some(LatLng::new(28.55, -81.40)));
    assert!(engine.selected().is_none());
    assert_eq!(engine.marker_count(), 0);
    assert!(engine.results().is_empty());
    assert_eq!(engine.navigation_state(), &NavigationState::ManuallyNavigated);

    run(&mut engine, &provider, start).await;
    assert!(engine.selected().is_none());

    let start = engine.set_options(options(&[("A", true), ("B", false)]));
    let completion = run(&mut engine, &provider, start).await;

    assert_eq!(
        completion,
        SearchCompletion::Published {
            results: 2,
            focused: None
        }
    );
    assert!(engine.selected().is_none());
    assert_eq!(engine.surface().selected_count(), 0);
    assert!(engine
        .results()
        .iter()
        .all(|p| engine.marker_state(&p.id).unwrap().visual == MarkerVisual::Unselected));
}

#[tokio::test]
async fn second_trigger_while_in_flight_is_dropped() {
    let mut engine = engine();
    let first = engine.begin_search(here(), SearchOrigin::Background, None);
    let token = engine.in_flight().unwrap();
    assert_eq!(engine.surface().center(), Some(here()));

    assert_eq!(engine.map_click(LatLng::new(1.0, 1.0)), SearchStart::Dropped);
    assert_eq!(engine.surface().center(), Some(here()));
    assert_eq!(
        engine.begin_search(here(), SearchOrigin::Background, None),
        SearchStart::Dropped
    );
    assert_eq!(engine.in_flight(), Some(token));
    assert!(engine.results().is_empty());

    run(&mut engine, &provider(), first).await;
    assert_eq!(engine.results().len(), 3);
    assert_eq!(engine.center(), Some(here()));
}

#[tokio::test]
async fn stale_completion_is_discarded() {
    let mut engine = engine();
    let provider = provider();
    let first = engine
        .begin_search(here(), SearchOrigin::Background, None)
        .into_session()
        .unwrap();
    engine.complete_search(first.token, Ok(vec![place("p7")]));

    let second = engine.begin_search(here(), SearchOrigin::Background, None);
    let late = engine.complete_search(first.token, Ok(vec![place("p8")]));

    assert_eq!(late, SearchCompletion::Stale);
    assert!(engine.results().is_empty());
    assert!(engine.in_flight().is_some());

    run(&mut engine, &provider, second).await;
    assert_eq!(ids(engine.results()), vec!["p1", "p2", "p3"]);
}

#[tokio::test]
async fn failed_session_releases_lock_and_stays_empty() {
    let mut engine = engine();
    let failing = FakeProvider::new()
        .page("A", None, Scripted::Page(vec!["p1"], None))
        .page("B", None, Scripted::Transport);

    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    let completion = run(&mut engine, &failing, start).await;

    assert_eq!(completion, SearchCompletion::Failed);
    assert!(engine.in_flight().is_none());
    assert!(engine.results().is_empty());
    assert_eq!(engine.marker_count(), 0);

    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    assert!(matches!(start, SearchStart::Started(_)));
}

#[tokio::test]
async fn new_search_destroys_every_marker_first() {
    let mut engine = engine();
    let provider = provider();
    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider, start).await;
    engine
        .select(&PlaceId::from("p1"), SelectSource::Marker)
        .unwrap();
    assert!(engine.popup().is_some());

    let start = engine.begin_search(here(), SearchOrigin::Background, None);

    assert!(engine.surface().live_markers().is_empty());
    assert!(engine.surface().popup().is_none());
    assert!(engine.popup().is_none());
    assert!(engine.selected().is_none());
    run(&mut engine, &provider, start).await;
    assert_eq!(engine.surface().live_markers().len(), 3);
}

#[tokio::test]
async fn marker_click_is_manual_and_opens_single_popup() {
    let mut engine = engine();
    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider(), start).await;

    engine
        .select(&PlaceId::from("p1"), SelectSource::Marker)
        .unwrap();
    assert_eq!(engine.popup(), Some(&PlaceId::from("p1")));
    assert_eq!(engine.navigation_state(), &NavigationState::ManuallyNavigated);

    engine
        .select(&PlaceId::from("p3"), SelectSource::Card)
        .unwrap();
    assert!(engine.popup().is_none());
    assert_eq!(engine.surface().selected_count(), 1);
    assert_eq!(
        engine.marker_state(&PlaceId::from("p3")).unwrap().visual,
        MarkerVisual::Selected
    );
    assert_eq!(
        engine.marker_state(&PlaceId::from("p1")).unwrap().visual,
        MarkerVisual::Unselected
    );
}

#[tokio::test]
async fn card_selection_is_not_manual_navigation() {
    let mut engine = engine();
    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider(), start).await;

    engine
        .select(&PlaceId::from("p2"), SelectSource::ViewOnMap)
        .unwrap();

    assert_eq!(engine.navigation_state(), &NavigationState::Idle);
    assert_eq!(engine.surface().center(), place("p2").location);
}

#[test]
fn selecting_unknown_place_is_an_error() {
    let mut engine = engine();
    let err = engine
        .select(&PlaceId::from("nope"), SelectSource::Card)
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownPlace(_)));
}

#[tokio::test]
async fn excluding_selected_place_clears_selection_and_popup() {
    let store = MemoryPlaceStore::new();
    save(&store, "p1").await;
    let mut engine = engine();
    engine.subscribe_status(&store, USER);
    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider(), start).await;
    engine
        .select(&PlaceId::from("p1"), SelectSource::Marker)
        .unwrap();

    store.set_status(USER, &PlaceId::from("p1"), excluded());
    engine.apply_status();

    assert!(engine.selected().is_none());
    assert!(engine.popup().is_none());
    assert_eq!(engine.surface().selected_count(), 0);
}

#[tokio::test]
async fn hover_priority_survives_rapid_movement() {
    let mut engine = engine();
    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider(), start).await;
    let (p1, p2, p3) = (PlaceId::from("p1"), PlaceId::from("p2"), PlaceId::from("p3"));

    engine.select(&p1, SelectSource::Card).unwrap();
    engine.hover_enter(&p2);
    engine.hover_enter(&p3);
    engine.hover_leave(&p2);
    engine.hover_enter(&p1);

    assert_eq!(engine.marker_state(&p1).unwrap().visual, MarkerVisual::Selected);
    assert_eq!(engine.marker_state(&p2).unwrap().visual, MarkerVisual::Unselected);
    assert_eq!(engine.marker_state(&p3).unwrap().visual, MarkerVisual::Hovered);
    let cards = engine.cards();
    assert_eq!(cards[0].state, CardState::Selected);
    assert_eq!(cards[2].state, CardState::Hovered);
}

#[tokio::test]
async fn hover_on_place_outside_results_is_ignored() {
    let mut engine = engine();
    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider(), start).await;
    let p2 = PlaceId::from("p2");

    engine.hover_enter(&p2);
    engine.hover_enter(&PlaceId::from("gone"));

    assert_eq!(engine.hovered(), Some(&p2));
    assert_eq!(engine.marker_state(&p2).unwrap().visual, MarkerVisual::Hovered);
}

#[test]
fn hover_before_any_search_is_ignored() {
    let mut engine = engine();
    engine.hover_enter(&PlaceId::from("p1"));
    assert!(engine.hovered().is_none());
}

#[tokio::test]
async fn filter_change_requires_center_and_results() {
    let mut engine = engine();
    assert_eq!(
        engine.set_options(options(&[("A", true)])),
        SearchStart::NotNeeded
    );

    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider(), start).await;

    let start = engine.set_options(options(&[("A", false), ("B", false)]));
    assert_eq!(start, SearchStart::NoTerms);
    assert!(engine.results().is_empty());
    assert_eq!(engine.marker_count(), 0);
    assert!(engine.in_flight().is_none());

    // Nothing showing any more, so re-enabling waits for the next location trigger.
    assert_eq!(
        engine.set_options(options(&[("A", true)])),
        SearchStart::NotNeeded
    );
}

#[test]
fn stale_deep_link_resolution_is_ignored() {
    let mut engine = engine();
    engine.set_deep_link(Some(PlaceId::from("p9")));
    engine.set_deep_link(Some(PlaceId::from("p4")));

    let saved = SavedPlace::from_place(&place("p9"), None, Utc::now());
    let start = engine.deep_link_resolved(saved.to_target(PlaceId::from("p9")), here());

    assert_eq!(start, SearchStart::NotNeeded);
    assert!(engine.in_flight().is_none());
}

#[tokio::test]
async fn sign_out_stops_filtering() {
    let store = MemoryPlaceStore::new();
    save(&store, "p1").await;
    store.set_status(USER, &PlaceId::from("p1"), excluded());
    let mut engine = engine();
    engine.subscribe_status(&store, USER);
    engine.sign_out();

    let start = engine.begin_search(here(), SearchOrigin::Background, None);
    run(&mut engine, &provider(), start).await;

    assert!(engine.user().is_none());
    assert_eq!(ids(engine.results()), vec!["p1", "p2", "p3"]);
}
