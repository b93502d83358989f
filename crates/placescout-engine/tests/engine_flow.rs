//! End-to-end engine runs against a wiremock places API.

use std::sync::Arc;
use std::time::Duration;

use placescout_core::{LatLng, PlaceId, SearchOptions, SearchTerm};
use placescout_engine::{
    EngineDriver, EngineEvent, HeadlessSurface, MapEngine, MemoryPlaceStore, ReconcileSettings,
    SaveSink, SelectSource, StatusFeed, Trigger,
};
use placescout_places::{GeoProvider, PlacesClient};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn place_json(id: &str, lat: f64, lng: f64) -> serde_json::Value {
    serde_json::json!({
        "place_id": id,
        "name": format!("Clinic {id}"),
        "vicinity": "Orlando",
        "geometry": { "location": { "lat": lat, "lng": lng } },
        "rating": 4.6,
        "user_ratings_total": 88
    })
}

async fn mount_nearby(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/place/nearbysearch/json"))
        .and(query_param("keyword", "Optometrist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&serde_json::json!({
            "status": "OK",
            "results": [place_json("p1", 28.54, -81.38), place_json("p2", 28.55, -81.37)],
            "next_page_token": "NEXT"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/place/nearbysearch/json"))
        .and(query_param("pagetoken", "NEXT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&serde_json::json!({
            "status": "OK",
            "results": [place_json("p4", 28.56, -81.36)]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/place/nearbysearch/json"))
        .and(query_param("keyword", "Eye care center"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&serde_json::json!({
            "status": "OK",
            "results": [place_json("p2", 28.55, -81.37), place_json("p3", 28.53, -81.39)]
        })))
        .mount(server)
        .await;
}

fn engine() -> MapEngine<HeadlessSurface> {
    let options = SearchOptions {
        radius_miles: 2.0,
        terms: vec![
            SearchTerm {
                keyword: "Optometrist".to_owned(),
                enabled: true,
            },
            SearchTerm {
                keyword: "Eye care center".to_owned(),
                enabled: true,
            },
        ],
    };
    MapEngine::new(
        HeadlessSurface::new(),
        options,
        ReconcileSettings {
            page_delay: Duration::ZERO,
            max_pages: 3,
        },
    )
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<EngineEvent>) -> EngineEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for engine event")
        .expect("event channel closed")
}

#[tokio::test]
async fn paginated_multi_term_search_through_http_client() {
    let server = MockServer::start().await;
    mount_nearby(&server).await;

    let client = PlacesClient::with_base_url("test-key", 30, &server.uri()).unwrap();
    let provider: Arc<dyn GeoProvider> = Arc::new(client);
    let store = Arc::new(MemoryPlaceStore::new());
    let sink: Arc<dyn SaveSink> = store.clone();
    let feed: Arc<dyn StatusFeed> = store.clone();
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let driver = EngineDriver::new(engine(), provider, sink, feed, event_tx);
    let (triggers, trigger_rx) = mpsc::channel(8);
    let task = tokio::spawn(driver.run(trigger_rx));

    triggers
        .send(Trigger::Locate(LatLng::new(28.5383, -81.3792)))
        .await
        .unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        EngineEvent::SearchStarted { .. }
    ));
    assert!(matches!(
        next_event(&mut events).await,
        EngineEvent::ResultsPublished { count: 4, .. }
    ));

    triggers
        .send(Trigger::Select {
            id: PlaceId::from("p3"),
            source: SelectSource::Marker,
        })
        .await
        .unwrap();
    drop(triggers);
    let engine = task.await.unwrap();

    let order: Vec<&str> = engine.results().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(order, vec!["p1", "p2", "p4", "p3"]);
    assert_eq!(engine.selected(), Some(&PlaceId::from("p3")));
    assert_eq!(engine.popup(), Some(&PlaceId::from("p3")));
    assert_eq!(engine.surface().selected_count(), 1);
    assert_eq!(engine.surface().center(), Some(LatLng::new(28.53, -81.39)));

    let cards = engine.cards();
    assert_eq!(cards[0].stars.map(|s| s.render()).as_deref(), Some("★★★★½"));
    assert_eq!(
        cards[0].directions.as_deref(),
        Some("https://www.google.com/maps/dir/?api=1&destination=28.54,-81.38")
    );
}

#[tokio::test]
async fn denied_term_does_not_sink_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/place/nearbysearch/json"))
        .and(query_param("keyword", "Optometrist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "This API project is not authorized to use this API.",
            "results": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/place/nearbysearch/json"))
        .and(query_param("keyword", "Eye care center"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&serde_json::json!({
            "status": "OK",
            "results": [place_json("p3", 28.53, -81.39)]
        })))
        .mount(&server)
        .await;

    let client = PlacesClient::with_base_url("test-key", 30, &server.uri()).unwrap();
    let store = Arc::new(MemoryPlaceStore::new());
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let driver = EngineDriver::new(engine(), Arc::new(client), store.clone(), store, event_tx);
    let (triggers, trigger_rx) = mpsc::channel(8);
    let task = tokio::spawn(driver.run(trigger_rx));

    triggers
        .send(Trigger::MapClick(LatLng::new(28.5, -81.4)))
        .await
        .unwrap();
    next_event(&mut events).await;
    assert!(matches!(
        next_event(&mut events).await,
        EngineEvent::ResultsPublished { count: 1, .. }
    ));

    drop(triggers);
    let engine = task.await.unwrap();
    assert_eq!(engine.results()[0].id, PlaceId::from("p3"));
}

#[tokio::test]
async fn server_error_on_first_page_fails_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/place/nearbysearch/json"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = PlacesClient::with_base_url("test-key", 30, &server.uri()).unwrap();
    let store = Arc::new(MemoryPlaceStore::new());
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let driver = EngineDriver::new(engine(), Arc::new(client), store.clone(), store, event_tx);
    let (triggers, trigger_rx) = mpsc::channel(8);
    let task = tokio::spawn(driver.run(trigger_rx));

    triggers
        .send(Trigger::Locate(LatLng::new(28.5, -81.4)))
        .await
        .unwrap();
    next_event(&mut events).await;
    match next_event(&mut events).await {
        EngineEvent::SearchFailed { message, .. } => {
            assert!(message.contains("Optometrist"), "{message}");
        }
        other => panic!("unexpected event {other:?}"),
    }

    drop(triggers);
    let engine = task.await.unwrap();
    assert!(engine.results().is_empty());
    assert!(engine.in_flight().is_none());
}
