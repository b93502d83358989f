//! Command handlers that run the engine headlessly.
//!
//! Each handler builds a fresh [`EngineDriver`] over a [`HeadlessSurface`],
//! feeds it triggers the way a map UI would and prints the final result
//! cards. Saved places come from an optional JSON file and live only for the
//! duration of the command.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use placescout_core::{AppConfig, LatLng, PlaceId, SavedPlace, SearchOptions, SearchProfile};
use placescout_engine::{
    CardState, EngineDriver, EngineEvent, HeadlessSurface, MapEngine, MemoryPlaceStore,
    ReconcileSettings, ResultCard, SaveSink, SelectSource, Trigger,
};
use placescout_places::PlacesClient;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{CenterArgs, FilterArgs, SavedArgs};

/// A running driver plus both ends of its channels.
struct Session {
    triggers: mpsc::Sender<Trigger>,
    events: mpsc::UnboundedReceiver<EngineEvent>,
    task: JoinHandle<MapEngine<HeadlessSurface>>,
}

impl Session {
    async fn start(
        config: &AppConfig,
        options: SearchOptions,
        saved: SavedArgs,
    ) -> anyhow::Result<Self> {
        let client = PlacesClient::from_config(config)
            .map_err(|e| anyhow::anyhow!("failed to build places client: {e}"))?;
        let store = Arc::new(MemoryPlaceStore::new());
        if let (Some(user), Some(path)) = (saved.user.as_deref(), saved.saved.as_deref()) {
            let seeded = seed_store(&store, user, path).await?;
            tracing::info!(user, seeded, path = %path.display(), "loaded saved places");
        }

        let engine = MapEngine::new(
            HeadlessSurface::new(),
            options,
            ReconcileSettings::from_config(config),
        );
        let (event_tx, events) = mpsc::unbounded_channel();
        let driver = EngineDriver::new(
            engine,
            Arc::new(client),
            store.clone(),
            store.clone(),
            event_tx,
        );
        let (triggers, trigger_rx) = mpsc::channel(16);
        let task = tokio::spawn(driver.run(trigger_rx));
        let session = Self {
            triggers,
            events,
            task,
        };
        if let Some(user) = saved.user {
            session.send(Trigger::SignIn(user)).await?;
        }
        Ok(session)
    }

    async fn send(&self, trigger: Trigger) -> anyhow::Result<()> {
        self.triggers
            .send(trigger)
            .await
            .map_err(|_| anyhow::anyhow!("engine stopped unexpectedly"))
    }

    async fn next_event(&mut self) -> anyhow::Result<EngineEvent> {
        self.events
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("engine stopped unexpectedly"))
    }

    /// Waits for the running search to publish. Returns the focused place.
    async fn await_results(&mut self) -> anyhow::Result<Option<PlaceId>> {
        loop {
            match self.next_event().await? {
                EngineEvent::ResultsPublished { count, focused, .. } => {
                    tracing::info!(count, "results published");
                    return Ok(focused);
                }
                EngineEvent::SearchFailed { message, .. } => {
                    anyhow::bail!("search failed: {message}")
                }
                EngineEvent::GeocodeFailed { query, message } => {
                    anyhow::bail!("could not locate '{query}': {message}")
                }
                EngineEvent::DeepLinkUnresolved { id, message } => {
                    anyhow::bail!("could not focus {id}: {message}")
                }
                EngineEvent::NothingToSearch => {
                    anyhow::bail!("no search terms are enabled")
                }
                other => tracing::debug!(event = ?other, "engine event"),
            }
        }
    }

    async fn await_save(&mut self) -> anyhow::Result<()> {
        loop {
            match self.next_event().await? {
                EngineEvent::Saved { name, .. } => {
                    println!("saved: {name}");
                    return Ok(());
                }
                EngineEvent::SaveFailed { id, message } => {
                    anyhow::bail!("failed to save {id}: {message}")
                }
                other => tracing::debug!(event = ?other, "engine event"),
            }
        }
    }

    /// Closes the trigger channel and reports notices still queued.
    async fn finish(mut self) -> anyhow::Result<MapEngine<HeadlessSurface>> {
        drop(self.triggers);
        let engine = self.task.await.context("engine task failed")?;
        while let Ok(event) = self.events.try_recv() {
            match event {
                EngineEvent::SelectFailed { id } => println!("note: {id} is not in the results"),
                EngineEvent::ResultsFiltered { removed } => {
                    println!("note: {} result(s) hidden by saved status", removed.len());
                }
                other => tracing::debug!(event = ?other, "engine event"),
            }
        }
        Ok(engine)
    }
}

/// Runs one search session around the requested center.
///
/// # Errors
///
/// Returns an error if the filters do not match the profile, the center
/// cannot be geocoded, or the search session fails.
pub(crate) async fn run_search(
    config: &AppConfig,
    profile: &SearchProfile,
    center: CenterArgs,
    filters: &FilterArgs,
    saved: SavedArgs,
    select: Option<String>,
    save: Option<String>,
) -> anyhow::Result<()> {
    let options = build_options(profile, filters)?;
    let mut session = Session::start(config, options, saved).await?;

    let trigger = match (center.address, center.lat, center.lng) {
        (Some(address), _, _) => Trigger::LookupAddress(address),
        (None, Some(lat), Some(lng)) => Trigger::Locate(LatLng::new(lat, lng)),
        _ => Trigger::Locate(profile.default_center),
    };
    session.send(trigger).await?;
    session.await_results().await?;

    if let Some(id) = select {
        session
            .send(Trigger::Select {
                id: PlaceId::new(id),
                source: SelectSource::Marker,
            })
            .await?;
    }
    if let Some(id) = save {
        session.send(Trigger::Save(PlaceId::new(id))).await?;
        session.await_save().await?;
    }

    let engine = session.finish().await?;
    print_results(&engine);
    Ok(())
}

/// Resolves a saved place, searches around it and selects it.
///
/// # Errors
///
/// Returns an error without `--user`, or if the saved record cannot be
/// found or located, or if the search fails.
pub(crate) async fn run_focus(
    config: &AppConfig,
    profile: &SearchProfile,
    place_id: String,
    filters: &FilterArgs,
    saved: SavedArgs,
) -> anyhow::Result<()> {
    if saved.user.is_none() {
        anyhow::bail!("focus needs --user to look up the saved place");
    }
    let options = build_options(profile, filters)?;
    let mut session = Session::start(config, options, saved).await?;

    session
        .send(Trigger::DeepLink(Some(PlaceId::new(place_id.clone()))))
        .await?;
    let focused = session.await_results().await?;
    if focused.is_none() {
        println!("note: {place_id} has no marker yet, focus stays pending");
    }

    let engine = session.finish().await?;
    print_results(&engine);
    Ok(())
}

/// Prints the coordinates for a zip code or address.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the lookup fails.
pub(crate) async fn run_geocode(config: &AppConfig, query: &str) -> anyhow::Result<()> {
    let client = PlacesClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build places client: {e}"))?;
    let location = client
        .geocode_address(query)
        .await
        .with_context(|| format!("could not locate '{query}'"))?;
    println!("{},{}", location.lat, location.lng);
    Ok(())
}

/// Applies `--radius` and `--term` to the profile's default options.
pub(crate) fn build_options(profile: &SearchProfile, filters: &FilterArgs) -> anyhow::Result<SearchOptions> {
    let mut options = profile.options();

    if let Some(radius) = filters.radius {
        if !profile.allows_radius(radius) {
            anyhow::bail!(
                "radius {radius} is not offered; choose one of {:?}",
                profile.radius_choices
            );
        }
        options.radius_miles = radius;
    }

    if !filters.terms.is_empty() {
        for wanted in &filters.terms {
            if !options
                .terms
                .iter()
                .any(|t| t.keyword.eq_ignore_ascii_case(wanted))
            {
                anyhow::bail!("unknown search term '{wanted}'");
            }
        }
        for term in &mut options.terms {
            term.enabled = filters
                .terms
                .iter()
                .any(|wanted| term.keyword.eq_ignore_ascii_case(wanted));
        }
    }

    Ok(options)
}

/// Loads `{ "<place id>": SavedPlace, ... }` into the store for `user`.
async fn seed_store(store: &MemoryPlaceStore, user: &str, path: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read saved places at {}", path.display()))?;
    let records: HashMap<PlaceId, SavedPlace> =
        serde_json::from_str(&raw).context("failed to parse saved places")?;
    let count = records.len();
    for (id, record) in records {
        store.upsert(user, &id, record).await?;
    }
    Ok(count)
}

fn print_results(engine: &MapEngine<HeadlessSurface>) {
    let cards = engine.cards();
    if cards.is_empty() {
        println!("no places found");
        return;
    }
    for (i, card) in cards.iter().enumerate() {
        println!("{}", format_card(i + 1, card));
    }
}

pub(crate) fn format_card(position: usize, card: &ResultCard) -> String {
    let badge = match card.state {
        CardState::Selected => "[selected]",
        CardState::Hovered => "[hovered]",
        CardState::SavedMet => "[met]",
        CardState::Plain => "",
    };
    let mut line = format!("{position:>2}. {}", card.place.name);
    if !badge.is_empty() {
        let _ = write!(line, " {badge}");
    }
    if let Some(stars) = card.stars {
        let _ = write!(
            line,
            "  {} ({})",
            stars.render(),
            card.place.rating_count.unwrap_or(0)
        );
    }
    if let Some(address) = &card.place.address {
        let _ = write!(line, "\n    {address}");
    }
    if let Some(url) = &card.directions {
        let _ = write!(line, "\n    {url}");
    }
    if !card.plotted {
        line.push_str("\n    (not on map)");
    }
    line
}
