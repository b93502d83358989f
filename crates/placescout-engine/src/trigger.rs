//! Typed inputs to the engine driver and the notices it emits.

use placescout_core::{LatLng, PlaceId, SearchOptions};

use crate::orchestrator::SelectSource;
use crate::session::SessionToken;

/// Everything the UI can ask of the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Click on empty map area.
    MapClick(LatLng),
    /// "Use my location" with coordinates from the device.
    Locate(LatLng),
    /// Zip code or free-form address typed by the user.
    LookupAddress(String),
    SetOptions(SearchOptions),
    /// The externally supplied place to focus; `None` clears it.
    DeepLink(Option<PlaceId>),
    Select {
        id: PlaceId,
        source: SelectSource,
    },
    HoverEnter(PlaceId),
    HoverLeave(PlaceId),
    ClosePopup,
    Save(PlaceId),
    SignIn(String),
    SignOut,
}

/// Notices for the UI: progress, toasts and failures.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SearchStarted {
        token: SessionToken,
    },
    /// A trigger arrived while a search was running and was ignored.
    SearchDropped,
    /// The search trigger cleared the map but no term is enabled.
    NothingToSearch,
    ResultsPublished {
        token: SessionToken,
        count: usize,
        focused: Option<PlaceId>,
    },
    SearchFailed {
        token: SessionToken,
        message: String,
    },
    GeocodeFailed {
        query: String,
        message: String,
    },
    DeepLinkUnresolved {
        id: PlaceId,
        message: String,
    },
    /// Status update removed places from the results.
    ResultsFiltered {
        removed: Vec<PlaceId>,
    },
    Saved {
        id: PlaceId,
        name: String,
    },
    SaveFailed {
        id: PlaceId,
        message: String,
    },
    SelectFailed {
        id: PlaceId,
    },
}
