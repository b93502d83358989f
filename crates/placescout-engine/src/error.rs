use placescout_core::PlaceId;
use placescout_places::GeoError;
use thiserror::Error;

/// Errors surfaced by the map engine and its collaborators.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A term's first nearby-search request failed in transport or decoding.
    /// Aborts the whole session.
    #[error("nearby search for \"{term}\" failed: {source}")]
    Search {
        term: String,
        #[source]
        source: GeoError,
    },

    #[error("geocoding \"{query}\" failed: {source}")]
    Geocode {
        query: String,
        #[source]
        source: GeoError,
    },

    /// The search task ended without producing a result (panicked or was aborted).
    #[error("search task ended abnormally: {0}")]
    TaskFailed(String),

    #[error("no saved record for deep-linked place {0}")]
    DeepLinkNotFound(PlaceId),

    #[error("saved place {0} has neither coordinates nor an address")]
    DeepLinkUnlocatable(PlaceId),

    #[error("place {0} is not in the current results")]
    UnknownPlace(PlaceId),

    #[error("no signed-in user")]
    NotSignedIn,

    #[error("save sink error: {0}")]
    Sink(String),
}
