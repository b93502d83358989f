pub mod client;
pub mod error;
mod lookup;
pub mod normalize;
pub mod provider;
pub(crate) mod retry;
pub mod types;

pub use client::PlacesClient;
pub use error::GeoError;
pub use provider::{DetailField, GeoProvider, NearbyPage, NearbyRequest, PlaceDetails};
