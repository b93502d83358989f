//! Search-and-marker synchronization engine.
//!
//! [`MapEngine`] owns the result set, markers, selection and navigation
//! intent; [`EngineDriver`] feeds it typed [`Trigger`]s and runs the async
//! work (paginated searches, geocoding, saves) around it.

pub mod cards;
pub mod driver;
pub mod error;
pub mod markers;
pub mod navigation;
pub mod orchestrator;
pub mod reconciler;
pub mod save;
pub mod selection;
pub mod session;
pub mod status;
pub mod store;
pub mod surface;
#[cfg(test)]
mod testing;
pub mod trigger;

pub use cards::{CardState, ResultCard};
pub use driver::EngineDriver;
pub use error::EngineError;
pub use markers::{MarkerRegistry, MarkerState};
pub use navigation::{NavigationResolver, NavigationState, SearchOrigin};
pub use orchestrator::{MapEngine, SearchCompletion, SearchStart, SelectSource};
pub use reconciler::{reconcile, ReconcileSettings};
pub use save::save_place;
pub use selection::SelectionState;
pub use session::{SearchSession, SessionToken};
pub use status::{StatusCache, StatusFeed, StatusView};
pub use store::{MemoryPlaceStore, SaveSink};
pub use surface::{HeadlessMarker, HeadlessSurface, MapSurface, MarkerHandle, MarkerVisual};
pub use trigger::{EngineEvent, Trigger};
