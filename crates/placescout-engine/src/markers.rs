//! Place-to-marker bookkeeping.
//!
//! The registry keeps two views of what it has drawn: `by_place`, the live
//! 1:1 mapping used for lookups, and `ledger`, every handle created and not
//! yet removed. [`MarkerRegistry::destroy_all`] walks the ledger, so a marker
//! that somehow fell out of `by_place` is still cleaned up on the next search.

use std::collections::HashMap;

use placescout_core::{Place, PlaceId};

use crate::surface::{MapSurface, MarkerHandle, MarkerVisual};

/// Per-place marker state exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerState {
    pub handle: MarkerHandle,
    pub visual: MarkerVisual,
}

#[derive(Debug, Default)]
pub struct MarkerRegistry {
    by_place: HashMap<PlaceId, MarkerState>,
    ledger: Vec<MarkerHandle>,
}

impl MarkerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every marker ever created by this registry.
    pub fn destroy_all(&mut self, surface: &mut dyn MapSurface) {
        let count = self.ledger.len();
        for handle in self.ledger.drain(..) {
            surface.remove_marker(handle);
        }
        self.by_place.clear();
        if count > 0 {
            tracing::debug!(count, "destroyed all markers");
        }
    }

    /// Replaces all markers with one per located place in `results`.
    ///
    /// Places without a location stay unplotted. Duplicate ids keep their
    /// first marker.
    pub fn rebuild(&mut self, surface: &mut dyn MapSurface, results: &[Place]) {
        self.destroy_all(surface);
        for place in results {
            let Some(location) = place.location else {
                continue;
            };
            if self.by_place.contains_key(&place.id) {
                continue;
            }
            let handle = surface.create_marker(place, location);
            self.ledger.push(handle);
            self.by_place.insert(
                place.id.clone(),
                MarkerState {
                    handle,
                    visual: MarkerVisual::Unselected,
                },
            );
        }
        tracing::debug!(
            markers = self.by_place.len(),
            results = results.len(),
            "markers rebuilt"
        );
    }

    /// Destroys the marker for `id`, if any. Other markers are untouched.
    pub fn remove(&mut self, surface: &mut dyn MapSurface, id: &PlaceId) -> bool {
        let Some(state) = self.by_place.remove(id) else {
            return false;
        };
        surface.remove_marker(state.handle);
        self.ledger.retain(|h| *h != state.handle);
        true
    }

    /// Pushes `visual` to the surface when it differs from the recorded one.
    pub fn set_visual(
        &mut self,
        surface: &mut dyn MapSurface,
        id: &PlaceId,
        visual: MarkerVisual,
    ) {
        if let Some(state) = self.by_place.get_mut(id) {
            if state.visual != visual {
                state.visual = visual;
                surface.set_marker_visual(state.handle, visual);
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &PlaceId) -> Option<MarkerState> {
        self.by_place.get(id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: &PlaceId) -> bool {
        self.by_place.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_place.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_place.is_empty()
    }

    pub fn place_ids(&self) -> impl Iterator<Item = &PlaceId> {
        self.by_place.keys()
    }
}
