//! Selected/hovered tracking and marker visual rendering.
//!
//! State is two slots: at most one selected place and at most one hovered
//! place. Every transition re-derives each marker's visual from those slots
//! with `Selected > Hovered > Unselected` precedence, so a late hover-leave
//! can never paint over a newer hover or the selection.

use placescout_core::PlaceId;

use crate::markers::MarkerRegistry;
use crate::surface::{MapSurface, MarkerVisual};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<PlaceId>,
    hovered: Option<PlaceId>,
}

impl SelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&PlaceId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&PlaceId> {
        self.hovered.as_ref()
    }

    /// The visual `id` should currently show.
    #[must_use]
    pub fn visual_for(&self, id: &PlaceId) -> MarkerVisual {
        if self.selected.as_ref() == Some(id) {
            MarkerVisual::Selected
        } else if self.hovered.as_ref() == Some(id) {
            MarkerVisual::Hovered
        } else {
            MarkerVisual::Unselected
        }
    }

    /// Makes `id` the only selected place. Any hover is dropped.
    pub fn select(
        &mut self,
        registry: &mut MarkerRegistry,
        surface: &mut dyn MapSurface,
        id: &PlaceId,
    ) {
        self.selected = Some(id.clone());
        self.hovered = None;
        self.render(registry, surface);
    }

    pub fn clear_selection(
        &mut self,
        registry: &mut MarkerRegistry,
        surface: &mut dyn MapSurface,
    ) {
        self.selected = None;
        self.render(registry, surface);
    }

    /// Pointer entered `id`. Ignored while `id` is the selection.
    pub fn hover_enter(
        &mut self,
        registry: &mut MarkerRegistry,
        surface: &mut dyn MapSurface,
        id: &PlaceId,
    ) {
        if self.selected.as_ref() == Some(id) {
            return;
        }
        self.hovered = Some(id.clone());
        self.render(registry, surface);
    }

    /// Pointer left `id`. Only clears the hover if `id` is still the hovered place.
    pub fn hover_leave(
        &mut self,
        registry: &mut MarkerRegistry,
        surface: &mut dyn MapSurface,
        id: &PlaceId,
    ) {
        if self.hovered.as_ref() != Some(id) {
            tracing::trace!(place_id = %id, "ignoring stale hover leave");
            return;
        }
        self.hovered = None;
        self.render(registry, surface);
    }

    /// Drops `id` from both slots after its place left the results.
    /// Returns `true` if it was selected.
    pub fn forget(&mut self, id: &PlaceId) -> bool {
        if self.hovered.as_ref() == Some(id) {
            self.hovered = None;
        }
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
            return true;
        }
        false
    }

    /// Clears both slots and paints every marker `Unselected`.
    pub fn reset(
        &mut self,
        registry: &mut MarkerRegistry,
        surface: &mut dyn MapSurface,
    ) {
        self.selected = None;
        self.hovered = None;
        self.render(registry, surface);
    }

    /// Re-derives every marker's visual from the current slots.
    pub fn render(&self, registry: &mut MarkerRegistry, surface: &mut dyn MapSurface) {
        let ids: Vec<PlaceId> = registry.place_ids().cloned().collect();
        for id in &ids {
            registry.set_visual(surface, id, self.visual_for(id));
        }
    }
}
