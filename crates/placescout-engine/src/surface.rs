//! The drawing surface the engine renders markers onto.

use std::collections::HashMap;

use placescout_core::{LatLng, Place, PlaceId};

/// Opaque handle to one marker object on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(u64);

impl MarkerHandle {
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Marker visual states in ascending rendering precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkerVisual {
    #[default]
    Unselected,
    Hovered,
    Selected,
}

impl MarkerVisual {
    /// Stacking order so higher-precedence markers draw on top.
    #[must_use]
    pub fn z_index(self) -> i32 {
        match self {
            MarkerVisual::Unselected => 0,
            MarkerVisual::Hovered => 1000,
            MarkerVisual::Selected => 2000,
        }
    }
}

/// Map widget operations used by the engine.
///
/// Only the engine's reducer calls these. New markers start `Unselected`.
pub trait MapSurface {
    fn create_marker(&mut self, place: &Place, location: LatLng) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
    fn set_marker_visual(&mut self, handle: MarkerHandle, visual: MarkerVisual);
    fn pan_to(&mut self, location: LatLng);
    fn open_popup(&mut self, handle: MarkerHandle, place: &Place);
    fn close_popup(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub place_id: PlaceId,
    pub location: LatLng,
    pub visual: MarkerVisual,
}

/// In-memory surface for the CLI and tests. Records everything it is asked to draw.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    next_handle: u64,
    markers: HashMap<MarkerHandle, HeadlessMarker>,
    removed: Vec<MarkerHandle>,
    center: Option<LatLng>,
    popup: Option<MarkerHandle>,
    visual_updates: usize,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers currently on the surface.
    #[must_use]
    pub fn live_markers(&self) -> &HashMap<MarkerHandle, HeadlessMarker> {
        &self.markers
    }

    #[must_use]
    pub fn marker(&self, handle: MarkerHandle) -> Option<&HeadlessMarker> {
        self.markers.get(&handle)
    }

    /// Total markers ever created.
    #[must_use]
    pub fn created_count(&self) -> u64 {
        self.next_handle
    }

    #[must_use]
    pub fn removed(&self) -> &[MarkerHandle] {
        &self.removed
    }

    #[must_use]
    pub fn center(&self) -> Option<LatLng> {
        self.center
    }

    #[must_use]
    pub fn popup(&self) -> Option<MarkerHandle> {
        self.popup
    }

    #[must_use]
    pub fn visual_updates(&self) -> usize {
        self.visual_updates
    }

    /// Number of live markers drawn as `Selected`.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.markers
            .values()
            .filter(|m| m.visual == MarkerVisual::Selected)
            .count()
    }
}

impl MapSurface for HeadlessSurface {
    fn create_marker(&mut self, place: &Place, location: LatLng) -> MarkerHandle {
        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        self.markers.insert(
            handle,
            HeadlessMarker {
                place_id: place.id.clone(),
                location,
                visual: MarkerVisual::Unselected,
            },
        );
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle).is_some() {
            self.removed.push(handle);
        }
        if self.popup == Some(handle) {
            self.popup = None;
        }
    }

    fn set_marker_visual(&mut self, handle: MarkerHandle, visual: MarkerVisual) {
        if let Some(marker) = self.markers.get_mut(&handle) {
            marker.visual = visual;
            self.visual_updates += 1;
        }
    }

    fn pan_to(&mut self, location: LatLng) {
        self.center = Some(location);
    }

    fn open_popup(&mut self, handle: MarkerHandle, _place: &Place) {
        self.popup = Some(handle);
    }

    fn close_popup(&mut self) {
        self.popup = None;
    }
}
