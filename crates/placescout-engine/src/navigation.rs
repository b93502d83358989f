//! Deep-link versus manual-navigation arbitration.
//!
//! A deep link asks the engine to focus one place once its marker exists. A
//! manual click on the map or on a marker overrides that wish until a
//! different place is deep-linked.

use placescout_core::PlaceId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NavigationState {
    #[default]
    Idle,
    PendingDeepLink(PlaceId),
    ManuallyNavigated,
}

/// What caused a search session, captured when the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrigin {
    /// A click on empty map area.
    Manual,
    /// Deep-link resolution.
    DeepLink,
    /// Filter change, zip lookup, geolocation or the initial search.
    Background,
}

impl SearchOrigin {
    #[must_use]
    pub fn is_manual(self) -> bool {
        matches!(self, SearchOrigin::Manual)
    }
}

#[derive(Debug, Default)]
pub struct NavigationResolver {
    state: NavigationState,
    deep_link: Option<PlaceId>,
}

impl NavigationResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// The deep-linked place id, whether or not focusing it is still pending.
    #[must_use]
    pub fn deep_link(&self) -> Option<&PlaceId> {
        self.deep_link.as_ref()
    }

    /// Records the externally supplied deep-link id.
    ///
    /// A new id always arms a pending focus. Repeating the current id re-arms
    /// it only from `Idle`; manual navigation stays sticky. `None` resets to
    /// `Idle`. Returns `true` when a focus is now pending.
    pub fn set_deep_link(&mut self, id: Option<PlaceId>) -> bool {
        let Some(id) = id else {
            self.deep_link = None;
            self.state = NavigationState::Idle;
            return false;
        };

        let is_new = self.deep_link.as_ref() != Some(&id);
        match (&self.state, is_new) {
            (NavigationState::ManuallyNavigated, false) => {
                tracing::debug!(place_id = %id, "deep link unchanged after manual navigation");
                false
            }
            _ => {
                self.deep_link = Some(id.clone());
                self.state = NavigationState::PendingDeepLink(id);
                true
            }
        }
    }

    /// The user clicked the map or a marker.
    pub fn manual_interaction(&mut self) {
        if self.state != NavigationState::ManuallyNavigated {
            tracing::debug!(previous = ?self.state, "manual navigation");
        }
        self.state = NavigationState::ManuallyNavigated;
    }

    /// Called once per completed session. Returns the place to auto-focus,
    /// consuming the pending deep link, when the session was not manual and
    /// `has_marker` confirms the target is plotted.
    pub fn on_search_complete(
        &mut self,
        origin: SearchOrigin,
        has_marker: impl Fn(&PlaceId) -> bool,
    ) -> Option<PlaceId> {
        if origin.is_manual() {
            return None;
        }
        let NavigationState::PendingDeepLink(id) = &self.state else {
            return None;
        };
        if !has_marker(id) {
            tracing::debug!(place_id = %id, "deep-linked place not plotted yet");
            return None;
        }
        let id = id.clone();
        self.state = NavigationState::Idle;
        Some(id)
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PlaceId> {
        match &self.state {
            NavigationState::PendingDeepLink(id) => Some(id),
            NavigationState::Idle | NavigationState::ManuallyNavigated => None,
        }
    }

    /// `true` while `id` is the deep link waiting to be focused.
    #[must_use]
    pub fn is_pending(&self, id: &PlaceId) -> bool {
        matches!(&self.state, NavigationState::PendingDeepLink(p) if p == id)
    }
}
