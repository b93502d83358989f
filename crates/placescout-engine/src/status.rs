//! Live status feed contract and the engine's latest-value cache.
//!
//! A [`StatusFeed`] hands out a `watch` receiver per user. The engine keeps
//! one clone in [`StatusCache`] for synchronous reads at filter time, and the
//! driver keeps another to be woken on change.

use placescout_core::{PlaceId, StatusSnapshot};
use tokio::sync::watch;

/// External per-user status store.
///
/// Dropping every receiver returned by [`StatusFeed::subscribe`] is the
/// unsubscribe.
pub trait StatusFeed: Send + Sync {
    fn subscribe(&self, user: &str) -> watch::Receiver<StatusSnapshot>;
}

/// Synchronously readable view of the latest status snapshot.
///
/// Cheap to clone; a clone travels with each search task so the reconciler
/// filters against whatever the feed holds when it finishes, not when it
/// started.
#[derive(Debug, Clone, Default)]
pub struct StatusView {
    rx: Option<watch::Receiver<StatusSnapshot>>,
}

impl StatusView {
    #[must_use]
    pub fn new(rx: watch::Receiver<StatusSnapshot>) -> Self {
        Self { rx: Some(rx) }
    }

    /// `true` when the latest snapshot flags `id` as excluded.
    #[must_use]
    pub fn is_excluded(&self, id: &PlaceId) -> bool {
        self.rx
            .as_ref()
            .is_some_and(|rx| rx.borrow().is_excluded(id))
    }

    /// Clone of the latest snapshot; empty when unsubscribed.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        self.rx
            .as_ref()
            .map(|rx| rx.borrow().clone())
            .unwrap_or_default()
    }
}

/// The engine's single subscription slot.
#[derive(Debug, Default)]
pub struct StatusCache {
    user: Option<String>,
    view: StatusView,
}

impl StatusCache {
    /// Subscribes for `user`, replacing any previous subscription.
    pub fn subscribe(&mut self, feed: &dyn StatusFeed, user: &str) {
        if self.user.as_deref() == Some(user) {
            return;
        }
        if let Some(previous) = self.user.replace(user.to_owned()) {
            tracing::info!(previous, user, "status scope changed");
        }
        self.view = StatusView::new(feed.subscribe(user));
    }

    /// Drops the subscription and forgets every record.
    pub fn clear(&mut self) {
        self.user = None;
        self.view = StatusView::default();
    }

    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    #[must_use]
    pub fn view(&self) -> &StatusView {
        &self.view
    }

    /// A receiver for change notifications, when subscribed.
    #[must_use]
    pub fn receiver(&self) -> Option<watch::Receiver<StatusSnapshot>> {
        self.view.rx.clone()
    }
}
