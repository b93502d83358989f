use std::fmt;

use placescout_core::{LatLng, TargetPlace};

use crate::navigation::SearchOrigin;

/// Identifies one search session. Results carrying a stale token are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    #[must_use]
    pub fn first() -> Self {
        Self(1)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Immutable parameters of one search session.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSession {
    pub token: SessionToken,
    pub center: LatLng,
    pub radius_meters: f64,
    /// Keywords in configuration order.
    pub terms: Vec<String>,
    /// Place pinned to the front of the results when the search misses it.
    pub target: Option<TargetPlace>,
    pub origin: SearchOrigin,
}
