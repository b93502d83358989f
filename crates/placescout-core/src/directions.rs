//! Display helpers for a listed place: directions link and star summary.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::place::Place;

const DIRECTIONS_BASE: &str = "https://www.google.com/maps/dir/?api=1&destination=";

/// Builds a directions link to `place`.
///
/// Coordinates win over the address; returns `None` when neither is known.
#[must_use]
pub fn directions_url(place: &Place) -> Option<String> {
    if let Some(loc) = place.location {
        return Some(format!("{DIRECTIONS_BASE}{},{}", loc.lat, loc.lng));
    }
    let address = place.address.as_deref().filter(|a| !a.trim().is_empty())?;
    Some(format!(
        "{DIRECTIONS_BASE}{}",
        utf8_percent_encode(address, NON_ALPHANUMERIC)
    ))
}

/// Five-star breakdown of a provider rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRating {
    pub full: u8,
    pub half: bool,
    pub empty: u8,
}

impl StarRating {
    /// `None` for missing or zero ratings. Ratings are clamped to `0..=5`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_rating(rating: Option<f32>) -> Option<Self> {
        let rating = rating.filter(|r| *r > 0.0)?.min(5.0);
        let full = rating.floor() as u8;
        let half = rating.fract() >= 0.5;
        let empty = 5 - full - u8::from(half);
        Some(Self { full, half, empty })
    }

    /// Renders as `★★★½☆`-style text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = "★".repeat(usize::from(self.full));
        if self.half {
            out.push('½');
        }
        out.push_str(&"☆".repeat(usize::from(self.empty)));
        out
    }
}
