//! Result-list annotations for the UI.

use placescout_core::{directions_url, Place, StarRating};

/// How a result card is highlighted, in descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Selected,
    Hovered,
    /// Saved and marked as met by the user.
    SavedMet,
    Plain,
}

impl CardState {
    #[must_use]
    pub fn resolve(selected: bool, hovered: bool, met: bool) -> Self {
        if selected {
            CardState::Selected
        } else if hovered {
            CardState::Hovered
        } else if met {
            CardState::SavedMet
        } else {
            CardState::Plain
        }
    }
}

/// One entry of the published result list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub place: Place,
    pub state: CardState,
    /// `None` for unrated places.
    pub stars: Option<StarRating>,
    pub directions: Option<String>,
    /// `false` when the place has no location and therefore no marker.
    pub plotted: bool,
}

impl ResultCard {
    #[must_use]
    pub fn new(place: &Place, state: CardState, plotted: bool) -> Self {
        Self {
            stars: StarRating::from_rating(place.rating),
            directions: directions_url(place),
            place: place.clone(),
            state,
            plotted,
        }
    }
}
