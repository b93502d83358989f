pub mod app_config;
pub mod config;
pub mod directions;
pub mod place;
pub mod profile;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use directions::{directions_url, StarRating};
pub use place::{
    miles_to_meters, LatLng, Place, PlaceId, SavedPlace, StatusRecord, StatusSnapshot,
    TargetPlace, DEFAULT_RADIUS_MILES, METERS_PER_MILE,
};
pub use profile::{load_profile, SearchOptions, SearchProfile, SearchTerm};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read search profile at {path}: {source}")]
    ProfileFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse search profile: {0}")]
    ProfileFileParse(#[source] serde_yaml::Error),

    #[error("search profile validation failed: {0}")]
    Validation(String),
}
