use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::place::{miles_to_meters, LatLng, DEFAULT_RADIUS_MILES};
use crate::ConfigError;

/// One keyword the nearby search can run, toggled on or off by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTerm {
    pub keyword: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// User-adjustable search filters: radius and which terms are active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub radius_miles: f64,
    pub terms: Vec<SearchTerm>,
}

impl SearchOptions {
    /// Keywords of the enabled terms, in configuration order.
    #[must_use]
    pub fn enabled_terms(&self) -> Vec<String> {
        self.terms
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.keyword.clone())
            .collect()
    }

    #[must_use]
    pub fn radius_meters(&self) -> f64 {
        miles_to_meters(self.radius_miles)
    }

    /// Returns a copy with `keyword` toggled to `enabled`. Unknown keywords are ignored.
    #[must_use]
    pub fn with_term(mut self, keyword: &str, enabled: bool) -> Self {
        for term in &mut self.terms {
            if term.keyword.eq_ignore_ascii_case(keyword) {
                term.enabled = enabled;
            }
        }
        self
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchProfile::default().options()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchProfile {
    pub default_center: LatLng,
    #[serde(default = "default_radius")]
    pub radius_miles: f64,
    #[serde(default = "default_radius_choices")]
    pub radius_choices: Vec<f64>,
    pub terms: Vec<SearchTerm>,
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS_MILES
}

fn default_radius_choices() -> Vec<f64> {
    vec![1.0, 2.0, 3.0, 5.0, 10.0]
}

impl Default for SearchProfile {
    fn default() -> Self {
        Self {
            default_center: LatLng::new(28.5383, -81.3792),
            radius_miles: DEFAULT_RADIUS_MILES,
            radius_choices: default_radius_choices(),
            terms: vec![
                SearchTerm {
                    keyword: "Optometrist".to_string(),
                    enabled: true,
                },
                SearchTerm {
                    keyword: "Eye care center".to_string(),
                    enabled: true,
                },
            ],
        }
    }
}

impl SearchProfile {
    /// Initial search options derived from the profile.
    #[must_use]
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            radius_miles: self.radius_miles,
            terms: self.terms.clone(),
        }
    }

    /// `true` when `miles` is one of the profile's offered radius choices.
    #[must_use]
    pub fn allows_radius(&self, miles: f64) -> bool {
        self.radius_choices
            .iter()
            .any(|choice| (choice - miles).abs() < f64::EPSILON)
    }
}

/// Load and validate a search profile from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_profile(path: &Path) -> Result<SearchProfile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProfileFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_profile(&content)
}

fn parse_profile(content: &str) -> Result<SearchProfile, ConfigError> {
    let profile: SearchProfile =
        serde_yaml::from_str(content).map_err(ConfigError::ProfileFileParse)?;
    validate_profile(&profile)?;
    Ok(profile)
}

fn validate_profile(profile: &SearchProfile) -> Result<(), ConfigError> {
    if profile.terms.is_empty() {
        return Err(ConfigError::Validation(
            "profile must list at least one search term".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for term in &profile.terms {
        if term.keyword.trim().is_empty() {
            return Err(ConfigError::Validation(
                "search term keyword must be non-empty".to_string(),
            ));
        }
        if !seen.insert(term.keyword.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate search term: '{}'",
                term.keyword
            )));
        }
    }

    if profile.radius_choices.iter().any(|r| *r <= 0.0) {
        return Err(ConfigError::Validation(
            "radius choices must be positive".to_string(),
        ));
    }

    if !profile.allows_radius(profile.radius_miles) {
        return Err(ConfigError::Validation(format!(
            "default radius {} is not one of the radius choices {:?}",
            profile.radius_miles, profile.radius_choices
        )));
    }

    let LatLng { lat, lng } = profile.default_center;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(ConfigError::Validation(format!(
            "default center {lat},{lng} is out of range"
        )));
    }

    Ok(())
}
