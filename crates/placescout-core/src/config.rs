use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a plain
/// `HashMap` instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let places_api_key = require("PLACES_API_KEY")?;

    let env = parse_environment(&or_default("PLACESCOUT_ENV", "development"))?;
    let log_level = or_default("PLACESCOUT_LOG_LEVEL", "info");
    let places_base_url = or_default(
        "PLACESCOUT_PLACES_BASE_URL",
        "https://maps.googleapis.com/maps/api/",
    );

    let request_timeout_secs = parse_u64("PLACESCOUT_REQUEST_TIMEOUT_SECS", "30")?;
    let page_delay_ms = parse_u64("PLACESCOUT_PAGE_DELAY_MS", "1500")?;
    let max_pages = parse_usize("PLACESCOUT_MAX_PAGES", "3")?;
    if max_pages == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PLACESCOUT_MAX_PAGES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let max_retries = parse_u32("PLACESCOUT_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("PLACESCOUT_RETRY_BACKOFF_BASE_MS", "500")?;
    let profile_path = lookup("PLACESCOUT_PROFILE_PATH").ok().map(PathBuf::from);

    Ok(AppConfig {
        env,
        log_level,
        places_api_key,
        places_base_url,
        request_timeout_secs,
        page_delay_ms,
        max_pages,
        max_retries,
        retry_backoff_base_ms,
        profile_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PLACESCOUT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
