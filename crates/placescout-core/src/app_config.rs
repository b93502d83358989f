use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub places_api_key: String,
    pub places_base_url: String,
    pub request_timeout_secs: u64,
    /// Mandatory wait before requesting the next page of a nearby search.
    pub page_delay_ms: u64,
    pub max_pages: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub profile_path: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("places_api_key", &"[redacted]")
            .field("places_base_url", &self.places_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("max_pages", &self.max_pages)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("profile_path", &self.profile_path)
            .finish()
    }
}
