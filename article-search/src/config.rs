use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_CATALOG_PATH: &str = "content/articles.json";
pub const DEFAULT_SEARCH_URL: &str = "http://localhost:5000";
pub const DEFAULT_HISTORY_PATH: &str = "recent_searches.json";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub catalog_path: String,
    pub cache_capacity: u64,
    pub cache_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
            cache_capacity: 10_000,
            cache_ttl: Duration::from_secs(60 * 10),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind: env_string("ARTICLE_SEARCH_BIND", &defaults.bind),
            catalog_path: env_string("ARTICLE_CATALOG_PATH", &defaults.catalog_path),
            cache_capacity: env_parse("ARTICLE_SEARCH_CACHE_CAPACITY", defaults.cache_capacity),
            cache_ttl: Duration::from_secs(env_parse("ARTICLE_SEARCH_CACHE_TTL_SECS", defaults.cache_ttl.as_secs())),
        }
    }
}

/// Tunables for [`crate::controller::SearchController`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub debounce: Duration,
    /// Shortest trimmed query, in characters, that reaches the service.
    pub min_query_length: usize,
    /// Zero requests suggestions on every keystroke.
    pub suggestion_debounce: Duration,
    pub max_recent: usize,
    pub request_timeout: Duration,
    pub page_size: Option<u32>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_length: 2,
            suggestion_debounce: Duration::ZERO,
            max_recent: crate::history::DEFAULT_MAX_RECENT,
            request_timeout: Duration::from_secs(5),
            page_size: None,
        }
    }
}

impl ControllerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            debounce: Duration::from_millis(env_parse(
                "ARTICLE_SEARCH_DEBOUNCE_MS",
                defaults.debounce.as_millis() as u64,
            )),
            min_query_length: env_parse("ARTICLE_SEARCH_MIN_QUERY", defaults.min_query_length),
            suggestion_debounce: Duration::from_millis(env_parse(
                "ARTICLE_SEARCH_SUGGEST_DEBOUNCE_MS",
                defaults.suggestion_debounce.as_millis() as u64,
            )),
            max_recent: env_parse("ARTICLE_SEARCH_MAX_RECENT", defaults.max_recent),
            request_timeout: Duration::from_millis(env_parse(
                "ARTICLE_SEARCH_TIMEOUT_MS",
                defaults.request_timeout.as_millis() as u64,
            )),
            page_size: std::env::var("ARTICLE_SEARCH_PAGE_SIZE").ok().and_then(|v| v.parse().ok()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub search_url: String,
    pub history_path: String,
    pub controller: ControllerConfig,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            search_url: env_string("ARTICLE_SEARCH_URL", DEFAULT_SEARCH_URL),
            history_path: env_string("ARTICLE_SEARCH_HISTORY_PATH", DEFAULT_HISTORY_PATH),
            controller: ControllerConfig::from_env(),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_falls_back() {
        assert_eq!(parse_or("X", "250", 300u64), 250);
        assert_eq!(parse_or("X", " 3 ", 2usize), 3);
        assert_eq!(parse_or("X", "fast", 300u64), 300);
        assert_eq!(parse_or("X", "-1", 2usize), 2);
    }

    #[test]
    fn test_controller_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert_eq!(config.min_query_length, 2);
        assert_eq!(config.max_recent, 10);
        assert_eq!(config.suggestion_debounce, Duration::ZERO);
    }
}
