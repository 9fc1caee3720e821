pub mod catalog;
pub mod client;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod history;
pub mod service;
pub mod types;

use catalog::Catalog;
use config::ServerConfig;

#[derive(Clone, Debug)]
pub struct AppState {
    pub catalog: Catalog,
    // The catalog never changes at runtime, so cached pages never go stale.
    pub search_cache: moka::future::Cache<types::QueryParameters, types::SearchResultPage>,
}

pub use types::*;

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_config(catalog, &ServerConfig::default())
    }

    pub fn with_config(catalog: Catalog, config: &ServerConfig) -> Self {
        Self {
            catalog,
            search_cache: moka::future::Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(config.cache_ttl)
                .build(),
        }
    }
}
