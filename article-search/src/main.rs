use article_search::catalog::Catalog;
use article_search::config::ServerConfig;
use article_search::{handlers, AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env();
    info!("Starting article search server");
    info!("Catalog: {}", config.catalog_path);

    let catalog = Catalog::load(&config.catalog_path)?;
    let state = Arc::new(AppState::with_config(catalog, &config));
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Article search listening on http://{}", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
