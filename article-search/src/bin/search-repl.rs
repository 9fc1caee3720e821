//! Line-oriented driver for the search controller. Each line replaces the
//! query. Commands: `:category <name>`, `:commit [term]`, `:history`,
//! `:clear-history`, `:clear` and `:quit`. Pass `--local <catalog.json>` to
//! search in-process instead of over HTTP.

use article_search::catalog::Catalog;
use article_search::config::ClientConfig;
use article_search::controller::{ControllerState, SearchController};
use article_search::history::{FileHistoryStore, HistoryStore};
use article_search::client::HttpSearchService;
use article_search::service::{LocalSearchService, SearchService};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env();
    let history = FileHistoryStore::new(&config.history_path);
    let args: Vec<String> = std::env::args().collect();

    match args.iter().position(|a| a == "--local") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .ok_or_else(|| anyhow::anyhow!("--local requires a catalog path"))?;
            let service = LocalSearchService::new(Catalog::load(path)?);
            run(SearchController::new(service, history, config.controller)).await
        }
        None => {
            info!("Search URL: {}", config.search_url);
            let service = HttpSearchService::new(&config.search_url, config.controller.request_timeout)?;
            run(SearchController::new(service, history, config.controller)).await
        }
    }
}

async fn run<S: SearchService, H: HistoryStore>(controller: SearchController<S, H>) -> anyhow::Result<()> {
    let mut updates = controller.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            render(&state);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) => break,
            (":clear", _) => controller.clear(),
            (":history", _) => println!("recent: {}", controller.state().recent_searches.join(", ")),
            (":clear-history", _) => controller.clear_history(),
            (":category", name) => controller.set_category(Some(name.trim())),
            (":commit", term) => {
                let term = if term.trim().is_empty() {
                    controller.state().query
                } else {
                    term.to_string()
                };
                controller.commit(&term);
            }
            _ => controller.set_query(line),
        }
    }
    Ok(())
}

fn render(state: &ControllerState) {
    if state.is_searching {
        println!("searching {:?}...", state.query);
        return;
    }
    if let Some(error) = state.error {
        println!("error: {} (showing previous results)", error);
    }
    if !state.suggestions.is_empty() {
        println!("suggestions: {}", state.suggestions.join(" | "));
    }
    println!(
        "{} results for {:?}{}",
        state.total,
        state.query,
        state.category.as_deref().map(|c| format!(" in {}", c)).unwrap_or_default()
    );
    for article in &state.results {
        println!("  {}  {}  [{}]  /{}", article.date, article.title, article.category, article.slug);
    }
}
