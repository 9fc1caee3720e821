use crate::engine;
use crate::types::*;
use crate::AppState;
use axum::{extract::Query, extract::State, response::Json, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/api/search", get(search_handler))
        .route("/api/search/suggestions", get(suggestions_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        articles: state.catalog.len(),
    })
}

// Query strings are taken as raw pairs so repeated or malformed keys can
// never turn into a rejection; the last occurrence of a key wins.
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<SearchResultPage> {
    let mut raw = RawSearchQuery::default();
    for (key, value) in pairs {
        match key.as_str() {
            "q" => raw.q = Some(value),
            "category" => raw.category = Some(value),
            "page" => raw.page = Some(value),
            "limit" => raw.limit = Some(value),
            _ => debug!("ignoring unknown search parameter {:?}", key),
        }
    }
    let params = QueryParameters::from_raw(raw);

    let key = params.cache_key();
    if let Some(cached) = state.search_cache.get(&key).await {
        debug!("search cache hit");
        return Json(cached);
    }
    let page = engine::search(&state.catalog, &params);
    debug!(
        "search q={:?} category={:?} page={} limit={} -> {} of {}",
        params.text,
        params.category,
        params.page,
        params.limit,
        page.articles.len(),
        page.total
    );
    state.search_cache.insert(key, page.clone()).await;
    Json(page)
}

pub async fn suggestions_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<SuggestionsResponse> {
    let mut raw = RawSuggestionsQuery::default();
    for (key, value) in pairs {
        match key.as_str() {
            "q" => raw.q = Some(value),
            "limit" => raw.limit = Some(value),
            _ => {}
        }
    }
    let limit = coerce_limit(raw.limit.as_deref(), DEFAULT_SUGGESTION_LIMIT, MAX_SUGGESTION_LIMIT);
    let suggestions = engine::suggest(&state.catalog, raw.q.as_deref().unwrap_or_default(), limit);
    Json(SuggestionsResponse { suggestions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const CATALOG: &str = r#"[
        {"slug": "oak-floor", "title": "Choosing an oak floor", "excerpt": "Warm timber underfoot", "category": "interiors", "date": "2024-05-01", "coverImage": "/img/oak.jpg", "content": "secret body", "author": {"name": "Ada", "email": "ada@example.com"}},
        {"slug": "oak-table", "title": "The Oak Table", "excerpt": "Dining", "category": "interiors", "date": "2024-04-01"},
        {"slug": "floor-plans", "title": "Open floor plans", "excerpt": "Space", "category": "architecture", "date": "2024-03-01"},
        {"slug": "brutalism", "title": "Concrete revival", "excerpt": "Brutalist", "category": "architecture", "date": "2023-01-01"},
        {"slug": "glass", "title": "Glass houses", "excerpt": "Light", "category": "architecture", "date": "2022-06-01"}
    ]"#;

    fn app() -> Router {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        router(Arc::new(AppState::new(catalog)))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["articles"], 5);
    }

    #[tokio::test]
    async fn test_search_response_shape() {
        let (status, body) = get_json("/api/search?q=OAK").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["page"], 1);
        assert_eq!(body["hasMore"], false);
        assert_eq!(body["categories"], serde_json::json!(["architecture", "interiors"]));

        let first = &body["articles"][0];
        assert_eq!(first["slug"], "oak-floor");
        assert_eq!(first["date"], "2024-05-01");
        assert_eq!(first["coverImage"], "/img/oak.jpg");
        assert!(first.get("content").is_none());
        assert!(first.get("author").is_none());
        assert!(body["articles"][1].get("coverImage").is_none());
    }

    #[tokio::test]
    async fn test_malformed_params_degrade_to_defaults() {
        let (status, body) = get_json("/api/search?page=abc&limit=-4&unknown=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 1);
        assert_eq!(body["articles"].as_array().unwrap().len(), 1);
        assert_eq!(body["total"], 5);
        assert_eq!(body["hasMore"], true);
    }

    #[tokio::test]
    async fn test_pagination_over_http() {
        let (_, page1) = get_json("/api/search?limit=3&page=1").await;
        assert_eq!(page1["articles"].as_array().unwrap().len(), 3);
        assert_eq!(page1["hasMore"], true);
        let (_, page2) = get_json("/api/search?limit=3&page=2").await;
        assert_eq!(page2["articles"].as_array().unwrap().len(), 2);
        assert_eq!(page2["hasMore"], false);
        let (_, page3) = get_json("/api/search?limit=3&page=3").await;
        assert_eq!(page3["articles"].as_array().unwrap().len(), 0);
        assert_eq!(page3["total"], 5);
    }

    #[tokio::test]
    async fn test_category_filter_and_repeated_keys() {
        let (_, body) = get_json("/api/search?category=interiors&category=architecture&q=floor").await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["articles"][0]["slug"], "floor-plans");
    }

    #[tokio::test]
    async fn test_limit_clamped_to_fifty() {
        let catalog: Vec<serde_json::Value> = (0..60)
            .map(|i| {
                serde_json::json!({
                    "slug": format!("a-{}", i),
                    "title": format!("Article {}", i),
                    "excerpt": "",
                    "category": "interiors",
                    "date": "2024-01-01"
                })
            })
            .collect();
        let catalog = Catalog::from_json(&serde_json::to_string(&catalog).unwrap()).unwrap();
        let response = router(Arc::new(AppState::new(catalog)))
            .oneshot(Request::builder().uri("/api/search?limit=1000").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: SearchResultPage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.articles.len(), 50);
        assert_eq!(body.total, 60);
        assert!(body.has_more);
        assert_eq!(body.articles[0].slug, "a-0");
    }

    #[tokio::test]
    async fn test_cached_response_matches_fresh() {
        let state = Arc::new(AppState::new(Catalog::from_json(CATALOG).unwrap()));
        let app = router(state.clone());
        let mut bodies = Vec::new();
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/api/search?q=floor").body(Body::empty()).unwrap())
                .await
                .unwrap();
            bodies.push(axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap());
        }
        assert_eq!(bodies[0], bodies[1]);
        state.search_cache.run_pending_tasks().await;
        assert_eq!(state.search_cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_equivalent_queries_share_cache_entry() {
        let state = Arc::new(AppState::new(Catalog::from_json(CATALOG).unwrap()));
        let app = router(state.clone());
        let mut bodies = Vec::new();
        for uri in ["/api/search?q=OAK", "/api/search?q=oak", "/api/search?q=%20oak%20"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            bodies.push(axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap());
        }
        assert!(bodies.iter().all(|b| *b == bodies[0]));
        state.search_cache.run_pending_tasks().await;
        assert_eq!(state.search_cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_suggestions_endpoint() {
        let (status, body) = get_json("/api/search/suggestions?q=oak&limit=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"], serde_json::json!(["Choosing an oak floor"]));
        let (_, body) = get_json("/api/search/suggestions").await;
        assert_eq!(body["suggestions"], serde_json::json!([]));
    }
}
