use crate::catalog::Catalog;
use crate::engine;
use crate::error::ServiceError;
use crate::types::{QueryParameters, SearchResultPage, DEFAULT_LIMIT, DEFAULT_PAGE, DEFAULT_SUGGESTION_LIMIT};
use std::future::Future;

/// Optional filters sent along with the query text.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchOptions {
    pub category: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Transport used by the search controller to reach the query endpoint.
pub trait SearchService: Send + Sync + 'static {
    fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<SearchResultPage, ServiceError>> + Send;

    fn suggestions(&self, query: &str) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send;
}

/// In-process transport that runs the query engine directly against a catalog.
#[derive(Debug, Clone)]
pub struct LocalSearchService {
    catalog: Catalog,
}

impl LocalSearchService {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl SearchService for LocalSearchService {
    fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<SearchResultPage, ServiceError>> + Send {
        let params = QueryParameters {
            text: query.to_string(),
            category: options.category.clone().unwrap_or_default(),
            page: options.page.unwrap_or(DEFAULT_PAGE),
            limit: options.limit.unwrap_or(DEFAULT_LIMIT),
        }
        .normalized();
        let result = engine::search(&self.catalog, &params);
        async move { Ok(result) }
    }

    fn suggestions(&self, query: &str) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send {
        let result = engine::suggest(&self.catalog, query, DEFAULT_SUGGESTION_LIMIT);
        async move { Ok(result) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"slug": "oak-floor", "title": "Choosing an oak floor", "excerpt": "", "category": "interiors", "date": "2024-05-01"},
        {"slug": "floor-plans", "title": "Open floor plans", "excerpt": "", "category": "architecture", "date": "2024-03-01"}
    ]"#;

    #[tokio::test]
    async fn test_local_service_applies_options() {
        let service = LocalSearchService::new(Catalog::from_json(CATALOG).unwrap());
        let options = SearchOptions {
            category: Some("architecture".into()),
            page: Some(0),
            limit: Some(500),
        };
        let page = tokio_test::assert_ok!(service.search("floor", &options).await);
        assert_eq!(page.total, 1);
        assert_eq!(page.page, 1);
        assert_eq!(page.articles[0].slug, "floor-plans");

        let suggestions = tokio_test::assert_ok!(service.suggestions("floor").await);
        assert_eq!(suggestions, vec!["Choosing an oak floor", "Open floor plans"]);
    }
}
