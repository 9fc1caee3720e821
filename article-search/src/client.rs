use crate::error::ServiceError;
use crate::service::{SearchOptions, SearchService};
use crate::types::{SearchResultPage, SuggestionsResponse};
use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// [`SearchService`] backed by the HTTP query endpoint.
#[derive(Clone, Debug)]
pub struct HttpSearchService {
    base_url: Url,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpSearchService {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, http_client, timeout)
    }

    pub fn with_client(base_url: &str, http_client: reqwest::Client, timeout: Duration) -> anyhow::Result<Self> {
        // A trailing slash keeps relative joins under the base path.
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };
        Ok(Self {
            base_url,
            http_client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::Other(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<T, ServiceError> {
        let url = self.endpoint(path)?;
        debug!("GET {} {:?}", url, params);

        let client = &self.http_client;
        let timeout = self.timeout;
        retry(
            ExponentialBackoffBuilder::new()
                .with_initial_interval(Duration::from_millis(100))
                .with_max_interval(Duration::from_secs(1))
                .with_max_elapsed_time(Some(timeout))
                .build(),
            || async {
                let resp = client
                    .get(url.clone())
                    .query(&params)
                    .header("Accept", "application/json")
                    .send()
                    .await
                    .map_err(|e| backoff::Error::transient(map_transport_error(e, timeout)))?;
                let status = resp.status();
                if !status.is_success() {
                    let message = resp.text().await.unwrap_or_default();
                    // 5xx transient, others permanent
                    if status.is_server_error() {
                        return Err(backoff::Error::transient(ServiceError::Unavailable(format!(
                            "status {}: {}",
                            status, message
                        ))));
                    }
                    return Err(backoff::Error::permanent(ServiceError::Rejected {
                        status: status.as_u16(),
                        message,
                    }));
                }
                // A body that does not decode will not decode on retry either.
                resp.json::<T>()
                    .await
                    .map_err(|e| backoff::Error::permanent(ServiceError::Decode(e.to_string())))
            },
        )
        .await
    }
}

fn map_transport_error(e: reqwest::Error, timeout: Duration) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout(timeout)
    } else {
        ServiceError::Unavailable(e.to_string())
    }
}

pub(crate) fn search_params(query: &str, options: &SearchOptions) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", query.to_string())];
    if let Some(category) = options.category.as_ref().filter(|c| !c.is_empty()) {
        params.push(("category", category.clone()));
    }
    if let Some(page) = options.page {
        params.push(("page", page.to_string()));
    }
    if let Some(limit) = options.limit {
        params.push(("limit", limit.to_string()));
    }
    params
}

impl SearchService for HttpSearchService {
    fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<SearchResultPage, ServiceError>> + Send {
        let params = search_params(query, options);
        async move {
            let page: SearchResultPage = self.get_json("api/search", params).await?;
            info!("Search returned {} of {} articles", page.articles.len(), page.total);
            Ok(page)
        }
    }

    fn suggestions(&self, query: &str) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send {
        let params = vec![("q", query.to_string())];
        async move {
            let response: SuggestionsResponse = self.get_json("api/search/suggestions", params).await?;
            Ok(response.suggestions)
        }
    }
}
