use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use tracing::debug;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 24;
pub const MAX_LIMIT: u32 = 50;
pub const DEFAULT_SUGGESTION_LIMIT: u32 = 5;
pub const MAX_SUGGESTION_LIMIT: u32 = 10;

/// One article as produced by the content pipeline.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub featured: bool,
    // Never listed; only the summary projection leaves the engine.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<AuthorContact>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuthorContact {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Listing projection of an [`ArticleRecord`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

impl From<&ArticleRecord> for ArticleSummary {
    fn from(record: &ArticleRecord) -> Self {
        Self {
            slug: record.slug.clone(),
            title: record.title.clone(),
            excerpt: record.excerpt.clone(),
            category: record.category.clone(),
            date: record.date,
            cover_image: record.cover_image.clone(),
        }
    }
}

/// Query string exactly as received; every field is optional text.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RawSearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParameters {
    pub text: String,
    pub category: String,
    pub page: u32,
    pub limit: u32,
}

impl Default for QueryParameters {
    fn default() -> Self {
        Self {
            text: String::new(),
            category: String::new(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl QueryParameters {
    /// Coerces raw parameters. Malformed values fall back to defaults instead of failing.
    pub fn from_raw(raw: RawSearchQuery) -> Self {
        Self {
            text: raw.q.unwrap_or_default(),
            category: raw.category.unwrap_or_default(),
            page: coerce_page(raw.page.as_deref()),
            limit: coerce_limit(raw.limit.as_deref(), DEFAULT_LIMIT, MAX_LIMIT),
        }
    }

    /// Key under which equivalent queries share a cached page. Matching
    /// lower-cases the text and splits it on whitespace, so the key does too.
    pub fn cache_key(&self) -> QueryParameters {
        QueryParameters {
            text: self.text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" "),
            category: self.category.clone(),
            page: self.page,
            limit: self.limit,
        }
    }

    /// Reapplies the bounds, for parameters built in code rather than parsed.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_LIMIT);
        self
    }
}

fn coerce_page(raw: Option<&str>) -> u32 {
    match raw.map(|v| v.trim().parse::<i64>()) {
        None => DEFAULT_PAGE,
        Some(Ok(page)) if page >= 1 => page.min(u32::MAX as i64) as u32,
        Some(Ok(_)) => DEFAULT_PAGE,
        Some(Err(e)) if *e.kind() == IntErrorKind::PosOverflow => u32::MAX,
        Some(Err(e)) => {
            debug!("ignoring malformed page parameter: {}", e);
            DEFAULT_PAGE
        }
    }
}

pub(crate) fn coerce_limit(raw: Option<&str>, default: u32, max: u32) -> u32 {
    match raw.map(|v| v.trim().parse::<i64>()) {
        None => default,
        Some(Ok(limit)) => limit.clamp(1, max as i64) as u32,
        // Out-of-range integers are still numbers, so they clamp too.
        Some(Err(e)) if *e.kind() == IntErrorKind::PosOverflow => max,
        Some(Err(e)) if *e.kind() == IntErrorKind::NegOverflow => 1,
        Some(Err(e)) => {
            debug!("ignoring malformed limit parameter: {}", e);
            default
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
    pub articles: Vec<ArticleSummary>,
    pub categories: Vec<String>,
    pub total: usize,
    pub page: u32,
    pub has_more: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RawSuggestionsQuery {
    pub q: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub articles: usize,
}
