use crate::catalog::Catalog;
use crate::types::*;
use std::collections::HashSet;

/// Filters, orders and paginates the catalog.
///
/// Matching is conjunctive substring matching: every whitespace-separated
/// term of the lower-cased text must occur in the article's lower-cased
/// title, excerpt or keywords. Results are newest first; equal dates keep
/// catalog order. Out-of-range pages produce an empty page, never an error.
pub fn search(catalog: &Catalog, params: &QueryParameters) -> SearchResultPage {
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_LIMIT) as usize;
    let terms = query_terms(&params.text);

    let mut matched: Vec<&ArticleRecord> = matching(catalog, &params.category, &terms).collect();
    // Vec::sort_by is stable, so catalog order breaks date ties.
    matched.sort_by(|a, b| b.date.cmp(&a.date));

    let total = matched.len();
    let offset = (page as usize - 1).saturating_mul(limit);
    let articles = matched
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(ArticleSummary::from)
        .collect();

    SearchResultPage {
        articles,
        categories: catalog.categories().to_vec(),
        total,
        page,
        has_more: offset.saturating_add(limit) < total,
    }
}

/// Autocomplete candidates: titles of matching articles (newest first,
/// case-insensitively unique), then categories starting with the text.
pub fn suggest(catalog: &Catalog, text: &str, limit: u32) -> Vec<String> {
    let terms = query_terms(text);
    if terms.is_empty() {
        return Vec::new();
    }
    let limit = limit.clamp(1, MAX_SUGGESTION_LIMIT) as usize;

    let mut matched: Vec<&ArticleRecord> = matching(catalog, "", &terms).collect();
    matched.sort_by(|a, b| b.date.cmp(&a.date));

    let prefix = terms.join(" ");
    let mut seen = HashSet::new();
    matched
        .into_iter()
        .map(|a| a.title.as_str())
        .chain(
            catalog
                .categories()
                .iter()
                .map(String::as_str)
                .filter(|c| c.to_lowercase().starts_with(&prefix)),
        )
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(limit)
        .map(String::from)
        .collect()
}

fn query_terms(text: &str) -> Vec<String> {
    text.to_lowercase().split_whitespace().map(String::from).collect()
}

fn matching<'a>(
    catalog: &'a Catalog,
    category: &'a str,
    terms: &'a [String],
) -> impl Iterator<Item = &'a ArticleRecord> + 'a {
    catalog
        .articles()
        .iter()
        .enumerate()
        .filter(move |(_, a)| category.is_empty() || a.category == category)
        .filter(move |(i, _)| {
            let haystack = catalog.haystack(*i);
            terms.iter().all(|t| haystack.contains(t.as_str()))
        })
        .map(|(_, a)| a)
}
