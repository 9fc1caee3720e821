
use crate::error::CatalogError;
use crate::types::ArticleRecord;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Catalog {
    articles: Arc<[ArticleRecord]>,
    // Lower-cased "title excerpt keywords" per article, same order as `articles`.
    haystacks: Arc<[String]>,
    categories: Arc<[String]>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate slugs. Record order is kept as
    /// the tiebreak for equal dates.
    pub fn from_records(records: Vec<ArticleRecord>) -> Result<Self, CatalogError> {
        let mut slugs = HashSet::with_capacity(records.len());
        for record in &records {
            if !slugs.insert(record.slug.as_str()) {
                return Err(CatalogError::DuplicateSlug(record.slug.clone()));
            }
        }

        let haystacks: Vec<String> = records.iter().map(haystack).collect();
        let categories: BTreeSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
        let categories: Vec<String> = categories.into_iter().map(String::from).collect();

        Ok(Self {
            articles: records.into(),
            haystacks: haystacks.into(),
            categories: categories.into(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<ArticleRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        info!(
            "Loaded {} articles in {} categories from {}",
            catalog.len(),
            catalog.categories.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn articles(&self) -> &[ArticleRecord] {
        &self.articles
    }

    /// Sorted distinct categories across the whole catalog.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub(crate) fn haystack(&self, index: usize) -> &str {
        &self.haystacks[index]
    }

    pub fn get(&self, slug: &str) -> Option<&ArticleRecord> {
        self.articles.iter().find(|a| a.slug == slug)
    }

    pub fn featured(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.articles.iter().filter(|a| a.featured)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

fn haystack(record: &ArticleRecord) -> String {
    let mut text = String::with_capacity(
        record.title.len() + record.excerpt.len() + record.keywords.as_deref().map_or(0, str::len) + 2,
    );
    text.push_str(&record.title);
    text.push(' ');
    text.push_str(&record.excerpt);
    if let Some(keywords) = &record.keywords {
        text.push(' ');
        text.push_str(keywords);
    }
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"slug": "oak-floors", "title": "Oak Floors", "excerpt": "Warm timber", "category": "interiors", "date": "2024-02-01", "keywords": "oak, timber", "featured": true},
        {"slug": "brutalism", "title": "Concrete Poetry", "excerpt": "Brutalist revival", "category": "architecture", "date": "2023-11-12"}
    ]"#;

    #[test]
    fn test_from_json() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.categories(), &["architecture".to_string(), "interiors".to_string()]);
        assert_eq!(catalog.featured().count(), 1);
        assert!(catalog.get("brutalism").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_haystack_lowercases_all_fields() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.haystack(0), "oak floors warm timber oak, timber");
        assert_eq!(catalog.haystack(1), "concrete poetry brutalist revival");
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let json = r#"[
            {"slug": "a", "title": "A", "excerpt": "", "category": "x", "date": "2024-01-01"},
            {"slug": "a", "title": "B", "excerpt": "", "category": "y", "date": "2024-01-02"}
        ]"#;
        match Catalog::from_json(json) {
            Err(CatalogError::DuplicateSlug(slug)) => assert_eq!(slug, "a"),
            other => panic!("expected duplicate slug error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
