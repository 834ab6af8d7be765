use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{BookSource, CatalogBook},
    services::providers::BookProvider,
};

/// Which catalogs a search should hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFilter {
    #[default]
    All,
    Google,
    OpenLibrary,
}

impl SourceFilter {
    /// Parses the `source` query parameter; unknown values fall back to all
    /// sources rather than erroring.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("google") => SourceFilter::Google,
            Some("openlibrary") => SourceFilter::OpenLibrary,
            _ => SourceFilter::All,
        }
    }

    fn includes(&self, source: BookSource) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Google => source == BookSource::Google,
            SourceFilter::OpenLibrary => source == BookSource::OpenLibrary,
        }
    }
}

/// Unified search over all configured book catalogs
///
/// Fans a query out to the selected providers in parallel and merges the
/// results. A provider failing (external API unreachable, quota exhausted)
/// only costs its own results; the merged list is returned regardless.
pub struct CatalogSearcher {
    providers: Vec<Arc<dyn BookProvider>>,
}

impl CatalogSearcher {
    pub fn new(providers: Vec<Arc<dyn BookProvider>>) -> Self {
        Self { providers }
    }

    /// Searches the selected catalogs and deduplicates the merged results
    pub async fn search(
        &self,
        query: &str,
        filter: SourceFilter,
        limit_per_source: u32,
    ) -> Vec<CatalogBook> {
        let mut tasks = Vec::new();

        for provider in self
            .providers
            .iter()
            .filter(|provider| filter.includes(provider.source()))
        {
            let provider = Arc::clone(provider);
            let query = query.to_string();
            tasks.push(tokio::spawn(async move {
                let source = provider.source();
                (source, provider.search_books(&query, limit_per_source).await)
            }));
        }

        let mut books = Vec::new();

        for task in tasks {
            match task.await {
                Ok((_, Ok(results))) => books.extend(results),
                Ok((source, Err(e))) => {
                    tracing::warn!(source = %source, error = %e, "Catalog search failed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Catalog search task join error");
                }
            }
        }

        dedup_by_title(books)
    }

    /// Resolves the full description for a catalog ID
    ///
    /// Routes the lookup to the provider that issued the ID; unknown prefixes
    /// yield `None` rather than an error.
    pub async fn description_for(&self, book_id: &str) -> AppResult<Option<String>> {
        for provider in &self.providers {
            if book_id.starts_with(provider.source().id_prefix()) {
                return provider.fetch_description(book_id).await;
            }
        }

        Ok(None)
    }
}

/// Removes duplicate books by case-insensitive title, keeping the first
/// occurrence. The same work frequently appears in both catalogs under
/// different IDs.
fn dedup_by_title(books: Vec<CatalogBook>) -> Vec<CatalogBook> {
    let mut seen_titles = HashSet::new();
    books
        .into_iter()
        .filter(|book| seen_titles.insert(book.title.trim().to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::providers::MockBookProvider;

    fn catalog_book(id: &str, title: &str, source: BookSource) -> CatalogBook {
        CatalogBook {
            id: id.to_string(),
            title: title.to_string(),
            authors: vec![],
            description: String::new(),
            categories: vec![],
            rating: 0.0,
            thumbnail: None,
            source,
        }
    }

    fn mock_provider(source: BookSource, results: Vec<CatalogBook>) -> Arc<dyn BookProvider> {
        let mut provider = MockBookProvider::new();
        provider.expect_source().return_const(source);
        provider
            .expect_search_books()
            .returning(move |_, _| Ok(results.clone()));
        Arc::new(provider)
    }

    #[tokio::test]
    async fn test_search_merges_sources() {
        let google = mock_provider(
            BookSource::Google,
            vec![catalog_book("gb_1", "Dune", BookSource::Google)],
        );
        let open_library = mock_provider(
            BookSource::OpenLibrary,
            vec![catalog_book("ol_1", "Hyperion", BookSource::OpenLibrary)],
        );

        let searcher = CatalogSearcher::new(vec![google, open_library]);
        let results = searcher.search("science fiction", SourceFilter::All, 10).await;

        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_dedups_same_title_across_sources() {
        let google = mock_provider(
            BookSource::Google,
            vec![catalog_book("gb_1", "Dune", BookSource::Google)],
        );
        let open_library = mock_provider(
            BookSource::OpenLibrary,
            vec![catalog_book("ol_1", " DUNE ", BookSource::OpenLibrary)],
        );

        let searcher = CatalogSearcher::new(vec![google, open_library]);
        let results = searcher.search("dune", SourceFilter::All, 10).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "gb_1");
    }

    #[tokio::test]
    async fn test_search_tolerates_provider_failure() {
        let mut failing = MockBookProvider::new();
        failing.expect_source().return_const(BookSource::Google);
        failing.expect_search_books().returning(|_, _| {
            Err(AppError::ExternalApi("Google Books unreachable".to_string()))
        });

        let open_library = mock_provider(
            BookSource::OpenLibrary,
            vec![catalog_book("ol_1", "Hyperion", BookSource::OpenLibrary)],
        );

        let searcher = CatalogSearcher::new(vec![Arc::new(failing), open_library]);
        let results = searcher.search("hyperion", SourceFilter::All, 10).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, BookSource::OpenLibrary);
    }

    #[tokio::test]
    async fn test_search_respects_source_filter() {
        let mut google = MockBookProvider::new();
        google.expect_source().return_const(BookSource::Google);
        // search_books must never be called for a filtered-out provider
        google.expect_search_books().times(0);

        let open_library = mock_provider(
            BookSource::OpenLibrary,
            vec![catalog_book("ol_1", "Hyperion", BookSource::OpenLibrary)],
        );

        let searcher = CatalogSearcher::new(vec![Arc::new(google), open_library]);
        let results = searcher
            .search("hyperion", SourceFilter::OpenLibrary, 10)
            .await;

        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_description_routing_by_id_prefix() {
        tokio_test::block_on(async {
            let mut google = MockBookProvider::new();
            google.expect_source().return_const(BookSource::Google);
            google.expect_fetch_description().times(0);

            let mut open_library = MockBookProvider::new();
            open_library
                .expect_source()
                .return_const(BookSource::OpenLibrary);
            open_library
                .expect_fetch_description()
                .returning(|_| Ok(Some("Full description".to_string())));

            let searcher =
                CatalogSearcher::new(vec![Arc::new(google), Arc::new(open_library)]);

            let description = searcher.description_for("ol_OL45804W").await.unwrap();
            assert_eq!(description, Some("Full description".to_string()));

            // Unknown prefix resolves to nothing
            let missing = searcher.description_for("isbn_12345").await.unwrap();
            assert_eq!(missing, None);
        });
    }

    #[test]
    fn test_source_filter_parse() {
        assert_eq!(SourceFilter::parse(Some("google")), SourceFilter::Google);
        assert_eq!(
            SourceFilter::parse(Some("openlibrary")),
            SourceFilter::OpenLibrary
        );
        assert_eq!(SourceFilter::parse(Some("bogus")), SourceFilter::All);
        assert_eq!(SourceFilter::parse(None), SourceFilter::All);
    }
}
