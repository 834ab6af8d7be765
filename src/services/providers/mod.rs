/// Book catalog provider abstraction
///
/// This module provides a pluggable architecture for external book catalogs
/// (Google Books, Open Library). Each provider implements search plus a
/// description lookup for books it issued IDs for.
use crate::{
    error::AppResult,
    models::{BookSource, CatalogBook},
};

pub mod google_books;
pub mod open_library;

/// Trait for book catalog providers
///
/// Providers normalize their native response formats into [`CatalogBook`]
/// and prefix their IDs (see [`BookSource::id_prefix`]) so that a book can be
/// routed back to its provider later.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BookProvider: Send + Sync {
    /// The catalog this provider talks to
    fn source(&self) -> BookSource;

    /// Search for books by free-text query
    ///
    /// Queries may use `subject:` / `author:` qualifiers, which both
    /// supported catalogs understand.
    async fn search_books(&self, query: &str, limit: u32) -> AppResult<Vec<CatalogBook>>;

    /// Fetch the full description for a catalog ID
    ///
    /// Search results can carry truncated or synthesized descriptions (Open
    /// Library returns none at all); this resolves the complete text where
    /// the catalog offers one.
    async fn fetch_description(&self, book_id: &str) -> AppResult<Option<String>>;
}
