/// Open Library API provider
/// https://openlibrary.org/developers/api
///
/// Search results never include descriptions, so the normalized books carry a
/// synthesized one (publish year + subjects) and `fetch_description` resolves
/// the full text from the work record when needed.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{BookSource, CatalogBook, OpenLibraryDoc},
    services::providers::BookProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const DETAILS_CACHE_TTL: u64 = 604800; // 1 week

/// Fields requested from the search endpoint; everything else is dead weight
const SEARCH_FIELDS: &str =
    "key,title,author_name,first_publish_year,isbn,subject,ratings_average,cover_i";

#[derive(Clone)]
pub struct OpenLibraryProvider {
    http_client: HttpClient,
    api_url: String,
    covers_url: String,
    cache: Cache,
}

impl OpenLibraryProvider {
    pub fn new(cache: Cache, api_url: String, covers_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            covers_url,
            cache,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<serde_json::Value>,
}

/// Work record; the description is either a plain string or a typed object
#[derive(Debug, Deserialize)]
struct WorkRecord {
    #[serde(default)]
    description: Option<serde_json::Value>,
}

impl WorkRecord {
    fn description_text(self) -> Option<String> {
        match self.description? {
            serde_json::Value::String(text) => Some(text),
            serde_json::Value::Object(map) => map
                .get("value")
                .and_then(|value| value.as_str())
                .map(str::to_string),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl BookProvider for OpenLibraryProvider {
    fn source(&self) -> BookSource {
        BookSource::OpenLibrary
    }

    async fn search_books(&self, query: &str, limit: u32) -> AppResult<Vec<CatalogBook>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::BookSearch(BookSource::OpenLibrary, query.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let url = format!("{}/search.json", self.api_url);
                let limit = limit.to_string();

                let response = self
                    .http_client
                    .get(&url)
                    .query(&[
                        ("q", query),
                        ("limit", limit.as_str()),
                        ("fields", SEARCH_FIELDS),
                    ])
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::ExternalApi(format!(
                        "Open Library API returned status {}: {}",
                        status, body
                    )));
                }

                let parsed: SearchResponse = response.json().await?;

                let books: Vec<CatalogBook> = parsed
                    .docs
                    .into_iter()
                    .filter_map(|doc| {
                        serde_json::from_value::<OpenLibraryDoc>(doc)
                            .map(|doc| doc.into_catalog_book(&self.covers_url))
                            .ok()
                    })
                    .collect();

                tracing::info!(
                    query = %query,
                    results = books.len(),
                    provider = "openlibrary",
                    "Book search completed"
                );

                Ok(books)
            }
        )
    }

    async fn fetch_description(&self, book_id: &str) -> AppResult<Option<String>> {
        let work_id = book_id
            .strip_prefix(self.source().id_prefix())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Not an Open Library ID: {}", book_id))
            })?;

        cached!(
            self.cache,
            CacheKey::BookDetails(book_id.to_string()),
            DETAILS_CACHE_TTL,
            async move {
                let url = format!("{}/works/{}.json", self.api_url, work_id);

                let response = self.http_client.get(&url).send().await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::ExternalApi(format!(
                        "Open Library API returned status {}: {}",
                        status, body
                    )));
                }

                let record: WorkRecord = response.json().await?;

                Ok(record.description_text())
            }
        )
    }
}
