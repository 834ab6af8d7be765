/// Google Books API provider
///
/// Search goes through the volumes endpoint; descriptions come back inline,
/// so the detail lookup is only needed for volumes whose search snippet
/// omitted one. An API key is optional and only raises quota limits.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{BookSource, CatalogBook, GoogleVolume},
    services::providers::BookProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const DETAILS_CACHE_TTL: u64 = 604800; // 1 week

#[derive(Clone)]
pub struct GoogleBooksProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: Cache,
}

impl GoogleBooksProvider {
    pub fn new(cache: Cache, api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[async_trait::async_trait]
impl BookProvider for GoogleBooksProvider {
    fn source(&self) -> BookSource {
        BookSource::Google
    }

    async fn search_books(&self, query: &str, limit: u32) -> AppResult<Vec<CatalogBook>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::BookSearch(BookSource::Google, query.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let url = format!("{}/volumes", self.api_url);
                let limit = limit.to_string();

                let mut request = self.http_client.get(&url).query(&[
                    ("q", query),
                    ("maxResults", limit.as_str()),
                    ("printType", "books"),
                ]);
                if let Some(key) = &self.api_key {
                    request = request.query(&[("key", key.as_str())]);
                }

                let response = request.send().await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::ExternalApi(format!(
                        "Google Books API returned status {}: {}",
                        status, body
                    )));
                }

                let parsed: VolumesResponse = response.json().await?;

                // Tolerate malformed items rather than failing the whole search
                let books: Vec<CatalogBook> = parsed
                    .items
                    .into_iter()
                    .filter_map(|item| {
                        serde_json::from_value::<GoogleVolume>(item)
                            .map(CatalogBook::from)
                            .ok()
                    })
                    .collect();

                tracing::info!(
                    query = %query,
                    results = books.len(),
                    provider = "google",
                    "Book search completed"
                );

                Ok(books)
            }
        )
    }

    async fn fetch_description(&self, book_id: &str) -> AppResult<Option<String>> {
        let volume_id = book_id
            .strip_prefix(self.source().id_prefix())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Not a Google Books ID: {}", book_id))
            })?;

        cached!(
            self.cache,
            CacheKey::BookDetails(book_id.to_string()),
            DETAILS_CACHE_TTL,
            async move {
                let url = format!("{}/volumes/{}", self.api_url, volume_id);

                let response = self.http_client.get(&url).send().await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::ExternalApi(format!(
                        "Google Books API returned status {}: {}",
                        status, body
                    )));
                }

                let volume: GoogleVolume = response.json().await?;
                let description = volume
                    .volume_info
                    .description
                    .filter(|text| !text.trim().is_empty());

                Ok(description)
            }
        )
    }
}
