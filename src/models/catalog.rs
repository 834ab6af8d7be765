use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// External catalog a book was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSource {
    Google,
    #[serde(rename = "openlibrary")]
    OpenLibrary,
}

impl BookSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookSource::Google => "google",
            BookSource::OpenLibrary => "openlibrary",
        }
    }

    /// Prefix used on catalog IDs so a book's source is recoverable from
    /// its ID alone (e.g. "gb_zyTCAlFPjgYC", "ol_OL45804W").
    pub fn id_prefix(&self) -> &'static str {
        match self {
            BookSource::Google => "gb_",
            BookSource::OpenLibrary => "ol_",
        }
    }
}

impl Display for BookSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A book as returned by an external catalog, normalized across sources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogBook {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub description: String,
    pub categories: Vec<String>,
    pub rating: f32,
    pub thumbnail: Option<String>,
    pub source: BookSource,
}

// ============================================================================
// Google Books API Types
// ============================================================================

/// Raw volume from the Google Books volumes endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleVolume {
    pub id: String,
    #[serde(default)]
    pub volume_info: GoogleVolumeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleVolumeInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub average_rating: Option<f32>,
    #[serde(default)]
    pub image_links: Option<GoogleImageLinks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleImageLinks {
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl From<GoogleVolume> for CatalogBook {
    fn from(volume: GoogleVolume) -> Self {
        let info = volume.volume_info;
        CatalogBook {
            id: format!("gb_{}", volume.id),
            title: info.title.unwrap_or_else(|| "Untitled".to_string()),
            authors: info.authors,
            description: info.description.unwrap_or_default(),
            categories: info.categories,
            rating: info.average_rating.unwrap_or(0.0),
            thumbnail: info.image_links.and_then(|links| links.thumbnail),
            source: BookSource::Google,
        }
    }
}

// ============================================================================
// Open Library API Types
// ============================================================================

/// Raw document from the Open Library search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibraryDoc {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Vec<String>,
    #[serde(default)]
    pub first_publish_year: Option<i32>,
    #[serde(default)]
    pub subject: Vec<String>,
    #[serde(default)]
    pub ratings_average: Option<f32>,
    #[serde(default)]
    pub cover_i: Option<u64>,
}

impl OpenLibraryDoc {
    /// Converts a search document into a normalized catalog book.
    ///
    /// Open Library search results carry no description, so one is
    /// synthesized from the publish year and the leading subjects.
    pub fn into_catalog_book(self, covers_url: &str) -> CatalogBook {
        let mut description = String::new();
        if let Some(year) = self.first_publish_year {
            description.push_str(&format!("First published in {}. ", year));
        }
        if !self.subject.is_empty() {
            let topics: Vec<&str> = self.subject.iter().take(5).map(String::as_str).collect();
            description.push_str(&format!("Topics: {}.", topics.join(", ")));
        }

        let categories: Vec<String> = self.subject.into_iter().take(3).collect();

        CatalogBook {
            id: format!("ol_{}", self.key.trim_start_matches("/works/")),
            title: self.title.unwrap_or_else(|| "Untitled".to_string()),
            authors: self.author_name,
            description: description.trim_end().to_string(),
            categories,
            rating: self
                .ratings_average
                .map(|r| (r * 10.0).round() / 10.0)
                .unwrap_or(0.0),
            thumbnail: self
                .cover_i
                .map(|cover_id| format!("{}/id/{}-M.jpg", covers_url, cover_id)),
            source: BookSource::OpenLibrary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COVERS_URL: &str = "https://covers.openlibrary.org/b";

    #[test]
    fn test_google_volume_to_catalog_book() {
        let json = r#"{
            "id": "zyTCAlFPjgYC",
            "volumeInfo": {
                "title": "The Fellowship of the Ring",
                "authors": ["J. R. R. Tolkien"],
                "description": "The first part of the trilogy.",
                "categories": ["Fiction"],
                "averageRating": 4.5,
                "imageLinks": {
                    "thumbnail": "http://books.google.com/thumb.jpg"
                }
            }
        }"#;

        let volume: GoogleVolume = serde_json::from_str(json).unwrap();
        let book: CatalogBook = volume.into();

        assert_eq!(book.id, "gb_zyTCAlFPjgYC");
        assert_eq!(book.title, "The Fellowship of the Ring");
        assert_eq!(book.authors, vec!["J. R. R. Tolkien".to_string()]);
        assert_eq!(book.description, "The first part of the trilogy.");
        assert_eq!(book.categories, vec!["Fiction".to_string()]);
        assert_eq!(book.rating, 4.5);
        assert_eq!(
            book.thumbnail,
            Some("http://books.google.com/thumb.jpg".to_string())
        );
        assert_eq!(book.source, BookSource::Google);
    }

    #[test]
    fn test_google_volume_with_sparse_metadata() {
        let json = r#"{"id": "abc123", "volumeInfo": {}}"#;

        let volume: GoogleVolume = serde_json::from_str(json).unwrap();
        let book: CatalogBook = volume.into();

        assert_eq!(book.id, "gb_abc123");
        assert_eq!(book.title, "Untitled");
        assert!(book.authors.is_empty());
        assert_eq!(book.description, "");
        assert_eq!(book.rating, 0.0);
        assert_eq!(book.thumbnail, None);
    }

    #[test]
    fn test_open_library_doc_to_catalog_book() {
        let json = r#"{
            "key": "/works/OL45804W",
            "title": "Fantastic Mr Fox",
            "author_name": ["Roald Dahl"],
            "first_publish_year": 1970,
            "subject": ["Foxes", "Fiction", "Farmers", "Animals", "Juvenile", "Extra"],
            "ratings_average": 4.2567,
            "cover_i": 6498519
        }"#;

        let doc: OpenLibraryDoc = serde_json::from_str(json).unwrap();
        let book = doc.into_catalog_book(COVERS_URL);

        assert_eq!(book.id, "ol_OL45804W");
        assert_eq!(book.title, "Fantastic Mr Fox");
        assert_eq!(book.authors, vec!["Roald Dahl".to_string()]);
        // Synthesized from year plus the first five subjects
        assert_eq!(
            book.description,
            "First published in 1970. Topics: Foxes, Fiction, Farmers, Animals, Juvenile."
        );
        // Categories keep only the first three subjects
        assert_eq!(
            book.categories,
            vec![
                "Foxes".to_string(),
                "Fiction".to_string(),
                "Farmers".to_string()
            ]
        );
        assert_eq!(book.rating, 4.3);
        assert_eq!(
            book.thumbnail,
            Some("https://covers.openlibrary.org/b/id/6498519-M.jpg".to_string())
        );
        assert_eq!(book.source, BookSource::OpenLibrary);
    }

    #[test]
    fn test_open_library_doc_without_metadata() {
        let json = r#"{"key": "/works/OL1W", "title": "Bare"}"#;

        let doc: OpenLibraryDoc = serde_json::from_str(json).unwrap();
        let book = doc.into_catalog_book(COVERS_URL);

        assert_eq!(book.id, "ol_OL1W");
        assert_eq!(book.description, "");
        assert!(book.categories.is_empty());
        assert_eq!(book.rating, 0.0);
        assert_eq!(book.thumbnail, None);
    }

    #[test]
    fn test_book_source_serde() {
        assert_eq!(
            serde_json::to_string(&BookSource::Google).unwrap(),
            r#""google""#
        );
        assert_eq!(
            serde_json::to_string(&BookSource::OpenLibrary).unwrap(),
            r#""openlibrary""#
        );
        let source: BookSource = serde_json::from_str(r#""openlibrary""#).unwrap();
        assert_eq!(source, BookSource::OpenLibrary);
    }
}
