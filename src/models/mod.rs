use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

mod catalog;

pub use catalog::{BookSource, CatalogBook, GoogleVolume, GoogleVolumeInfo, OpenLibraryDoc};

/// A registered user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Reading status of a book in a user's library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    WantToRead,
    Reading,
    Finished,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "want_to_read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Finished => "finished",
        }
    }
}

impl Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "want_to_read" => Ok(ReadingStatus::WantToRead),
            "reading" => Ok(ReadingStatus::Reading),
            "finished" => Ok(ReadingStatus::Finished),
            other => Err(format!("unknown reading status '{}'", other)),
        }
    }
}

/// A book saved in a user's library
///
/// Metadata is denormalized from the catalog at add time so the library and
/// the recommender work without re-fetching external APIs. Authors and
/// categories are stored comma-separated, mirroring how catalog results
/// flatten them.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserBook {
    pub id: i64,
    pub user_id: i64,
    pub book_id: String,
    pub title: String,
    pub authors: Option<String>,
    pub description: Option<String>,
    pub categories: Option<String>,
    pub thumbnail: Option<String>,
    pub catalog_rating: f64,
    pub user_rating: Option<i16>,
    pub status: String,
    pub added_at: DateTime<Utc>,
}

impl UserBook {
    pub fn author_list(&self) -> Vec<String> {
        Self::split_csv(&self.authors)
    }

    pub fn category_list(&self) -> Vec<String> {
        Self::split_csv(&self.categories)
    }

    fn split_csv(raw: &Option<String>) -> Vec<String> {
        raw.as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Fields needed to insert a book into a library
#[derive(Debug, Clone)]
pub struct NewUserBook {
    pub book_id: String,
    pub title: String,
    pub authors: Option<String>,
    pub description: Option<String>,
    pub categories: Option<String>,
    pub thumbnail: Option<String>,
    pub catalog_rating: f64,
}

/// Per-status library counts for the dashboard
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LibraryStats {
    pub total: i64,
    pub want_to_read: i64,
    pub reading: i64,
    pub finished: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with(authors: Option<&str>, categories: Option<&str>) -> UserBook {
        UserBook {
            id: 1,
            user_id: 1,
            book_id: "gb_abc".to_string(),
            title: "Dune".to_string(),
            authors: authors.map(str::to_string),
            description: None,
            categories: categories.map(str::to_string),
            thumbnail: None,
            catalog_rating: 0.0,
            user_rating: None,
            status: "want_to_read".to_string(),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_reading_status_round_trip() {
        for status in [
            ReadingStatus::WantToRead,
            ReadingStatus::Reading,
            ReadingStatus::Finished,
        ] {
            assert_eq!(status.as_str().parse::<ReadingStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_reading_status_rejects_unknown() {
        assert!("abandoned".parse::<ReadingStatus>().is_err());
    }

    #[test]
    fn test_author_list_splits_and_trims() {
        let book = book_with(Some("Frank Herbert, Kevin J. Anderson , "), None);
        assert_eq!(
            book.author_list(),
            vec!["Frank Herbert".to_string(), "Kevin J. Anderson".to_string()]
        );
    }

    #[test]
    fn test_category_list_empty_when_missing() {
        let book = book_with(None, None);
        assert!(book.category_list().is_empty());
    }
}
