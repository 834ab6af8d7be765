/// Taste profile extraction
///
/// Derives a user's favorite categories and authors from their library,
/// weighted by rating so a five-star book shapes the profile more than a
/// book that was merely added. These feed the candidate searches for the
/// recommender.
use std::collections::HashMap;

use crate::models::{ReadingStatus, UserBook};

const MAX_CATEGORIES: usize = 6;
const MAX_AUTHORS: usize = 4;

/// Top categories weighted by the user's ratings
///
/// A five-star book counts its categories three times, a four-star book
/// twice; low-rated books subtract so the profile steers away from disliked
/// genres. A finished-but-unrated book counts more than an unread one.
/// Categories with a non-positive total are dropped.
pub fn favorite_categories(user_books: &[UserBook]) -> Vec<String> {
    let mut scores: HashMap<String, f32> = HashMap::new();

    for book in user_books {
        let weight = match book.user_rating {
            Some(5) => 3.0,
            Some(4) => 2.0,
            Some(rating) if rating <= 2 => -1.0,
            Some(_) => 1.0,
            None if book.status == ReadingStatus::Finished.as_str() => 1.5,
            None => 1.0,
        };

        for category in book.category_list() {
            *scores.entry(category).or_insert(0.0) += weight;
        }
    }

    ranked(scores, MAX_CATEGORIES, true)
}

/// Top authors weighted by the user's ratings
///
/// Highly rated books (4+) count their authors three times; authors of
/// poorly rated books contribute nothing.
pub fn favorite_authors(user_books: &[UserBook]) -> Vec<String> {
    let mut scores: HashMap<String, f32> = HashMap::new();

    for book in user_books {
        let weight = match book.user_rating {
            Some(rating) if rating >= 4 => 3.0,
            Some(rating) if rating <= 2 => 0.0,
            _ => 1.0,
        };

        for author in book.author_list() {
            *scores.entry(author).or_insert(0.0) += weight;
        }
    }

    ranked(scores, MAX_AUTHORS, false)
}

/// Sorts by score descending with a name tie-break for determinism
fn ranked(scores: HashMap<String, f32>, limit: usize, positive_only: bool) -> Vec<String> {
    let mut entries: Vec<(String, f32)> = scores
        .into_iter()
        .filter(|(_, score)| !positive_only || *score > 0.0)
        .collect();

    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    entries.into_iter().take(limit).map(|(name, _)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn book(
        categories: &str,
        authors: &str,
        rating: Option<i16>,
        status: ReadingStatus,
    ) -> UserBook {
        UserBook {
            id: 0,
            user_id: 1,
            book_id: "gb_x".to_string(),
            title: "t".to_string(),
            authors: Some(authors.to_string()),
            description: None,
            categories: Some(categories.to_string()),
            thumbnail: None,
            catalog_rating: 0.0,
            user_rating: rating,
            status: status.as_str().to_string(),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_five_star_categories_outrank_unrated() {
        let books = vec![
            book("Fantasy", "A", Some(5), ReadingStatus::Finished),
            book("Mystery", "B", None, ReadingStatus::WantToRead),
            book("Mystery", "B", None, ReadingStatus::WantToRead),
        ];

        let categories = favorite_categories(&books);
        // Fantasy scores 3.0, Mystery 2.0
        assert_eq!(categories, vec!["Fantasy".to_string(), "Mystery".to_string()]);
    }

    #[test]
    fn test_low_rated_categories_are_dropped() {
        let books = vec![
            book("Horror", "A", Some(1), ReadingStatus::Finished),
            book("Fantasy", "B", Some(4), ReadingStatus::Finished),
        ];

        let categories = favorite_categories(&books);
        assert_eq!(categories, vec!["Fantasy".to_string()]);
    }

    #[test]
    fn test_finished_unrated_outweighs_unread() {
        let books = vec![
            book("Fantasy", "A", None, ReadingStatus::Finished),
            book("Mystery", "B", None, ReadingStatus::WantToRead),
        ];

        // 1.5 for finished vs 1.0 for merely added
        let categories = favorite_categories(&books);
        assert_eq!(categories[0], "Fantasy");
    }

    #[test]
    fn test_category_limit() {
        let books: Vec<UserBook> = (0..10)
            .map(|i| {
                book(
                    &format!("Cat{}", i),
                    "A",
                    Some(4),
                    ReadingStatus::Finished,
                )
            })
            .collect();

        assert_eq!(favorite_categories(&books).len(), MAX_CATEGORIES);
    }

    #[test]
    fn test_favorite_authors_weighting() {
        let books = vec![
            book("F", "Ursula K. Le Guin", Some(5), ReadingStatus::Finished),
            book("F", "Hack Writer", Some(1), ReadingStatus::Finished),
            book("F", "Middling Author", Some(3), ReadingStatus::Reading),
        ];

        let authors = favorite_authors(&books);
        assert_eq!(authors[0], "Ursula K. Le Guin");
        // Zero-weight authors still rank, just last
        assert_eq!(authors.last().unwrap(), "Hack Writer");
    }

    #[test]
    fn test_multi_valued_fields_split() {
        let books = vec![book(
            "Fantasy, Adventure",
            "Terry Pratchett, Neil Gaiman",
            Some(5),
            ReadingStatus::Finished,
        )];

        assert_eq!(favorite_categories(&books).len(), 2);
        assert_eq!(favorite_authors(&books).len(), 2);
    }
}
