/// Content-based book recommendations
///
/// Candidates are fetched from the external catalogs using the user's taste
/// profile, then scored against the library: TF-IDF cosine similarity to
/// well-rated books, a penalty for resembling disliked books, and bonuses for
/// category/author overlap and catalog acclaim.
use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{CatalogBook, ReadingStatus, UserBook},
    services::{
        catalog::{CatalogSearcher, SourceFilter},
        library, profile,
    },
};

pub mod tfidf;

use tfidf::TfidfVectorizer;

/// Vocabulary cap for the TF-IDF corpus
const MAX_FEATURES: usize = 1500;
/// Semantic score averages the best matches so one favorite cannot dominate
const TOP_FAVORITE_MATCHES: usize = 3;

const SEMANTIC_WEIGHT: f32 = 0.45;
const PENALTY_WEIGHT: f32 = 0.25;
/// Penalty only applies to candidates strongly resembling a disliked book
const PENALTY_THRESHOLD: f32 = 0.4;
const CATEGORY_BONUS: f32 = 0.3;
const AUTHOR_BONUS: f32 = 0.15;
const ACCLAIMED_BONUS: f32 = 0.1;
const WELL_RATED_BONUS: f32 = 0.05;
const ACCLAIMED_RATING: f32 = 4.5;
const WELL_RATED_RATING: f32 = 4.0;
/// Candidates below this combined score are not worth surfacing
const MIN_SCORE: f32 = 0.25;

/// Recommendations need some signal to work from
const MIN_LIBRARY_SIZE: usize = 2;
const CATEGORY_QUERIES: usize = 3;
const AUTHOR_QUERIES: usize = 2;
const CATEGORY_RESULTS_PER_SOURCE: u32 = 8;
const AUTHOR_RESULTS_PER_SOURCE: u32 = 5;

/// A recommended book with its score and a human-readable justification
#[derive(Debug, Clone, Serialize)]
pub struct ScoredBook {
    pub book: CatalogBook,
    pub score: f32,
    pub reason: String,
}

/// Result of a recommendation run
#[derive(Debug, Serialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<ScoredBook>,
    /// Set when the library is too small to recommend from
    pub message: Option<String>,
}

/// Generates recommendations for a user
///
/// Searches the catalogs by the user's favorite categories and authors,
/// drops books already in the library, and ranks the rest.
pub async fn generate(
    pool: &PgPool,
    catalog: &CatalogSearcher,
    user_id: i64,
    limit: usize,
) -> AppResult<RecommendationSet> {
    let user_books = library::list_books(pool, user_id, None).await?;

    if user_books.len() < MIN_LIBRARY_SIZE {
        return Ok(RecommendationSet {
            recommendations: Vec::new(),
            message: Some(
                "Add and rate at least 2 books to receive recommendations".to_string(),
            ),
        });
    }

    let categories = profile::favorite_categories(&user_books);
    let authors = profile::favorite_authors(&user_books);

    let owned: HashSet<&str> = user_books.iter().map(|book| book.book_id.as_str()).collect();
    let mut seen_ids = HashSet::new();
    let mut candidates = Vec::new();

    for category in categories.iter().take(CATEGORY_QUERIES) {
        let query = format!("subject:{}", category);
        for book in catalog
            .search(&query, SourceFilter::All, CATEGORY_RESULTS_PER_SOURCE)
            .await
        {
            if !owned.contains(book.id.as_str()) && seen_ids.insert(book.id.clone()) {
                candidates.push(book);
            }
        }
    }

    for author in authors.iter().take(AUTHOR_QUERIES) {
        let query = format!("author:{}", author);
        for book in catalog
            .search(&query, SourceFilter::All, AUTHOR_RESULTS_PER_SOURCE)
            .await
        {
            if !owned.contains(book.id.as_str()) && seen_ids.insert(book.id.clone()) {
                candidates.push(book);
            }
        }
    }

    tracing::info!(
        user_id = user_id,
        library_size = user_books.len(),
        candidates = candidates.len(),
        "Scoring recommendation candidates"
    );

    let recommendations = score_candidates(&user_books, candidates, limit);

    Ok(RecommendationSet {
        recommendations,
        message: None,
    })
}

/// Scores and ranks candidate books against the user's library
pub fn score_candidates(
    user_books: &[UserBook],
    candidates: Vec<CatalogBook>,
    limit: usize,
) -> Vec<ScoredBook> {
    let favorites: Vec<&UserBook> = user_books.iter().filter(|b| is_favorite(b)).collect();
    let hated: Vec<&UserBook> = user_books
        .iter()
        .filter(|b| matches!(b.user_rating, Some(rating) if rating <= 2))
        .collect();

    if favorites.is_empty() || candidates.is_empty() {
        return Vec::new();
    }

    let favorite_texts: Vec<String> = favorites.iter().map(|b| library_text(b)).collect();
    let hated_texts: Vec<String> = hated.iter().map(|b| library_text(b)).collect();
    let candidate_texts: Vec<String> = candidates.iter().map(candidate_text).collect();

    // Fit on the full corpus so every group shares one vocabulary
    let corpus: Vec<&str> = favorite_texts
        .iter()
        .chain(hated_texts.iter())
        .chain(candidate_texts.iter())
        .map(String::as_str)
        .collect();

    let mut vectorizer = TfidfVectorizer::new(MAX_FEATURES);
    vectorizer.fit(&corpus);

    let favorite_vectors: Vec<_> = favorite_texts
        .iter()
        .map(|text| vectorizer.transform(text))
        .collect();
    let hated_vectors: Vec<_> = hated_texts
        .iter()
        .map(|text| vectorizer.transform(text))
        .collect();

    let favorite_categories = normalized_set(favorites.iter().flat_map(|b| b.category_list()));
    let favorite_authors = normalized_set(favorites.iter().flat_map(|b| b.author_list()));

    let mut scored = Vec::new();

    for (book, text) in candidates.into_iter().zip(candidate_texts.iter()) {
        let vector = vectorizer.transform(text);

        let semantic = top_k_mean(
            favorite_vectors.iter().map(|fav| vector.cosine(fav)).collect(),
            TOP_FAVORITE_MATCHES,
        );
        let penalty = hated_vectors
            .iter()
            .map(|bad| vector.cosine(bad))
            .fold(0.0_f32, f32::max);

        let mut score = semantic * SEMANTIC_WEIGHT;
        let mut reasons = Vec::new();

        // Resemblance to a disliked book lowers the score without a reason;
        // we never tell the user what we steered them away from
        if penalty > PENALTY_THRESHOLD {
            score -= penalty * PENALTY_WEIGHT;
        }

        if let Some(category) = book
            .categories
            .iter()
            .find(|c| favorite_categories.contains(&normalize(c)))
        {
            score += CATEGORY_BONUS;
            reasons.push(format!("Genre: {}", title_case(category)));
        }

        if let Some(author) = book
            .authors
            .iter()
            .find(|a| favorite_authors.contains(&normalize(a)))
        {
            score += AUTHOR_BONUS;
            reasons.push(format!("Author: {}", title_case(author)));
        }

        if book.rating >= ACCLAIMED_RATING {
            score += ACCLAIMED_BONUS;
            reasons.push("Critically acclaimed".to_string());
        } else if book.rating >= WELL_RATED_RATING {
            score += WELL_RATED_BONUS;
        }

        if score > MIN_SCORE {
            let reason = if reasons.is_empty() {
                "Based on your reading profile".to_string()
            } else {
                reasons.truncate(2);
                reasons.join(" • ")
            };

            scored.push(ScoredBook {
                book,
                // Rounded for stable ordering and presentation
                score: (score * 1000.0).round() / 1000.0,
                reason,
            });
        }
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.book.title.cmp(&b.book.title))
    });
    scored.truncate(limit);
    scored
}

/// A favorite is a well-rated book, or a finished book the user never rated
fn is_favorite(book: &UserBook) -> bool {
    match book.user_rating {
        Some(rating) => rating >= 4,
        None => book.status == ReadingStatus::Finished.as_str(),
    }
}

/// Text used to represent a library book in the vector space
fn library_text(book: &UserBook) -> String {
    let description = book.description.as_deref().unwrap_or("").trim();
    if !description.is_empty() {
        return description.to_string();
    }
    let title = book.title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    "no description".to_string()
}

fn candidate_text(book: &CatalogBook) -> String {
    let description = book.description.trim();
    if !description.is_empty() {
        return description.to_string();
    }
    let title = book.title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    "no description".to_string()
}

/// Mean of the `k` best similarities; mean of everything when fewer exist
fn top_k_mean(mut similarities: Vec<f32>, k: usize) -> f32 {
    if similarities.is_empty() {
        return 0.0;
    }
    if similarities.len() <= k {
        return similarities.iter().sum::<f32>() / similarities.len() as f32;
    }
    similarities.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    similarities[..k].iter().sum::<f32>() / k as f32
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn normalized_set<I: IntoIterator<Item = String>>(values: I) -> HashSet<String> {
    values.into_iter().map(|v| normalize(&v)).collect()
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
