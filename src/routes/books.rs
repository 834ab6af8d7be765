use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    error::{AppError, AppResult},
    models::{CatalogBook, LibraryStats, NewUserBook, ReadingStatus, UserBook},
    services::{catalog::SourceFilter, library},
};

use super::AppState;

const SEARCH_RESULTS_PER_SOURCE: u32 = 15;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub source: Option<String>,
}

/// A catalog search hit, flagged when the book is already in the library
#[derive(Debug, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub book: CatalogBook,
    pub in_library: bool,
}

/// GET /api/v1/books/search?q=&source=
pub async fn search(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<SearchResult>>> {
    let query = params.q.trim();
    if query.len() < 2 {
        return Err(AppError::InvalidInput(
            "Search query must be at least 2 characters".to_string(),
        ));
    }

    let filter = SourceFilter::parse(params.source.as_deref());
    let books = state
        .catalog
        .search(query, filter, SEARCH_RESULTS_PER_SOURCE)
        .await;

    let owned = library::list_book_ids(&state.db_pool, user.id).await?;

    let results = books
        .into_iter()
        .map(|book| {
            let in_library = owned.contains(&book.id);
            SearchResult { book, in_library }
        })
        .collect();

    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

/// GET /api/v1/library?status=
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<UserBook>>> {
    let status = match params.status.as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(
            raw.parse::<ReadingStatus>()
                .map_err(AppError::InvalidInput)?,
        ),
    };

    let books = library::list_books(&state.db_pool, user.id, status).await?;
    Ok(Json(books))
}

#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub book_id: String,
    pub title: String,
    pub authors: Option<String>,
    pub description: Option<String>,
    pub categories: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub catalog_rating: f64,
}

/// POST /api/v1/library
///
/// Search results often carry truncated descriptions, so a missing one is
/// backfilled from the source catalog before saving. A backfill failure is
/// logged and ignored; the book is saved with whatever we have.
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<AddBookRequest>,
) -> AppResult<Response> {
    let book_id = body.book_id.trim().to_string();
    let title = body.title.trim().to_string();

    if book_id.is_empty() {
        return Err(AppError::InvalidInput("book_id must not be empty".to_string()));
    }
    if title.is_empty() {
        return Err(AppError::InvalidInput("title must not be empty".to_string()));
    }

    if library::find_book(&state.db_pool, user.id, &book_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Book is already in your library".to_string()));
    }

    let mut description = body
        .description
        .filter(|text| !text.trim().is_empty());

    if description.is_none() {
        match state.catalog.description_for(&book_id).await {
            Ok(full) => description = full,
            Err(e) => {
                tracing::warn!(book_id = %book_id, error = %e, "Description backfill failed");
            }
        }
    }

    let saved = library::add_book(
        &state.db_pool,
        user.id,
        NewUserBook {
            book_id,
            title,
            authors: body.authors,
            description,
            categories: body.categories,
            thumbnail: body.thumbnail,
            catalog_rating: body.catalog_rating,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, book_id = %saved.book_id, "Book added to library");

    Ok((StatusCode::CREATED, Json(saved)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /api/v1/library/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> AppResult<Json<UserBook>> {
    let status = body
        .status
        .parse::<ReadingStatus>()
        .map_err(AppError::InvalidInput)?;

    let book = library::set_status(&state.db_pool, user.id, id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found in your library".to_string()))?;

    Ok(Json(book))
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i16,
}

/// PUT /api/v1/library/:id/rating
pub async fn rate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<RateRequest>,
) -> AppResult<Json<UserBook>> {
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::InvalidInput(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    let book = library::set_rating(&state.db_pool, user.id, id, body.rating)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found in your library".to_string()))?;

    Ok(Json(book))
}

/// DELETE /api/v1/library/:id
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if library::delete_book(&state.db_pool, user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Book not found in your library".to_string()))
    }
}

/// GET /api/v1/library/stats
pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<LibraryStats>> {
    let stats = library::stats(&state.db_pool, user.id).await?;
    Ok(Json(stats))
}
