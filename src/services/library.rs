/// Database access for users and their libraries
///
/// All SQL lives here; routes and the recommender go through these functions.
/// Ownership is enforced in the queries themselves: every user_books statement
/// filters on user_id, so one user can never touch another's rows.
use std::collections::HashSet;

use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{LibraryStats, NewUserBook, ReadingStatus, User, UserBook},
};

pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn find_user_by_username(pool: &PgPool, username: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Lists a user's books, newest first, optionally filtered by status
pub async fn list_books(
    pool: &PgPool,
    user_id: i64,
    status: Option<ReadingStatus>,
) -> AppResult<Vec<UserBook>> {
    let books = match status {
        Some(status) => {
            sqlx::query_as::<_, UserBook>(
                r#"
                SELECT * FROM user_books
                WHERE user_id = $1 AND status = $2
                ORDER BY added_at DESC
                "#,
            )
            .bind(user_id)
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, UserBook>(
                "SELECT * FROM user_books WHERE user_id = $1 ORDER BY added_at DESC",
            )
            .bind(user_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(books)
}

/// Catalog IDs of every book in a user's library
///
/// Used to flag search results already owned and to exclude owned books from
/// recommendation candidates.
pub async fn list_book_ids(pool: &PgPool, user_id: i64) -> AppResult<HashSet<String>> {
    let ids: Vec<(String,)> =
        sqlx::query_as("SELECT book_id FROM user_books WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    Ok(ids.into_iter().map(|(id,)| id).collect())
}

pub async fn find_book(
    pool: &PgPool,
    user_id: i64,
    book_id: &str,
) -> AppResult<Option<UserBook>> {
    let book = sqlx::query_as::<_, UserBook>(
        "SELECT * FROM user_books WHERE user_id = $1 AND book_id = $2",
    )
    .bind(user_id)
    .bind(book_id)
    .fetch_optional(pool)
    .await?;

    Ok(book)
}

pub async fn add_book(pool: &PgPool, user_id: i64, book: NewUserBook) -> AppResult<UserBook> {
    let saved = sqlx::query_as::<_, UserBook>(
        r#"
        INSERT INTO user_books
            (user_id, book_id, title, authors, description, categories, thumbnail, catalog_rating)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&book.book_id)
    .bind(&book.title)
    .bind(&book.authors)
    .bind(&book.description)
    .bind(&book.categories)
    .bind(&book.thumbnail)
    .bind(book.catalog_rating)
    .fetch_one(pool)
    .await?;

    Ok(saved)
}

/// Updates the reading status of an owned book; `None` if not owned
pub async fn set_status(
    pool: &PgPool,
    user_id: i64,
    book_id: i64,
    status: ReadingStatus,
) -> AppResult<Option<UserBook>> {
    let book = sqlx::query_as::<_, UserBook>(
        r#"
        UPDATE user_books SET status = $3
        WHERE user_id = $1 AND id = $2
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(book_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(book)
}

/// Sets the user's star rating on an owned book; `None` if not owned
pub async fn set_rating(
    pool: &PgPool,
    user_id: i64,
    book_id: i64,
    rating: i16,
) -> AppResult<Option<UserBook>> {
    let book = sqlx::query_as::<_, UserBook>(
        r#"
        UPDATE user_books SET user_rating = $3
        WHERE user_id = $1 AND id = $2
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(book_id)
    .bind(rating)
    .fetch_optional(pool)
    .await?;

    Ok(book)
}

/// Deletes an owned book; returns whether a row was removed
pub async fn delete_book(pool: &PgPool, user_id: i64, book_id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM user_books WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(book_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Per-status counts for the dashboard
pub async fn stats(pool: &PgPool, user_id: i64) -> AppResult<LibraryStats> {
    let stats = sqlx::query_as::<_, LibraryStats>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status = 'want_to_read') AS want_to_read,
            COUNT(*) FILTER (WHERE status = 'reading') AS reading,
            COUNT(*) FILTER (WHERE status = 'finished') AS finished
        FROM user_books
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(stats)
}
