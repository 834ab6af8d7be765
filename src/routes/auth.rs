use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{
        clear_session_cookie, create_token, hash_password, session_cookie, verify_password,
        CurrentUser,
    },
    error::{AppError, AppResult},
    models::User,
    services::library,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a user account
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// POST /api/v1/auth/register
///
/// Creates an account and establishes a session in one step.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Response> {
    let username = body.username.trim();
    let email = body.email.trim();

    if username.is_empty() {
        return Err(AppError::InvalidInput("Username must not be empty".to_string()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput("A valid email address is required".to_string()));
    }
    if body.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if library::find_user_by_username(&state.db_pool, username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Username is already taken".to_string()));
    }
    if library::find_user_by_email(&state.db_pool, email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = hash_password(&body.password)?;
    let user = library::create_user(&state.db_pool, username, email, &password_hash).await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    session_response(&state, user, StatusCode::CREATED)
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Response> {
    let user = library::find_user_by_username(&state.db_pool, body.username.trim()).await?;

    // Uniform failure whether the username or the password was wrong
    let user = match user {
        Some(user) if verify_password(&body.password, &user.password_hash) => user,
        _ => {
            return Err(AppError::Unauthorized(
                "Invalid username or password".to_string(),
            ))
        }
    };

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    session_response(&state, user, StatusCode::OK)
}

/// POST /api/v1/auth/logout
pub async fn logout() -> AppResult<Response> {
    let cookie = clear_session_cookie()
        .parse::<axum::http::HeaderValue>()
        .map_err(|e| AppError::Internal(format!("Invalid cookie header: {}", e)))?;

    let mut response =
        Json(serde_json::json!({ "message": "Logged out" })).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// GET /api/v1/auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

fn session_response(state: &AppState, user: User, status: StatusCode) -> AppResult<Response> {
    let token = create_token(
        &user.username,
        &state.config.secret_key,
        state.config.token_expiry_minutes,
    )?;
    let cookie = session_cookie(&token, state.config.token_expiry_minutes * 60)
        .parse::<axum::http::HeaderValue>()
        .map_err(|e| AppError::Internal(format!("Invalid cookie header: {}", e)))?;

    let mut response =
        (status, Json(UserResponse::from(user))).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}
