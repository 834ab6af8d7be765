/// Session authentication
///
/// Passwords are hashed with Argon2id. Sessions are stateless JWTs carried in
/// an HTTP-only cookie (set on login/register) or an `Authorization: Bearer`
/// header for non-browser clients. The middleware resolves the token to a
/// database user on every request.
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::User,
    routes::AppState,
    services::library,
};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "access_token";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Hashes a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verifies a password against a stored Argon2 hash
///
/// Malformed hashes verify as false rather than erroring, so a corrupted
/// row cannot be used to probe the hashing setup.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Creates a signed session token for a username
pub fn create_token(username: &str, secret: &str, expiry_minutes: i64) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(expiry_minutes)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token creation failed: {}", e)))
}

/// Decodes a session token and returns the username it was issued for
pub fn decode_token(token: &str, secret: &str) -> AppResult<String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims.sub)
    .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))
}

/// Builds the `Set-Cookie` value establishing a session
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// Builds the `Set-Cookie` value clearing the session
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax",
        SESSION_COOKIE
    )
}

/// Extracts a session token from the request headers
///
/// Prefers the `Authorization: Bearer` header, then falls back to the session
/// cookie. A `Bearer ` prefix inside the cookie value is tolerated for
/// clients that store the full header value.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())?
        .split(';')
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name == SESSION_COOKIE {
                Some(value.trim_start_matches("Bearer ").to_string())
            } else {
                None
            }
        })
}

/// The authenticated user for the current request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Middleware guarding authenticated routes
///
/// Decodes the session token and loads the user from the database, rejecting
/// the request with 401 when either step fails. The resolved user is stored
/// in the request extensions for the `CurrentUser` extractor.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = token_from_headers(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let username = decode_token(&token, &state.config.secret_key)?;

    let user = library::find_user_by_username(&state.db_pool, &username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown session user".to_string()))?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_verify_password_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_round_trip() {
        let token = create_token("alice", SECRET, 60).unwrap();
        assert_eq!(decode_token(&token, SECRET).unwrap(), "alice");
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = create_token("alice", SECRET, 60).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_token_rejects_expired() {
        let token = create_token("alice", SECRET, -5).unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc123"),
        );
        assert_eq!(token_from_headers(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_token_from_cookie_with_bearer_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_token=Bearer abc123"),
        );
        assert_eq!(token_from_headers(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_authorization_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_token=cookie-token"),
        );
        assert_eq!(
            token_from_headers(&headers),
            Some("header-token".to_string())
        );
    }

    #[test]
    fn test_no_token_present() {
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_format() {
        let cookie = session_cookie("tok", 3600);
        assert_eq!(
            cookie,
            "access_token=tok; HttpOnly; Path=/; Max-Age=3600; SameSite=Lax"
        );
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
