use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::require_session,
    config::Config,
    db::Cache,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::catalog::CatalogSearcher,
};

pub mod auth;
pub mod books;
pub mod recommendations;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub cache: Cache,
    pub catalog: Arc<CatalogSearcher>,
    pub config: Arc<Config>,
}

/// Builds the application router
///
/// Everything under /api/v1 except registration and login requires a session;
/// the guard runs as a route layer so unauthenticated requests never reach a
/// handler.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/books/search", get(books::search))
        .route("/library", get(books::list).post(books::add))
        .route("/library/stats", get(books::stats))
        .route("/library/:id/status", put(books::update_status))
        .route("/library/:id/rating", put(books::rate))
        .route("/library/:id", delete(books::remove))
        .route("/recommendations", get(recommendations::list))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", public.merge(protected))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
