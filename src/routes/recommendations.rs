use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    error::AppResult,
    services::recommender::{self, RecommendationSet},
};

use super::AppState;

const DEFAULT_LIMIT: usize = 12;
const MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub limit: Option<usize>,
}

/// GET /api/v1/recommendations?limit=
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<RecommendationParams>,
) -> AppResult<Json<RecommendationSet>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let set = recommender::generate(&state.db_pool, &state.catalog, user.id, limit).await?;

    Ok(Json(set))
}
