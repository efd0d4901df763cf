//! Game REST routes.
//!
//! - `GET  /api/games`         first `limit` cached catalog games
//! - `GET  /api/games/random`  one random catalog game
//! - `GET  /api/games/search`  substring search over the catalog
//! - `GET  /api/games/user`    user-submitted games, newest first
//! - `POST /api/games`         store a user-submitted game
//! - `GET  /api/games/:id`     one catalog game by id

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use gamevault_core::{CatalogPage, NewUserGame};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::{ApiError, ApiResult};

/// Header telling clients whether the answer came from an expired snapshot.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

#[derive(Debug, Deserialize)]
pub struct ListParams {
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    query: Option<String>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/games", get(list_games).post(create_user_game))
        .route("/api/games/random", get(random_game))
        .route("/api/games/search", get(search_games))
        .route("/api/games/user", get(list_user_games))
        .route("/api/games/:id", get(get_game))
        .with_state(state)
}

fn cached<T: Serialize>(body: T, served_stale: bool) -> Response {
    let status = if served_stale { "stale" } else { "fresh" };
    (
        [(CACHE_STATUS_HEADER, HeaderValue::from_static(status))],
        Json(body),
    )
        .into_response()
}

/// GET /api/games
pub async fn list_games(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Response> {
    let limit = match params.limit.as_deref().map(str::trim) {
        None | Some("") => state.default_limit,
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ApiError::invalid_input(format!("limit must be an integer, got {raw:?}")))?,
    };

    let page = state.catalog.list(limit).await?;
    let served_stale = page.served_stale;
    Ok(cached(page, served_stale))
}

/// GET /api/games/random
pub async fn random_game(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let hit = state.catalog.random_pick().await?;
    Ok(cached(hit.game, hit.served_stale))
}

/// GET /api/games/search
pub async fn search_games(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = params.query.unwrap_or_default();
    if query.is_empty() {
        return Json(CatalogPage::default()).into_response();
    }

    let page = state.catalog.search(&query).await;
    let served_stale = page.served_stale;
    cached(page, served_stale)
}

/// GET /api/games/:id
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let hit = state.catalog.get_by_id(&id).await?;
    Ok(cached(hit.game, hit.served_stale))
}

/// GET /api/games/user
pub async fn list_user_games(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.library.list())
}

/// POST /api/games
pub async fn create_user_game(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewUserGame>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = body.map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;

    let game = tokio::task::spawn_blocking(move || state.library.create(request))
        .await
        .map_err(|err| ApiError::internal_error(format!("library task failed: {err}")))??;

    Ok((StatusCode::CREATED, Json(game)))
}
