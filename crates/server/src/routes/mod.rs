//! REST routes and router assembly.

pub mod games;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use gamevault_core::{AppConfig, GameCatalog, UserLibrary};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// State shared by every handler.
pub struct AppState {
    pub catalog: GameCatalog,
    pub library: UserLibrary,
    /// Page size for `GET /api/games` without a `limit`.
    pub default_limit: i64,
}

impl AppState {
    pub fn new(catalog: GameCatalog, library: UserLibrary, default_limit: i64) -> Self {
        Self {
            catalog,
            library,
            default_limit,
        }
    }
}

/// Assemble the full router with CORS and request tracing.
pub fn create_router(state: Arc<AppState>, config: &AppConfig) -> Result<Router> {
    let cors = build_cors_layer(&config.cors_origin)?;
    Ok(Router::new()
        .merge(games::create_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Allow exactly one browser origin, with credentials.
fn build_cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("invalid CORS origin {origin:?}"))?;
    tracing::info!("CORS: allowing origin {:?}", origin);

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]))
}
