use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    models::{GameRecord, UNKNOWN_YEAR},
};

use super::error::UpstreamError;

/// Anything able to produce a full copy of the game catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the whole catalog once. Implementations must not retry.
    async fn fetch_catalog(&self) -> Result<Vec<GameRecord>, UpstreamError>;
}

/// Raw entry as served by the FreeToGame API.
#[derive(Debug, Deserialize)]
struct RawGame {
    id: u64,
    title: String,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    short_description: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    game_url: Option<String>,
    #[serde(default)]
    developer: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
}

impl From<RawGame> for GameRecord {
    fn from(raw: RawGame) -> Self {
        GameRecord {
            id: raw.id.to_string(),
            title: raw.title,
            genre: raw.genre.unwrap_or_default(),
            platform: raw.platform.unwrap_or_default(),
            year: release_year(raw.release_date.as_deref()),
            description: raw.short_description.unwrap_or_default(),
            image: raw.thumbnail.unwrap_or_default(),
            game_url: raw.game_url.unwrap_or_default(),
            developer: raw.developer.unwrap_or_default(),
            publisher: raw.publisher.unwrap_or_default(),
        }
    }
}

/// Extract the year component of a `YYYY-MM-DD` release date.
fn release_year(release_date: Option<&str>) -> String {
    release_date
        .and_then(|date| date.split('-').next())
        .filter(|year| !year.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string())
}

/// HTTP client for the FreeToGame catalog endpoint.
#[derive(Debug, Clone)]
pub struct FreeToGameClient {
    http: Client,
    url: String,
    timeout: Duration,
}

impl FreeToGameClient {
    /// Build a client for `url` whose requests are abandoned after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build catalog HTTP client")?;
        Ok(Self {
            http,
            url: url.into(),
            timeout,
        })
    }

    /// Build a client from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.catalog_url.clone(), config.upstream_timeout())
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl CatalogSource for FreeToGameClient {
    async fn fetch_catalog(&self) -> Result<Vec<GameRecord>, UpstreamError> {
        info!("fetching full catalog from {}", self.url);
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let raw = response
            .json::<Vec<RawGame>>()
            .await
            .map_err(|err| self.classify(err))?;
        debug!("catalog returned {} entries", raw.len());

        Ok(raw.into_iter().map(GameRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api/games")
    }

    fn raw_catalog() -> Value {
        json!([
            {
                "id": 540,
                "title": "Overwatch 2",
                "thumbnail": "https://www.freetogame.com/g/540/thumbnail.jpg",
                "short_description": "A hero-focused first-person team shooter",
                "game_url": "https://www.freetogame.com/open/overwatch-2",
                "genre": "Shooter",
                "platform": "PC (Windows)",
                "publisher": "Activision Blizzard",
                "developer": "Blizzard Entertainment",
                "release_date": "2022-10-04",
                "freetogame_profile_url": "https://www.freetogame.com/overwatch-2"
            },
            {
                "id": 7,
                "title": "Undated",
                "genre": "MMORPG"
            }
        ])
    }

    #[test]
    fn release_year_takes_first_component() {
        assert_eq!(release_year(Some("2022-10-04")), "2022");
        assert_eq!(release_year(Some("1999")), "1999");
        assert_eq!(release_year(None), UNKNOWN_YEAR);
        assert_eq!(release_year(Some("")), UNKNOWN_YEAR);
    }

    #[test]
    fn raw_entries_are_renamed() {
        let raw: Vec<RawGame> = serde_json::from_value(raw_catalog()).unwrap();
        let records: Vec<GameRecord> = raw.into_iter().map(GameRecord::from).collect();

        let first = &records[0];
        assert_eq!(first.id, "540");
        assert_eq!(first.year, "2022");
        assert_eq!(first.description, "A hero-focused first-person team shooter");
        assert_eq!(first.image, "https://www.freetogame.com/g/540/thumbnail.jpg");
        assert_eq!(first.game_url, "https://www.freetogame.com/open/overwatch-2");
        assert_eq!(first.developer, "Blizzard Entertainment");

        let second = &records[1];
        assert_eq!(second.id, "7");
        assert_eq!(second.year, UNKNOWN_YEAR);
        assert_eq!(second.platform, "");
    }

    #[tokio::test]
    async fn fetches_and_normalises_catalog() {
        let router = Router::new().route("/api/games", get(|| async { Json(raw_catalog()) }));
        let url = serve(router).await;
        let client = FreeToGameClient::new(url, Duration::from_secs(5)).unwrap();

        let records = client.fetch_catalog().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Overwatch 2");
        assert_eq!(records[1].title, "Undated");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/api/games",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let url = serve(router).await;
        let client = FreeToGameClient::new(url, Duration::from_secs(5)).unwrap();

        let err = client.fetch_catalog().await.unwrap_err();
        assert_eq!(err, UpstreamError::Status(429));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let router = Router::new().route("/api/games", get(|| async { "<html>oops</html>" }));
        let url = serve(router).await;
        let client = FreeToGameClient::new(url, Duration::from_secs(5)).unwrap();

        let err = client.fetch_catalog().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let router = Router::new().route(
            "/api/games",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!([]))
            }),
        );
        let url = serve(router).await;
        let timeout = Duration::from_millis(100);
        let client = FreeToGameClient::new(url, timeout).unwrap();

        let err = client.fetch_catalog().await.unwrap_err();
        assert_eq!(err, UpstreamError::Timeout(timeout));
    }
}
