//! Shared domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel used when the upstream catalog has no release date for a game.
pub const UNKNOWN_YEAR: &str = "N/A";

/// A single entry of the upstream game catalog, normalised into our own shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Stable external identifier (the upstream numeric id, as a string).
    pub id: String,
    /// Human-readable game title.
    pub title: String,
    /// Genre label, e.g. `Shooter`.
    pub genre: String,
    /// Platform label, e.g. `PC (Windows)`.
    pub platform: String,
    /// Four-digit release year or [`UNKNOWN_YEAR`].
    pub year: String,
    /// Short description.
    pub description: String,
    /// Thumbnail URL.
    pub image: String,
    /// Link to the game's page.
    pub game_url: String,
    /// Developer credit.
    pub developer: String,
    /// Publisher credit.
    pub publisher: String,
}

impl GameRecord {
    /// Returns true when `needle` (already lower-cased) occurs in the title,
    /// genre or description, ignoring case.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.genre.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// A game submitted by a user and kept in the local library store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGame {
    /// Generated identifier, increasing from 1.
    pub id: u64,
    /// Game title.
    pub title: String,
    /// Optional genre.
    pub genre: Option<String>,
    /// Optional platform.
    pub platform: Option<String>,
    /// Optional release year.
    pub year: Option<i32>,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Optional image URL.
    pub image: Option<String>,
    /// Optional game page URL.
    pub game_url: Option<String>,
    /// Optional developer credit.
    pub developer: Option<String>,
    /// Optional publisher credit.
    pub publisher: Option<String>,
    /// When the record was stored.
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a [`UserGame`]. Every field is optional at the
/// type level so validation can report all problems at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserGame {
    /// Game title (required).
    pub title: Option<String>,
    /// Genre.
    pub genre: Option<String>,
    /// Platform.
    pub platform: Option<String>,
    /// Release year, 1970 or later.
    pub year: Option<i64>,
    /// Description.
    pub description: Option<String>,
    /// Image URL.
    pub image: Option<String>,
    /// Game page URL.
    pub game_url: Option<String>,
    /// Developer credit.
    pub developer: Option<String>,
    /// Publisher credit.
    pub publisher: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> GameRecord {
        GameRecord {
            id: "540".to_string(),
            title: "Overwatch 2".to_string(),
            genre: "Shooter".to_string(),
            platform: "PC (Windows)".to_string(),
            year: "2022".to_string(),
            description: "A hero-focused first-person team shooter".to_string(),
            image: "https://www.freetogame.com/g/540/thumbnail.jpg".to_string(),
            game_url: "https://www.freetogame.com/open/overwatch-2".to_string(),
            developer: "Blizzard Entertainment".to_string(),
            publisher: "Activision Blizzard".to_string(),
        }
    }

    #[test]
    fn game_record_serialises_camel_case() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["gameUrl"], json!("https://www.freetogame.com/open/overwatch-2"));
        assert!(value.get("game_url").is_none());
    }

    #[test]
    fn matches_ignores_case_across_fields() {
        let game = sample();
        assert!(game.matches("overwatch"));
        assert!(game.matches("shoot"));
        assert!(game.matches("hero-focused"));
        assert!(!game.matches("blizzard"));
    }
}
