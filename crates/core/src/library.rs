//! Persistence for games submitted by users.
//!
//! The library is a single JSON file under the data directory. It is unrelated
//! to the cached upstream catalog.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::{NewUserGame, UserGame};

/// File name of the library inside the data directory.
pub const LIBRARY_FILE: &str = "user_games.json";

const TITLE_MAX: usize = 200;
const GENRE_MAX: usize = 100;
const PLATFORM_MAX: usize = 100;
const URL_MAX: usize = 500;
const CREDIT_MAX: usize = 200;
const MIN_YEAR: i64 = 1970;

/// A single rejected field of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as it appears in the request body.
    pub field: String,
    /// Why the value was rejected.
    pub message: String,
}

/// A create request that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid game: {}", summary(.errors))]
pub struct ValidationError {
    /// Every failing field, in request order.
    pub errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{} {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised by the library store.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The request was rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Reading or writing the library file failed.
    #[error("library storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// A create request that passed validation.
struct ValidGame {
    title: String,
    genre: Option<String>,
    platform: Option<String>,
    year: Option<i32>,
    description: Option<String>,
    image: Option<String>,
    game_url: Option<String>,
    developer: Option<String>,
    publisher: Option<String>,
}

impl NewUserGame {
    /// Check the request against the field rules, reporting every violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.clone().into_valid().map(|_| ())
    }

    fn into_valid(self) -> Result<ValidGame, ValidationError> {
        let mut errors = Vec::new();
        let mut reject = |field: &str, message: String| {
            errors.push(FieldError {
                field: field.to_string(),
                message,
            })
        };

        match self.title.as_deref().map(str::trim) {
            None | Some("") => reject("title", "is required".to_string()),
            Some(_) => {}
        }
        for (field, value, max) in [
            ("title", &self.title, TITLE_MAX),
            ("genre", &self.genre, GENRE_MAX),
            ("platform", &self.platform, PLATFORM_MAX),
            ("image", &self.image, URL_MAX),
            ("gameUrl", &self.game_url, URL_MAX),
            ("developer", &self.developer, CREDIT_MAX),
            ("publisher", &self.publisher, CREDIT_MAX),
        ] {
            if let Some(value) = value {
                if value.chars().count() > max {
                    reject(field, format!("must be at most {max} characters"));
                }
            }
        }
        let year = match self.year {
            None => None,
            Some(year) if year < MIN_YEAR => {
                reject("year", format!("must be {MIN_YEAR} or later"));
                None
            }
            Some(year) => match i32::try_from(year) {
                Ok(year) => Some(year),
                Err(_) => {
                    reject("year", "is out of range".to_string());
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(ValidationError { errors });
        }

        Ok(ValidGame {
            title: self.title.unwrap_or_default(),
            genre: self.genre,
            platform: self.platform,
            year,
            description: self.description,
            image: self.image,
            game_url: self.game_url,
            developer: self.developer,
            publisher: self.publisher,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    next_id: u64,
    games: Vec<UserGame>,
}

/// File-backed store of user-submitted games.
pub struct UserLibrary {
    path: PathBuf,
    state: Mutex<LibraryFile>,
}

impl UserLibrary {
    /// Open the library stored in `data_dir`, starting empty if it has no file yet.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let path = data_dir.as_ref().join(LIBRARY_FILE);
        let state = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            LibraryFile {
                next_id: 1,
                games: Vec::new(),
            }
        };

        info!(
            "opened user library at {} ({} games)",
            path.display(),
            state.games.len()
        );
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate and store a new game, returning the stored record.
    pub fn create(&self, request: NewUserGame) -> Result<UserGame, LibraryError> {
        let valid = request.into_valid()?;

        let mut state = self.state.lock();
        let game = UserGame {
            id: state.next_id.max(1),
            title: valid.title,
            genre: valid.genre,
            platform: valid.platform,
            year: valid.year,
            description: valid.description,
            image: valid.image,
            game_url: valid.game_url,
            developer: valid.developer,
            publisher: valid.publisher,
            created_at: Utc::now(),
        };
        state.games.push(game.clone());
        state.next_id = game.id + 1;

        if let Err(err) = self.write(&state) {
            state.games.pop();
            state.next_id = game.id;
            return Err(err.into());
        }

        info!("stored user game {} ({})", game.id, game.title);
        Ok(game)
    }

    /// All stored games, newest first.
    pub fn list(&self) -> Vec<UserGame> {
        let mut games = self.state.lock().games.clone();
        games.sort_by(|a, b| b.id.cmp(&a.id));
        games
    }

    fn write(&self, state: &LibraryFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialised = serde_json::to_vec_pretty(state)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serialised)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))
    }
}
