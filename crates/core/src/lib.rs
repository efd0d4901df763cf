#![warn(clippy::all, missing_docs)]

//! Core domain logic for GameVault.
//!
//! This crate hosts the data models, configuration handling, the cached
//! upstream game catalog, and the store for user-submitted games used by the
//! HTTP server and any future frontends.

pub mod catalog;
pub mod config;
pub mod library;
pub mod models;

pub use catalog::{CatalogError, CatalogHit, CatalogPage, GameCatalog, UpstreamError};
pub use config::AppConfig;
pub use library::{FieldError, LibraryError, UserLibrary, ValidationError};
pub use models::{GameRecord, NewUserGame, UserGame};
