//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` under the user's
//! config directory, then `GAMEVAULT_*` environment variables, then `PORT`.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "gamevault";

const DEFAULT_CONFIG: &str = r#"# GameVault configuration.
# Every key can also be set through a GAMEVAULT_<KEY> environment variable.

# bind_address = "0.0.0.0"
# port = 3001
# cors_origin = "http://localhost:3000"
# catalog_url = "https://www.freetogame.com/api/games"
# upstream_timeout_secs = 15
# cache_ttl_hours = 24
# default_list_limit = 100
# data_dir = "/var/lib/gamevault"
# log_dir = "logs"
"#;

/// Runtime settings for the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interface the HTTP server binds to.
    pub bind_address: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// The single browser origin allowed to call the API.
    pub cors_origin: String,
    /// Upstream catalog endpoint.
    pub catalog_url: String,
    /// Upstream request timeout in seconds.
    pub upstream_timeout_secs: u64,
    /// How long a catalog snapshot stays fresh, in hours.
    pub cache_ttl_hours: u64,
    /// Number of games `GET /api/games` returns when no limit is given.
    pub default_list_limit: i64,
    /// Where user-submitted games are stored.
    pub data_dir: PathBuf,
    /// Where log files are written.
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3001,
            cors_origin: "http://localhost:3000".to_string(),
            catalog_url: "https://www.freetogame.com/api/games".to_string(),
            upstream_timeout_secs: 15,
            cache_ttl_hours: 24,
            default_list_limit: 100,
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    /// Load configuration from `path` (if it exists) and the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::layered(path, true)?;
        if let Ok(port) = std::env::var("PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("invalid PORT value {port:?}"))?;
        }
        Ok(config)
    }

    fn layered(path: &Path, with_env: bool) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default()).context("invalid default config")?)
            .add_source(File::from(path.to_path_buf()).required(false));
        if with_env {
            builder = builder.add_source(Environment::with_prefix("GAMEVAULT").try_parsing(true));
        }

        builder
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?
            .try_deserialize()
            .context("failed to parse configuration")
    }

    /// Address string for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Upstream request timeout.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Catalog snapshot time-to-live.
    pub fn cache_ttl(&self) -> chrono::Duration {
        i64::try_from(self.cache_ttl_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }
}

/// Location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = default_config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::layered(&dir.path().join("absent.toml"), false)?;
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.upstream_timeout(), Duration::from_secs(15));
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.bind_addr(), "0.0.0.0:3001");
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
port = 8080
cors_origin = "https://games.example.com"
cache_ttl_hours = 6
data_dir = "/srv/gamevault"
"#,
        )?;

        let config = AppConfig::layered(&path, false)?;
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origin, "https://games.example.com");
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(6));
        assert_eq!(config.data_dir, PathBuf::from("/srv/gamevault"));
        assert_eq!(config.default_list_limit, 100);
        Ok(())
    }

    // The only test that reads the process environment.
    #[test]
    fn environment_overrides_file_and_port_wins() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "port = 8080\ncache_ttl_hours = 6\ndefault_list_limit = 20\n")?;

        std::env::set_var("GAMEVAULT_CACHE_TTL_HOURS", "2");
        std::env::set_var("GAMEVAULT_PORT", "5000");
        std::env::set_var("PORT", "4100");
        let loaded = AppConfig::load_from(&path);

        std::env::set_var("PORT", "not-a-port");
        let bad_port = AppConfig::load_from(&path);

        std::env::remove_var("GAMEVAULT_CACHE_TTL_HOURS");
        std::env::remove_var("GAMEVAULT_PORT");
        std::env::remove_var("PORT");

        let config = loaded?;
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(2));
        assert_eq!(config.port, 4100);
        assert_eq!(config.default_list_limit, 20);
        assert!(bad_port.is_err());
        Ok(())
    }

    #[test]
    fn default_file_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");

        write_default_config(&path)?;
        assert!(path.exists());
        fs::write(&path, "port = 9000\n")?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "port = 9000\n");

        let fresh = dir.path().join("fresh.toml");
        write_default_config(&fresh)?;
        assert_eq!(AppConfig::layered(&fresh, false)?, AppConfig::default());
        Ok(())
    }
}
