//! Connection configuration.
//!
//! Loaded from `sqltag.toml` in the working directory, falling back to
//! `<config dir>/sqltag/config.toml`:
//!
//! ```toml
//! [database]
//! url = "postgres://localhost/app"
//! dialect = "postgres"      # optional, inferred from the URL
//! max_connections = 5
//!
//! [cursor]
//! buffer = 100
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::dialect::Dialect;
use crate::engine::SqlxCursorOptions;
use crate::error::SqlTagResult;

/// Project-local config file name.
pub const CONFIG_FILE: &str = "sqltag.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub cursor: CursorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: Option<String>,
    /// Overrides the dialect implied by the URL scheme
    pub dialect: Option<Dialect>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            dialect: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Rows a cursor fetches ahead of the consumer
    pub buffer: usize,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            buffer: SqlxCursorOptions::DEFAULT_BUFFER,
        }
    }
}

impl Config {
    /// Create a new configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> SqlTagResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> SqlTagResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load the first config file found, or the defaults when there is none.
    pub fn load() -> SqlTagResult<Self> {
        match Self::locate() {
            Some(path) => {
                tracing::debug!(target: "sqltag", path = %path.display(), "loading config");
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// `./sqltag.toml`, then `<config dir>/sqltag/config.toml`.
    pub fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("sqltag").join("config.toml"))
            .filter(|path| path.is_file())
    }

    /// The configured dialect, else the one implied by the URL, else
    /// Postgres.
    pub fn dialect(&self) -> SqlTagResult<Dialect> {
        match (self.database.dialect, self.database.url.as_deref()) {
            (Some(dialect), _) => Ok(dialect),
            (None, Some(url)) => Dialect::from_url(url),
            (None, None) => Ok(Dialect::default()),
        }
    }

    /// Cursor options derived from the `[cursor]` section.
    pub fn cursor_options(&self) -> SqlxCursorOptions {
        SqlxCursorOptions::buffer(self.cursor.buffer)
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from an existing configuration.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the database URL
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database.url = Some(url.into());
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.config.database.dialect = Some(dialect);
        self
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.config.database.max_connections = n;
        self
    }

    pub fn cursor_buffer(mut self, rows: usize) -> Self {
        self.config.cursor.buffer = rows;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.cursor.buffer, 100);
        assert_eq!(config.dialect().unwrap(), Dialect::Postgres);
    }

    #[test]
    fn test_parse_full() {
        let config = Config::from_toml_str(
            r#"
            [database]
            url = "mysql://root@localhost/app"
            max_connections = 12

            [cursor]
            buffer = 16
            "#,
        )
        .unwrap();

        assert_eq!(config.database.url.as_deref(), Some("mysql://root@localhost/app"));
        assert_eq!(config.database.max_connections, 12);
        assert_eq!(config.cursor_options().buffer, 16);
        assert_eq!(config.dialect().unwrap(), Dialect::MySql);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = Config::from_toml_str("[database]\nurl = \"sqlite::memory:\"\n").unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.cursor.buffer, 100);
        assert_eq!(config.dialect().unwrap(), Dialect::Sqlite);
    }

    #[test]
    fn test_explicit_dialect_wins() {
        let config = Config::from_toml_str(
            "[database]\nurl = \"postgres://localhost/app\"\ndialect = \"mariadb\"\n",
        )
        .unwrap();
        assert_eq!(config.dialect().unwrap(), Dialect::MySql);
    }

    #[test]
    fn test_bad_toml() {
        let err = Config::from_toml_str("[database\nurl = 1").unwrap_err();
        assert!(matches!(err, crate::error::SqlTagError::Toml(_)));
    }

    #[test]
    fn test_unknown_scheme() {
        let config = Config::builder().database_url("oracle://db").build();
        assert!(config.dialect().is_err());
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .database_url("postgres://localhost/app")
            .dialect(Dialect::Sqlite)
            .max_connections(2)
            .cursor_buffer(7)
            .build();
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.cursor.buffer, 7);
        assert_eq!(config.dialect().unwrap(), Dialect::Sqlite);
    }
}
